//! Content subcommands: list, upload, download, link and delete blobs.

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

use super::{format_time, require_channel, truncate};
use crate::domain::ContentType;
use crate::Services;

#[derive(Subcommand, Debug)]
pub enum ContentCommands {
    /// List content items of a channel
    List {
        /// Channel ID
        channel: String,
    },

    /// Upload a file
    Upload {
        /// Channel ID
        channel: String,

        /// File to upload
        file: PathBuf,

        /// MIME type of the file
        #[arg(short, long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// Download a content item
    Get {
        /// Channel ID
        channel: String,

        /// Content ID
        id: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the public path of a content item
    Link {
        /// Channel ID
        channel: String,

        /// Content ID
        id: String,
    },

    /// Delete one or more content items
    Delete {
        /// Channel ID
        channel: String,

        /// Content IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Execute content subcommands
pub async fn execute(
    services: &Services,
    command: ContentCommands,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        ContentCommands::List { channel } => {
            let channel = require_channel(services, &channel, cancel).await?;
            let items = services.content.get_all_content(&channel, cancel).await?;
            if items.is_empty() {
                println!("No content found");
                return Ok(());
            }

            println!("{:<28} {:<32} {:<22} {:>10} {:<16}", "ID", "NAME", "TYPE", "BYTES", "MODIFIED");
            println!("{}", "-".repeat(112));
            for item in items.iter() {
                println!(
                    "{:<28} {:<32} {:<22} {:>10} {:<16}",
                    item.id.as_deref().unwrap_or("-"),
                    truncate(item.file_name.as_deref().unwrap_or("-"), 30),
                    item.content_type.as_deref().unwrap_or("-"),
                    item.length,
                    format_time(item.last_modified)
                );
            }
            Ok(())
        }
        ContentCommands::Upload {
            channel,
            file,
            content_type,
        } => {
            let channel = require_channel(services, &channel, cancel).await?;
            let content_type: ContentType = content_type.parse()?;

            let mut input = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let length = input.metadata().await?.len();
            let file_name = file.file_name().and_then(|n| n.to_str());

            let meta = services
                .content
                .new_content_meta(length, file_name, content_type)?;
            let meta = services
                .content
                .set_content(&channel, meta, &mut input, content_type, cancel)
                .await?;

            println!("{}", meta.id.as_deref().unwrap_or_default());
            Ok(())
        }
        ContentCommands::Get { channel, id, output } => {
            let channel = require_channel(services, &channel, cancel).await?;

            let mut buffer = Cursor::new(Vec::new());
            let meta = services
                .content
                .get_content(&channel, &id, &mut buffer, cancel)
                .await?;
            if !meta.exists() {
                anyhow::bail!("Content not found: {}", id);
            }

            let data = buffer.into_inner();
            match output {
                Some(path) => tokio::fs::write(&path, &data)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&data)?;
                }
            }
            Ok(())
        }
        ContentCommands::Link { channel, id } => {
            let channel = require_channel(services, &channel, cancel).await?;
            let path = services
                .content
                .get_external_path(&channel, &id, cancel)
                .await?
                .with_context(|| format!("Content not found: {}", id))?;
            println!("{}", path);
            Ok(())
        }
        ContentCommands::Delete { channel, ids } => {
            let channel = require_channel(services, &channel, cancel).await?;
            let deleted = services.content.delete_many(&channel, &ids, cancel).await?;
            for id in &deleted {
                println!("Deleted {}", id);
            }
            println!("Deleted {} of {} item(s)", deleted.len(), ids.len());
            Ok(())
        }
    }
}
