//! Command-line interface for pressbox.
//!
//! An operator tool over the catalog managers: inspect configuration, manage
//! channels, publish and delete posts, move content in and out, and rebuild
//! feeds.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::{self, ResolvedConfig};
use crate::domain::{Channel, FeedConfig, Post};
use crate::storage::{BackendRegistry, EnvSecretProvider};
use crate::Services;

pub mod content;

/// pressbox - channel, post and feed catalog on remote storage
#[derive(Parser, Debug)]
#[command(name = "pressbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .pressbox/config.yaml lookup)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show resolved configuration
    Config,

    /// Manage channels
    Channels {
        #[command(subcommand)]
        command: ChannelCommands,
    },

    /// Manage posts of a channel
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Manage uploaded content of a channel
    Content {
        #[command(subcommand)]
        command: content::ContentCommands,
    },

    /// Rewrite a channel's post index and regenerate its feed
    RebuildFeed {
        /// Channel ID
        channel: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChannelCommands {
    /// List all channels
    List,

    /// Create a channel
    Create {
        /// Display name
        name: String,

        /// Base directory in storage
        base_dir: String,

        /// Post index file inside the base directory
        #[arg(long, default_value = "index.json")]
        index: String,

        /// Content directory inside the base directory
        #[arg(long, default_value = "content")]
        content_dir: String,

        /// Public URL of the channel, enables the feed
        #[arg(long)]
        feed_url: Option<String>,

        /// Feed file inside the base directory
        #[arg(long, default_value = "feed.xml")]
        feed_path: String,

        /// Feed description
        #[arg(long, default_value = "")]
        description: String,

        /// Feed author
        #[arg(long)]
        author: Option<String>,

        /// Webmaster contact email
        #[arg(long)]
        contact: Option<String>,

        /// Maximum number of feed items (1-100)
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// Delete a channel and everything stored under it
    Delete {
        /// Channel ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PostCommands {
    /// List posts of a channel
    List {
        /// Channel ID
        channel: String,
    },

    /// Publish a new post
    Publish {
        /// Channel ID
        channel: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long, default_value = "")]
        summary: String,

        /// Tags to apply (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,

        /// Cover image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Delete a post and its body
    Delete {
        /// Channel ID
        channel: String,

        /// Post ID
        id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = match &self.config {
            Some(path) => config::load_config_from(path)?,
            None => config::load_config()?,
        };

        if let Commands::Config = self.command {
            show_config(&cfg);
            return Ok(());
        }

        let services = Services::build(&cfg, &EnvSecretProvider::default(), &BackendRegistry::new())
            .await
            .context("Failed to initialize storage")?;

        // Interrupting the process cancels in-flight storage calls
        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                guard.cancel();
            }
        });

        match self.command {
            Commands::Config => Ok(()),
            Commands::Channels { command } => execute_channels(&services, command, &cancel).await,
            Commands::Posts { command } => execute_posts(&services, command, &cancel).await,
            Commands::Content { command } => content::execute(&services, command, &cancel).await,
            Commands::RebuildFeed { channel } => rebuild_feed(&services, &channel, &cancel).await,
        }
    }
}

/// Look up a channel that must exist
pub(crate) async fn require_channel(
    services: &Services,
    id: &str,
    cancel: &CancellationToken,
) -> Result<Channel> {
    services
        .channels
        .get_channel(id, cancel)
        .await?
        .with_context(|| format!("Channel not found: {}", id))
}

async fn execute_channels(
    services: &Services,
    command: ChannelCommands,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        ChannelCommands::List => {
            let channels = services.channels.get_all_channels(cancel).await?;
            if channels.is_empty() {
                println!("No channels found");
                return Ok(());
            }

            println!("{:<42} {:<24} {:<20} {:<5}", "ID", "NAME", "BASE DIR", "FEED");
            println!("{}", "-".repeat(94));
            for channel in channels.iter() {
                println!(
                    "{:<42} {:<24} {:<20} {:<5}",
                    channel.id.as_deref().unwrap_or("-"),
                    truncate(&channel.name, 22),
                    truncate(&channel.base_dir, 18),
                    if channel.feed.is_some() { "yes" } else { "no" }
                );
            }
            Ok(())
        }
        ChannelCommands::Create {
            name,
            base_dir,
            index,
            content_dir,
            feed_url,
            feed_path,
            description,
            author,
            contact,
            max_items,
        } => {
            let mut channel = Channel::new(name, base_dir)
                .with_index_path(index)
                .with_content_dir(content_dir);

            if let Some(url) = feed_url {
                let mut feed = FeedConfig::new(url, feed_path).with_description(description);
                if let Some(author) = author {
                    feed = feed.with_author(author);
                }
                if let Some(contact) = contact {
                    feed = feed.with_webmaster(contact);
                }
                if let Some(max) = max_items {
                    feed = feed.with_max_items(max);
                }
                channel = channel.with_feed(feed);
            }

            let channel = services.channels.create_channel(channel, cancel).await?;
            println!("{}", channel.id.as_deref().unwrap_or_default());
            Ok(())
        }
        ChannelCommands::Delete { id } => {
            if services.channels.delete_channel(&id, cancel).await? {
                println!("Deleted channel {}", id);
            } else {
                println!("Channel not found: {}", id);
            }
            Ok(())
        }
    }
}

async fn execute_posts(
    services: &Services,
    command: PostCommands,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        PostCommands::List { channel } => {
            let channel = require_channel(services, &channel, cancel).await?;
            let posts = services.posts.get_posts(&channel, cancel).await?;
            if posts.is_empty() {
                println!("No posts found");
                return Ok(());
            }

            println!("{:<42} {:<32} {:<16} {:<20}", "ID", "TITLE", "AUTHOR", "CREATED");
            println!("{}", "-".repeat(112));
            for post in posts.iter() {
                println!(
                    "{:<42} {:<32} {:<16} {:<20}",
                    post.id.as_deref().unwrap_or("-"),
                    truncate(&post.title, 30),
                    truncate(&post.author, 14),
                    format_time(post.created)
                );
            }
            Ok(())
        }
        PostCommands::Publish {
            channel,
            title,
            author,
            summary,
            tags,
            image,
        } => {
            let channel = require_channel(services, &channel, cancel).await?;

            let mut post = Post::new(title, author, summary);
            if let Some(tags) = tags {
                post = post.with_tags(tags.split(',').map(|t| t.trim()).filter(|t| !t.is_empty()));
            }
            if let Some(image) = image {
                post = post.with_image(image);
            }

            let post = services.posts.publish_post(&channel, post, cancel).await?;
            println!("{}", post.id.as_deref().unwrap_or_default());
            Ok(())
        }
        PostCommands::Delete { channel, id } => {
            let channel = require_channel(services, &channel, cancel).await?;
            if services.posts.delete_post(&channel, &id, cancel).await? {
                println!("Deleted post {}", id);
            } else {
                println!("Post not found: {}", id);
            }
            Ok(())
        }
    }
}

async fn rebuild_feed(services: &Services, channel: &str, cancel: &CancellationToken) -> Result<()> {
    let channel = require_channel(services, channel, cancel).await?;

    if services.posts.update_feed_for_channel(&channel, cancel).await? {
        println!(
            "Feed written to {}",
            channel.feed_file().unwrap_or_default()
        );
    } else {
        println!("Channel {} has no feed configured", channel.name);
    }
    Ok(())
}

fn show_config(cfg: &ResolvedConfig) {
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Storage:");
    match cfg.storage.selection() {
        Ok(kind) => println!("  Backend: {:?}", kind),
        Err(e) => println!("  Backend: ({})", e),
    }
    if let Some(s3) = &cfg.storage.s3 {
        println!("  S3:      {} bucket={} ssl={}", s3.server_address, s3.bucket, s3.use_ssl);
    }
    if let Some(ftp) = &cfg.storage.ftp {
        println!("  FTP:     {} tls={:?}", ftp.url, ftp.tls);
    }
    println!();
    println!("Catalogs:");
    println!("  Channel index:  {}", cfg.channel_index);
    println!("  Content index:  {}", cfg.content_index);
    println!("  Max upload:     {} bytes", cfg.max_content_length);
}

pub(crate) fn format_time(unix_seconds: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(unix_seconds, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string for table display
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
