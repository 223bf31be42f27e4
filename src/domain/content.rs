//! Content items: uploaded or generated blobs tracked in a channel's content catalog.

use std::path::Path;

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};

use super::record::Record;
use crate::error::{Error, Result};

/// Metadata for one stored blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Random token, independent of the payload
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "date", default)]
    pub last_modified: i64,

    /// Display name supplied by the uploader
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// MIME type; `None` marks a lookup that found nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default)]
    pub length: u64,

    /// Blob file name within the channel content directory (`{id}.{ext}`)
    #[serde(rename = "path", default)]
    pub file_path: String,
}

impl ContentItem {
    /// Allocate metadata for a new blob with a fresh random id
    pub fn new(length: u64, file_name: Option<String>, content_type: ContentType) -> Self {
        let id = new_content_id();
        let file_path = file_path_for(&id, content_type, file_name.as_deref());

        Self {
            id: Some(id),
            last_modified: 0,
            file_name,
            content_type: None,
            length,
            file_path,
        }
    }

    /// Sentinel returned when a content id is not in the catalog
    pub fn not_found(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// True unless this is the not-found sentinel
    pub fn exists(&self) -> bool {
        self.content_type.is_some()
    }
}

impl Record for ContentItem {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }
}

/// 16 random bytes, base-32, lowercase
pub fn new_content_id() -> String {
    let bytes: [u8; 16] = rand::random();
    BASE32_NOPAD.encode(&bytes).to_lowercase()
}

/// Blob file name for a content id.
///
/// An extension on the uploader's file name wins over the content type,
/// browsers and privacy tools misreport MIME types often enough that the
/// explicit extension is the better signal.
pub fn file_path_for(id: &str, content_type: ContentType, file_name: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty());

    match extension {
        Some(ext) => format!("{}.{}", id, ext),
        None => format!("{}.{}", id, content_type.extension()),
    }
}

/// Content types accepted by the content catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Html,
    Json,
    Rss,
    Xml,
    Text,
    Markdown,
    Css,
    Javascript,
    Csv,
    Png,
    Jpeg,
    Gif,
    Webp,
    Svg,
    Ico,
    Mp3,
    Ogg,
    Wav,
    Aac,
    M4a,
    Mp4,
    Webm,
    Pdf,
    Zip,
    Binary,
}

impl ContentType {
    /// Canonical MIME string
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Html => "text/html",
            ContentType::Json => "application/json",
            ContentType::Rss => "application/rss+xml",
            ContentType::Xml => "application/xml",
            ContentType::Text => "text/plain",
            ContentType::Markdown => "text/markdown",
            ContentType::Css => "text/css",
            ContentType::Javascript => "text/javascript",
            ContentType::Csv => "text/csv",
            ContentType::Png => "image/png",
            ContentType::Jpeg => "image/jpeg",
            ContentType::Gif => "image/gif",
            ContentType::Webp => "image/webp",
            ContentType::Svg => "image/svg+xml",
            ContentType::Ico => "image/x-icon",
            ContentType::Mp3 => "audio/mpeg",
            ContentType::Ogg => "audio/ogg",
            ContentType::Wav => "audio/wav",
            ContentType::Aac => "audio/aac",
            ContentType::M4a => "audio/mp4",
            ContentType::Mp4 => "video/mp4",
            ContentType::Webm => "video/webm",
            ContentType::Pdf => "application/pdf",
            ContentType::Zip => "application/zip",
            ContentType::Binary => "application/octet-stream",
        }
    }

    /// File extension (without the dot) used when the uploader gave none
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Html => "html",
            ContentType::Json => "json",
            ContentType::Rss => "rss",
            ContentType::Xml => "xml",
            ContentType::Text => "txt",
            ContentType::Markdown => "md",
            ContentType::Css => "css",
            ContentType::Javascript => "js",
            ContentType::Csv => "csv",
            ContentType::Png => "png",
            ContentType::Jpeg => "jpeg",
            ContentType::Gif => "gif",
            ContentType::Webp => "webp",
            ContentType::Svg => "svg",
            ContentType::Ico => "ico",
            ContentType::Mp3 => "mp3",
            ContentType::Ogg => "ogg",
            ContentType::Wav => "wav",
            ContentType::Aac => "aac",
            ContentType::M4a => "m4a",
            ContentType::Mp4 => "mp4",
            ContentType::Webm => "webm",
            ContentType::Pdf => "pdf",
            ContentType::Zip => "zip",
            ContentType::Binary => "bin",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime())
    }
}

impl std::str::FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Ignore parameters such as "; charset=utf-8"
        let essence = s.split(';').next().unwrap_or_default().trim().to_lowercase();

        let ct = match essence.as_str() {
            "text/html" => ContentType::Html,
            "application/json" => ContentType::Json,
            "application/rss+xml" => ContentType::Rss,
            "application/xml" | "text/xml" => ContentType::Xml,
            "text/plain" => ContentType::Text,
            "text/markdown" => ContentType::Markdown,
            "text/css" => ContentType::Css,
            "text/javascript" | "application/javascript" | "application/x-javascript" => {
                ContentType::Javascript
            }
            "text/csv" => ContentType::Csv,
            "image/png" => ContentType::Png,
            "image/jpeg" | "image/jpg" => ContentType::Jpeg,
            "image/gif" => ContentType::Gif,
            "image/webp" => ContentType::Webp,
            "image/svg+xml" => ContentType::Svg,
            "image/x-icon" | "image/vnd.microsoft.icon" => ContentType::Ico,
            "audio/mpeg" | "audio/mp3" => ContentType::Mp3,
            "audio/ogg" => ContentType::Ogg,
            "audio/wav" | "audio/x-wav" => ContentType::Wav,
            "audio/aac" => ContentType::Aac,
            "audio/mp4" | "audio/x-m4a" => ContentType::M4a,
            "video/mp4" => ContentType::Mp4,
            "video/webm" => ContentType::Webm,
            "application/pdf" => ContentType::Pdf,
            "application/zip" => ContentType::Zip,
            "application/octet-stream" => ContentType::Binary,
            _ => return Err(Error::UnsupportedContentType(s.to_string())),
        };

        Ok(ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_content_id_shape() {
        let a = new_content_id();
        let b = new_content_id();

        assert_ne!(a, b);
        assert_eq!(a.len(), 26); // 16 bytes base-32 without padding
        assert_eq!(a, a.to_lowercase());
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_file_path_extension_pass_through() {
        assert_eq!(
            file_path_for("abc", ContentType::Jpeg, Some("photo.PNG")),
            "abc.PNG"
        );
        assert_eq!(file_path_for("abc", ContentType::Png, None), "abc.png");
        assert_eq!(file_path_for("abc", ContentType::Png, Some("photo")), "abc.png");
        assert_eq!(file_path_for("abc", ContentType::Png, Some("photo.")), "abc.png");
    }

    #[test]
    fn test_javascript_extension_is_js() {
        assert_eq!(file_path_for("abc", ContentType::Javascript, None), "abc.js");
        assert_eq!(
            "application/javascript".parse::<ContentType>().unwrap(),
            ContentType::Javascript
        );
    }

    #[test]
    fn test_content_type_from_str() {
        assert_eq!(
            "text/html; charset=utf-8".parse::<ContentType>().unwrap(),
            ContentType::Html
        );
        assert_eq!("IMAGE/PNG".parse::<ContentType>().unwrap(), ContentType::Png);
        assert!("application/x-unknown".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_new_item_has_no_content_type_until_stored() {
        let item = ContentItem::new(12, Some("a.txt".into()), ContentType::Text);
        assert!(!item.exists());
        assert_eq!(item.length, 12);
        assert!(item.file_path.ends_with(".txt"));
        assert!(item.file_path.starts_with(item.id.as_deref().unwrap()));
    }
}
