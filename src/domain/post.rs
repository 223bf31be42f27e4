//! Post metadata.

use serde::{Deserialize, Serialize};

use super::feed::ExtendedProperty;
use super::record::{sha1_hex, Record};

/// A published article or episode. The body lives in the content catalog
/// under the post's own id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "date", default)]
    pub last_modified: i64,

    /// Publish time in unix seconds, preserved across updates
    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(rename = "properties", default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<Vec<ExtendedProperty>>,
}

impl Post {
    /// Create an unpublished post
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            summary: summary.into(),
            ..Default::default()
        }
    }

    /// Post id for the given publish time: SHA-1 of `{title}.{author}.{summary}.{date}`.
    ///
    /// Two posts with identical metadata published in the same second share an id.
    pub fn compute_id(&self, published_at: i64) -> String {
        sha1_hex(&format!(
            "{}.{}.{}.{}",
            self.title, self.author, self.summary, published_at
        ))
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_property(mut self, property: ExtendedProperty) -> Self {
        self.extended_properties.get_or_insert_with(Vec::new).push(property);
        self
    }
}

impl Record for Post {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }
}
