//! Feed configuration and extended XML properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default number of posts written to a feed
pub const DEFAULT_MAX_ITEMS: u32 = 20;

/// Upper bound accepted for `max_items`
pub const MAX_ITEMS_LIMIT: u32 = 100;

/// Per-channel RSS/podcast feed settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Public url of the channel, post links are `{publish_url}/{post_id}`
    #[serde(rename = "url")]
    pub publish_url: String,

    /// Feed file path relative to the channel base directory
    #[serde(rename = "path")]
    pub feed_path: String,

    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Number of posts to publish (1-100, default 20)
    #[serde(rename = "maxItems", default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Webmaster contact email
    #[serde(rename = "contact", default, skip_serializing_if = "Option::is_none")]
    pub webmaster: Option<String>,

    #[serde(rename = "properties", default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<Vec<ExtendedProperty>>,
}

impl FeedConfig {
    /// Create a feed published at `publish_url` and written to `feed_path`
    pub fn new(publish_url: impl Into<String>, feed_path: impl Into<String>) -> Self {
        Self {
            publish_url: publish_url.into(),
            feed_path: feed_path.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_max_items(mut self, max_items: u32) -> Self {
        self.max_items = Some(max_items);
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_webmaster(mut self, webmaster: impl Into<String>) -> Self {
        self.webmaster = Some(webmaster.into());
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_property(mut self, property: ExtendedProperty) -> Self {
        self.extended_properties.get_or_insert_with(Vec::new).push(property);
        self
    }

    /// Effective item limit, clamped to 1..=100
    pub fn item_limit(&self) -> usize {
        self.max_items
            .unwrap_or(DEFAULT_MAX_ITEMS)
            .clamp(1, MAX_ITEMS_LIMIT) as usize
    }
}

/// A generic, possibly namespaced, XML element attached to a feed or post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperty {
    /// Element name, nameless properties are skipped when rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace prefix (e.g. `itunes`, `podcast`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Child elements, rendered in place of `value` when present
    #[serde(rename = "properties", default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ExtendedProperty>>,
}

impl ExtendedProperty {
    /// Create an element with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ExtendedProperty) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    /// Qualified element name (`prefix:name`), if the property has a name
    pub fn qualified_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        Some(match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{}:{}", ns, name),
            _ => name.to_string(),
        })
    }
}
