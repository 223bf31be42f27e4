//! RSS 2.0 document construction.

use std::io::Write;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::domain::{Channel, ExtendedProperty, FeedConfig, Post};
use crate::error::{Error, Result};

pub const ITUNES_NAMESPACE: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";
pub const PODCAST_NAMESPACE: &str = "https://podcastindex.org/namespace/1.0";

/// Value of the `<generator>` tag added to every feed
pub const GENERATOR: &str = "pressbox";

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// One post to render, with its HTML body when it has one
#[derive(Debug, Clone)]
pub struct FeedItem<'a> {
    pub post: &'a Post,
    pub html: Option<String>,
}

impl<'a> FeedItem<'a> {
    pub fn new(post: &'a Post) -> Self {
        Self { post, html: None }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

/// The newest `limit` posts by creation time
pub fn select_feed_posts(posts: &[Post], limit: usize) -> Vec<&Post> {
    let mut selected: Vec<&Post> = posts.iter().collect();
    selected.sort_by(|a, b| b.created.cmp(&a.created));
    selected.truncate(limit);
    selected
}

/// Render a channel feed.
///
/// Items are rendered newest first and capped at the channel's item limit,
/// whatever order they are passed in.
pub fn build_feed(channel: &Channel, items: &[FeedItem<'_>], built_at: i64) -> Result<Vec<u8>> {
    let feed = channel
        .feed
        .as_ref()
        .ok_or_else(|| Error::Config(format!("channel '{}' has no feed configured", channel.name)))?;

    let mut items: Vec<&FeedItem<'_>> = items.iter().collect();
    items.sort_by(|a, b| b.post.created.cmp(&a.post.created));
    items.truncate(feed.item_limit());

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:itunes", ITUNES_NAMESPACE));
    rss.push_attribute(("xmlns:content", CONTENT_NAMESPACE));
    rss.push_attribute(("xmlns:podcast", PODCAST_NAMESPACE));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_channel_header(&mut writer, channel, feed, built_at)?;

    for item in items {
        write_item(&mut writer, feed, item)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    Ok(writer.into_inner())
}

fn write_channel_header<W: Write>(
    writer: &mut Writer<W>,
    channel: &Channel,
    feed: &FeedConfig,
    built_at: i64,
) -> Result<()> {
    let author = feed.author.as_deref().unwrap_or_default();

    text_element(writer, "title", &channel.name)?;
    text_element(writer, "link", &feed.publish_url)?;
    text_element(writer, "description", &feed.description)?;
    text_element(writer, "itunes:summary", &feed.description)?;
    text_element(writer, "itunes:author", author)?;

    writer.write_event(Event::Start(BytesStart::new("itunes:owner")))?;
    text_element(writer, "itunes:email", feed.webmaster.as_deref().unwrap_or_default())?;
    text_element(writer, "itunes:name", author)?;
    writer.write_event(Event::End(BytesEnd::new("itunes:owner")))?;

    for prop in feed.extended_properties.iter().flatten() {
        write_property(writer, prop)?;
    }

    if let Some(image) = feed.image_url.as_deref() {
        image_element(writer, image)?;
    }

    let now = http_date(built_at);
    text_element(writer, "language", "en-us")?;
    text_element(writer, "pubDate", &now)?;
    text_element(writer, "lastBuildDate", &now)?;

    if !defines_generator(feed) {
        text_element(writer, "generator", GENERATOR)?;
    }

    Ok(())
}

fn write_item<W: Write>(writer: &mut Writer<W>, feed: &FeedConfig, item: &FeedItem<'_>) -> Result<()> {
    let post = item.post;
    let id = post.id.as_deref().unwrap_or_default();

    writer.write_event(Event::Start(BytesStart::new("item")))?;

    text_element(writer, "title", &post.title)?;
    text_element(writer, "itunes:title", &post.title)?;
    text_element(
        writer,
        "link",
        &format!("{}/{}", feed.publish_url.trim_end_matches('/'), id),
    )?;
    text_element(writer, "itunes:author", &post.author)?;

    match item.html.as_deref() {
        Some(html) => {
            cdata_element(writer, "description", html)?;
            cdata_element(writer, "content:encoded", html)?;
        }
        None => text_element(writer, "description", &post.summary)?,
    }
    text_element(writer, "itunes:summary", &post.summary)?;

    let published = http_date(post.created);
    text_element(writer, "pubDate", &published)?;
    text_element(writer, "published", &published)?;

    if let Some(image) = post.image.as_deref() {
        image_element(writer, image)?;
    }

    for prop in post.extended_properties.iter().flatten() {
        write_property(writer, prop)?;
    }

    text_element(writer, "guid", id)?;

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

/// Render a property tree. Nameless nodes are skipped along with their children.
///
/// Element and attribute names must be valid XML names; anything else fails
/// the whole feed rather than producing a malformed document.
fn write_property<W: Write>(writer: &mut Writer<W>, prop: &ExtendedProperty) -> Result<()> {
    let Some(name) = prop.qualified_name() else {
        return Ok(());
    };
    check_name(&name)?;

    let mut start = BytesStart::new(name.as_str());
    for (key, value) in prop.attributes.iter().flatten() {
        check_name(key)?;
        start.push_attribute((key.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(start))?;

    match (&prop.children, prop.value.as_deref()) {
        (Some(children), _) => {
            for child in children {
                write_property(writer, child)?;
            }
        }
        (None, Some(value)) if value.starts_with("<![CDATA") => {
            let inner = value.strip_prefix(CDATA_OPEN).unwrap_or(value);
            let inner = inner.strip_suffix(CDATA_CLOSE).unwrap_or(inner);
            write_cdata(writer, inner)?;
        }
        (None, Some(value)) => {
            writer.write_event(Event::Text(BytesText::new(value)))?;
        }
        (None, None) => {}
    }

    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if is_qualified_name(name) {
        Ok(())
    } else {
        Err(Error::Config(format!("invalid XML name '{}' in feed property", name)))
    }
}

/// `prefix:local` or `local`, each part an XML name without colons
fn is_qualified_name(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
        None => is_ncname(name),
    }
}

fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}'))
}

fn defines_generator(feed: &FeedConfig) -> bool {
    feed.extended_properties
        .iter()
        .flatten()
        .filter_map(|p| p.name.as_deref())
        .any(|name| name.eq_ignore_ascii_case("generator"))
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn cdata_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    write_cdata(writer, text)?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Content containing `]]>` is split across several sections
fn write_cdata<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<()> {
    let mut rest = text;
    while let Some(pos) = rest.find(CDATA_CLOSE) {
        let (head, tail) = rest.split_at(pos + 2);
        writer.write_event(Event::CData(BytesCData::new(head)))?;
        rest = tail;
    }
    writer.write_event(Event::CData(BytesCData::new(rest)))?;
    Ok(())
}

fn image_element<W: Write>(writer: &mut Writer<W>, href: &str) -> Result<()> {
    let mut image = BytesStart::new("itunes:image");
    image.push_attribute(("href", href));
    writer.write_event(Event::Empty(image))?;
    Ok(())
}

/// RFC 1123 date as used by RSS (`Tue, 01 Jul 2003 10:52:37 GMT`)
fn http_date(unix_seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix_seconds, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
