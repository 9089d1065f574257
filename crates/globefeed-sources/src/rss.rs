//! RSS/Atom feed adapter.
//!
//! Parses feeds with a quick-xml event reader, tolerating both the RSS 2.0
//! convention (`<item>` with `<link>text</link>`) and the Atom convention
//! (`<entry>` with `<link href="..."/>`). Caps results per feed.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SourceError;
use crate::normalize::RawItem;

/// Fetch a feed URL and parse up to `limit` entries.
///
/// # Errors
///
/// Returns [`SourceError::Http`] on network failure or non-2xx status and
/// [`SourceError::Xml`] on malformed feed XML.
pub async fn fetch_feed(
    client: &reqwest::Client,
    feed_url: &str,
    limit: usize,
) -> Result<Vec<RawItem>, SourceError> {
    let body = client
        .get(feed_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_feed(&body, limit)
}

/// Parse an RSS or Atom document into raw items, capped at `limit`.
///
/// The channel/feed `<title>` seen before the first entry becomes each item's
/// source name.
///
/// # Errors
///
/// Returns [`SourceError::Xml`] if the XML is malformed.
pub fn parse_feed(xml: &str, limit: usize) -> Result<Vec<RawItem>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut feed_title = String::new();
    let mut in_entry = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut link = String::new();
    let mut description = String::new();
    let mut published = String::new();
    let mut image = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = tag_name(&e);
                if name == "item" || name == "entry" {
                    in_entry = true;
                    title.clear();
                    link.clear();
                    description.clear();
                    published.clear();
                    image.clear();
                } else if in_entry && name == "link" {
                    // Atom <link href="..."> carries the URL as an attribute;
                    // RSS carries it as text, handled in the Text arm.
                    if let Some(href) = attr(&e, "href") {
                        link = href;
                    }
                }
                current_tag = name;
            }
            Ok(Event::Empty(e)) => {
                let name = tag_name(&e);
                if in_entry {
                    match name.as_str() {
                        "link" => {
                            if let Some(href) = attr(&e, "href") {
                                link = href;
                            }
                        }
                        "enclosure" | "media:thumbnail" | "media:content" => {
                            if let Some(url) = attr(&e, "url") {
                                image = url;
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if (name == "item" || name == "entry") && in_entry {
                    in_entry = false;
                    items.push(RawItem {
                        title: Some(title.clone()),
                        url: Some(link.clone()),
                        description: Some(description.clone()),
                        published_at: parse_feed_date(&published),
                        source: (!feed_title.is_empty()).then(|| feed_title.clone()),
                        image_url: (!image.is_empty()).then(|| image.clone()),
                        ..RawItem::default()
                    });
                    if items.len() >= limit {
                        break;
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                if in_entry {
                    match current_tag.as_str() {
                        "title" => title = text,
                        "link" => link = text,
                        "description" | "summary" | "content" => {
                            if !description.is_empty() {
                                description.push(' ');
                            }
                            description.push_str(&text);
                        }
                        "pubDate" | "published" | "updated" | "dc:date" => published = text,
                        _ => {}
                    }
                } else if current_tag == "title" && feed_title.is_empty() {
                    feed_title = text;
                }
            }
            Ok(Event::CData(e)) => {
                if in_entry {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    match current_tag.as_str() {
                        "title" => title = text,
                        "description" | "summary" | "content" => description = text,
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    std::str::from_utf8(e.name().as_ref())
        .unwrap_or("")
        .to_string()
}

fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes().filter_map(Result::ok).find_map(|a| {
        (a.key.as_ref() == key.as_bytes())
            .then(|| String::from_utf8_lossy(a.value.as_ref()).into_owned())
    })
}

/// Parse RFC 2822 (RSS `pubDate`) or RFC 3339 (Atom `published`) timestamps.
fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
