// src/publish/feed.rs
//! RSS 2.0 feed regenerated in full from the archive index.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::archive::ArchiveIndex;

/// Channel-level fields of the generated feed.
#[derive(Debug, Clone)]
pub struct FeedChannel<'a> {
    pub title: &'a str,
    pub base_url: &'a str,
    pub description: &'a str,
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `YYYY-MM-DD` → RFC 2822 at midnight UTC; `None` for other shapes.
fn pub_date(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().to_rfc2822())
}

/// Build the feed document from the newest `max_items` archive entries.
pub fn build_feed(
    index: &ArchiveIndex,
    channel: &FeedChannel<'_>,
    max_items: usize,
    now: DateTime<Utc>,
) -> Result<String> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
    w.write_event(Event::Start(rss))?;
    w.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(&mut w, "title", channel.title)?;
    text_element(&mut w, "link", channel.base_url)?;
    text_element(&mut w, "description", channel.description)?;
    text_element(&mut w, "language", "ja")?;
    text_element(&mut w, "lastBuildDate", &now.to_rfc2822())?;

    let mut self_link = BytesStart::new("atom:link");
    let feed_url = format!("{}/feed.xml", channel.base_url);
    self_link.push_attribute(("href", feed_url.as_str()));
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/rss+xml"));
    w.write_event(Event::Empty(self_link))?;

    for entry in index.latest(max_items) {
        let link = format!("{}/newsletters/{}", channel.base_url, entry.filename);
        w.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut w, "title", &entry.title)?;
        text_element(&mut w, "link", &link)?;
        text_element(&mut w, "guid", &link)?;
        text_element(&mut w, "description", &entry.summary)?;
        if let Some(d) = pub_date(&entry.date) {
            text_element(&mut w, "pubDate", &d)?;
        }
        w.write_event(Event::End(BytesEnd::new("item")))?;
    }

    w.write_event(Event::End(BytesEnd::new("channel")))?;
    w.write_event(Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(w.into_inner()).context("feed is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::archive::ArchiveEntry;
    use chrono::TimeZone;

    fn channel() -> FeedChannel<'static> {
        FeedChannel {
            title: "AIニュース",
            base_url: "https://example.org/ainews",
            description: "desc",
        }
    }

    #[test]
    fn feed_lists_newest_entries_first_and_caps() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let mut idx = ArchiveIndex::default();
        for day in 1..=25 {
            let date = format!("2025-01-{day:02}");
            idx.upsert(
                ArchiveEntry {
                    date: date.clone(),
                    title: format!("Issue {day}"),
                    summary: "A & B <tag>".into(),
                    filename: format!("{date}.html"),
                },
                now,
            );
        }

        let xml = build_feed(&idx, &channel(), 20, now).unwrap();
        assert_eq!(xml.matches("<item>").count(), 20);
        let first = xml.find("Issue 25").unwrap();
        let second = xml.find("Issue 24").unwrap();
        assert!(first < second);
        assert!(!xml.contains("Issue 5<"));
        assert!(xml.contains("A &amp; B &lt;tag&gt;"));
        assert!(xml.contains("https://example.org/ainews/newsletters/2025-01-25.html"));
        assert!(xml.contains("Sat, 25 Jan 2025 00:00:00 +0000"));
    }

    #[test]
    fn empty_index_still_yields_channel() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let xml = build_feed(&ArchiveIndex::default(), &channel(), 20, now).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<title>AIニュース</title>"));
        assert!(!xml.contains("<item>"));
    }
}
