// tests/fetch_dedup.rs
use ainews_pipeline::ingest::providers::rss::RssFeed;
use ainews_pipeline::ingest::types::EntryMetadata;
use ainews_pipeline::ingest::{run_fetch, FetchOutcome};
use ainews_pipeline::{FileMarker, MarkerStore, MemoryMarker};
use chrono::{Local, TimeZone};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

const FEED_XML: &str = include_str!("fixtures/issue_feed.xml");

fn now() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2025, 7, 18, 9, 0, 0).unwrap()
}

fn file_count(dir: &std::path::Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn same_guid_twice_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output");
    let feed = RssFeed::from_fixture(FEED_XML);
    let marker = MemoryMarker::new(Some("abc123"));

    let outcome = run_fetch(&feed, &marker, &out, now()).await.unwrap();

    assert_eq!(
        outcome,
        FetchOutcome::NoNewContent {
            guid: "abc123".into()
        }
    );
    assert_eq!(marker.writes(), 0);
    assert!(!out.exists(), "duplicate run must not create the output dir");
}

#[tokio::test]
async fn new_guid_writes_files_then_stores_fetched_guid() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output");
    let feed = RssFeed::from_fixture(FEED_XML);
    let marker = MemoryMarker::new(Some("xyz789"));

    let outcome = run_fetch(&feed, &marker, &out, now()).await.unwrap();
    let FetchOutcome::Processed(entry) = outcome else {
        panic!("expected a processed entry");
    };

    assert_eq!(entry.date_prefix, "2025-07-17");
    assert_eq!(entry.html_path, out.join("2025-07-17_issue.html"));
    assert_eq!(entry.meta_path, out.join("2025-07-17_meta.json"));
    assert_eq!(marker.current().as_deref(), Some("abc123"));
    assert_eq!(marker.writes(), 1);

    let html = fs::read_to_string(&entry.html_path).unwrap();
    assert!(html.starts_with("<h1>AI News</h1>"));

    let meta: EntryMetadata =
        serde_json::from_str(&fs::read_to_string(&entry.meta_path).unwrap()).unwrap();
    assert_eq!(meta.guid, "abc123");
    assert_eq!(meta.author, "swyx");
    assert_eq!(meta.tags, vec!["ai".to_string(), "newsletter".to_string()]);
    assert_eq!(meta.link, "https://news.example.com/issues/25-07-17");

    // second run sees its own marker
    let again = run_fetch(&feed, &marker, &out, now()).await.unwrap();
    assert!(matches!(again, FetchOutcome::NoNewContent { .. }));
    assert_eq!(marker.writes(), 1);
    assert_eq!(file_count(&out), 2);
}

/// Records which output files existed at the moment the marker was stored.
struct OrderProbe {
    out: PathBuf,
    seen: Mutex<Vec<usize>>,
}

impl MarkerStore for OrderProbe {
    fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    fn store(&self, _id: &str) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(file_count(&self.out));
        Ok(())
    }
}

#[tokio::test]
async fn marker_is_stored_after_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output");
    let probe = OrderProbe {
        out: out.clone(),
        seen: Mutex::new(Vec::new()),
    };

    run_fetch(&RssFeed::from_fixture(FEED_XML), &probe, &out, now())
        .await
        .unwrap();

    assert_eq!(*probe.seen.lock().unwrap(), vec![2]);
}

#[tokio::test]
async fn file_marker_round_trips_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output");
    let marker_path = dir.path().join("state").join("latest.txt");
    let feed = RssFeed::from_fixture(FEED_XML);

    let first = run_fetch(&feed, &FileMarker::new(&marker_path), &out, now())
        .await
        .unwrap();
    assert!(matches!(first, FetchOutcome::Processed(_)));
    assert_eq!(fs::read_to_string(&marker_path).unwrap().trim(), "abc123");

    let second = run_fetch(&feed, &FileMarker::new(&marker_path), &out, now())
        .await
        .unwrap();
    assert!(matches!(second, FetchOutcome::NoNewContent { .. }));
}

#[tokio::test]
async fn empty_feed_is_fatal_and_leaves_marker_alone() {
    let dir = tempfile::tempdir().unwrap();
    let xml = r#"<rss version="2.0"><channel><title>x</title></channel></rss>"#;
    let marker = MemoryMarker::new(None);

    let err = run_fetch(&RssFeed::from_fixture(xml), &marker, dir.path(), now())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("no entries"));
    assert_eq!(marker.writes(), 0);
}

#[tokio::test]
async fn unparseable_pub_date_falls_back_to_local_date() {
    let dir = tempfile::tempdir().unwrap();
    let xml = r#"<rss version="2.0"><channel><title>x</title>
      <item><title>t</title><guid>g-1</guid><pubDate>yesterday-ish</pubDate>
      <description><![CDATA[<p>body</p>]]></description></item>
    </channel></rss>"#;
    let marker = MemoryMarker::new(None);

    let outcome = run_fetch(&RssFeed::from_fixture(xml), &marker, dir.path(), now())
        .await
        .unwrap();

    let FetchOutcome::Processed(entry) = outcome else {
        panic!("expected a processed entry");
    };
    assert_eq!(entry.date_prefix, "2025-07-18");
    assert_eq!(fs::read_to_string(entry.html_path).unwrap(), "<p>body</p>");
}

#[tokio::test]
async fn content_encoded_is_written_when_description_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let xml = r#"<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
      <channel><title>x</title>
      <item><title>t</title><guid>g-2</guid>
      <pubDate>Thu, 17 Jul 2025 05:44:39 GMT</pubDate>
      <content:encoded><![CDATA[<p>a&nbsp;b</p>]]></content:encoded></item>
    </channel></rss>"#;
    let marker = MemoryMarker::new(None);

    let outcome = run_fetch(&RssFeed::from_fixture(xml), &marker, dir.path(), now())
        .await
        .unwrap();

    let FetchOutcome::Processed(entry) = outcome else {
        panic!("expected a processed entry");
    };
    assert_eq!(fs::read_to_string(entry.html_path).unwrap(), "<p>a&nbsp;b</p>");
    assert_eq!(marker.current().as_deref(), Some("g-2"));
}
