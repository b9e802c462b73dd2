// src/publish/archive.rs
//! Newsletter archive index: one entry per date, upserted on each publish.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub date: String,
    pub title: String,
    pub summary: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveIndex {
    #[serde(default)]
    pub newsletters: Vec<ArchiveEntry>,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub total_count: usize,
}

impl ArchiveIndex {
    /// Missing file → empty index. A file that exists but does not parse is
    /// an error, so a corrupt archive is never silently replaced.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing archive index {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading archive index {}", path.display())),
        }
    }

    /// Replace the entry with the same `date`, or append. Recomputes
    /// `totalCount` and `lastUpdated`.
    pub fn upsert(&mut self, entry: ArchiveEntry, now: DateTime<Utc>) {
        match self.newsletters.iter_mut().find(|e| e.date == entry.date) {
            Some(existing) => *existing = entry,
            None => self.newsletters.push(entry),
        }
        self.total_count = self.newsletters.len();
        self.last_updated = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    }

    /// Up to `n` entries, newest date first.
    pub fn latest(&self, n: usize) -> Vec<&ArchiveEntry> {
        let mut sorted: Vec<&ArchiveEntry> = self.newsletters.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted.truncate(n);
        sorted
    }

    /// Write-then-rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing archive index")?;
        let tmp = path.with_extension("json.tmp");
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes())?;
        f.write_all(b"\n")?;
        fs::rename(&tmp, path)
            .with_context(|| format!("writing archive index {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(date: &str, title: &str) -> ArchiveEntry {
        ArchiveEntry {
            date: date.into(),
            title: title.into(),
            summary: format!("{title} summary"),
            filename: format!("{date}.html"),
        }
    }

    #[test]
    fn upsert_replaces_same_date() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let mut idx = ArchiveIndex::default();
        idx.upsert(entry("2025-01-01", "first"), now);
        idx.upsert(entry("2025-01-02", "second"), now);
        idx.upsert(entry("2025-01-01", "updated"), now);

        assert_eq!(idx.total_count, 2);
        assert_eq!(idx.newsletters.len(), 2);
        assert_eq!(idx.newsletters[0].title, "updated");
        assert_eq!(idx.last_updated, "2025-01-01T09:00:00Z");
    }

    #[test]
    fn latest_is_date_descending_and_capped() {
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        let mut idx = ArchiveIndex::default();
        for d in ["2025-01-03", "2025-01-01", "2025-01-04", "2025-01-02"] {
            idx.upsert(entry(d, d), now);
        }
        let dates: Vec<&str> = idx.latest(3).iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-04", "2025-01-03", "2025-01-02"]);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut idx = ArchiveIndex::default();
        idx.upsert(entry("2025-01-01", "t"), now);
        let v = serde_json::to_value(&idx).unwrap();
        assert_eq!(v["totalCount"], 1);
        assert!(v["lastUpdated"].is_string());
        assert_eq!(v["newsletters"][0]["filename"], "2025-01-01.html");
    }

    #[test]
    fn load_missing_is_empty_and_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("newsletters").join("index.json");
        assert_eq!(ArchiveIndex::load(&p).unwrap(), ArchiveIndex::default());

        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, "{oops").unwrap();
        assert!(ArchiveIndex::load(&p).is_err());
    }
}
