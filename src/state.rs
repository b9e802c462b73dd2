// src/state.rs
//! Dedup marker: a single durable register holding the GUID of the last
//! processed feed entry.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Narrow load/store interface so the fetch stage can run against a file
/// in production and an in-memory register in tests.
pub trait MarkerStore: Send + Sync {
    /// Last stored identifier, `None` on first run.
    fn load(&self) -> Result<Option<String>>;
    /// Replace the stored identifier.
    fn store(&self, id: &str) -> Result<()>;
}

/// Marker persisted as the raw identifier in a plain-text file.
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarkerStore for FileMarker {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) => {
                let id = s.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("reading marker {}", self.path.display()))
            }
        }
    }

    fn store(&self, id: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating marker dir {}", dir.display()))?;
        }
        // Write-then-rename so a crash never leaves a truncated marker behind.
        let tmp = self.path.with_extension("tmp");
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(id.as_bytes())?;
        f.sync_all()?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("writing marker {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory marker. Counts writes so callers can assert on side effects.
#[derive(Debug, Default)]
pub struct MemoryMarker {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    value: Option<String>,
    writes: usize,
}

impl MemoryMarker {
    pub fn new(initial: Option<&str>) -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                value: initial.map(str::to_string),
                writes: 0,
            }),
        }
    }

    pub fn writes(&self) -> usize {
        self.inner.lock().map(|g| g.writes).unwrap_or_default()
    }

    pub fn current(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|g| g.value.clone())
    }
}

impl MarkerStore for MemoryMarker {
    fn load(&self) -> Result<Option<String>> {
        let g = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("marker mutex poisoned"))?;
        Ok(g.value.clone())
    }

    fn store(&self, id: &str) -> Result<()> {
        let mut g = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("marker mutex poisoned"))?;
        g.value = Some(id.to_string());
        g.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_marker_absent_then_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FileMarker::new(dir.path().join("state").join("latest.txt"));
        assert_eq!(marker.load().unwrap(), None);

        marker.store("abc123").unwrap();
        assert_eq!(marker.load().unwrap().as_deref(), Some("abc123"));
        // Raw identifier, no formatting.
        assert_eq!(fs::read_to_string(marker.path()).unwrap(), "abc123");
    }

    #[test]
    fn file_marker_trims_and_treats_blank_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("latest.txt");
        fs::write(&p, "  guid-1\n").unwrap();
        assert_eq!(FileMarker::new(&p).load().unwrap().as_deref(), Some("guid-1"));
        fs::write(&p, "\n").unwrap();
        assert_eq!(FileMarker::new(&p).load().unwrap(), None);
    }

    #[test]
    fn memory_marker_counts_writes() {
        let m = MemoryMarker::new(Some("old"));
        assert_eq!(m.load().unwrap().as_deref(), Some("old"));
        m.store("new").unwrap();
        assert_eq!(m.current().as_deref(), Some("new"));
        assert_eq!(m.writes(), 1);
    }
}
