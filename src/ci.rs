// src/ci.rs
//! CI step outputs (`$GITHUB_OUTPUT`), echoed to stdout for plain runs.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::config::optional_env;

pub const GITHUB_OUTPUT_VAR: &str = "GITHUB_OUTPUT";

/// Append `key=value` to the step-output file at `path`.
pub fn append_output(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening step output file {}", path.display()))?;
    writeln!(f, "{key}={value}")
        .with_context(|| format!("writing step output {key} to {}", path.display()))
}

/// Publish a step output: always on stdout, and to `$GITHUB_OUTPUT` when set.
pub fn set_output(key: &str, value: &str) -> Result<()> {
    println!("{key}={value}");
    match optional_env(GITHUB_OUTPUT_VAR) {
        Some(p) => append_output(Path::new(&p), key, value),
        None => Ok(()),
    }
}
