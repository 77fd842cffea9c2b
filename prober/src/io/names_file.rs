//! Provider name input.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Split a newline-delimited name list, dropping blank lines.
pub fn parse_names(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read provider names from `path`, one per line.
pub fn read_names(path: &Path) -> Result<Vec<String>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read names file {}", path.display()))?;
    Ok(parse_names(&contents))
}
