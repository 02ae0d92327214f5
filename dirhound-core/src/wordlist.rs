// Candidate sources: path wordlists and user-agent pools

use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Trimmed, non-empty, non-comment lines, first occurrence wins.
pub fn parse_lines(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(String::from)
        .collect()
}

/// Load a path wordlist. An empty result is an error.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read wordlist {}", path.display()))?;

    let words = parse_lines(&content);
    if words.is_empty() {
        bail!(
            "Wordlist {} is empty or contains only comments",
            path.display()
        );
    }

    Ok(words)
}

/// Load user-agent strings. An empty file is fine, the scanner has a default.
pub fn load_user_agents(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read user-agent list {}", path.display()))?;
    Ok(parse_lines(&content))
}
