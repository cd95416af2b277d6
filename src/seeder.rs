//! Seed file reader so a crawl can start from a prepared list of entry points.

use std::path::Path;
use tracing::{debug, warn};

use crate::url_utils::normalize_url_for_cli;

/// Read seed URLs from `path`, one per line.
///
/// Each line is either `url` or `priority,url`. Surrounding quotes are
/// stripped and the priority column is ignored, since the active traversal
/// policy scores every URL itself. Blank lines and `#` comments are skipped.
pub fn read_seed_file<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let seeds = parse_seeds(&content);
    debug!(path = %path.as_ref().display(), seeds = seeds.len(), "Read seed file");
    Ok(seeds)
}

/// Parse seed lines; see [`read_seed_file`].
pub fn parse_seeds(content: &str) -> Vec<String> {
    let mut seeds = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // The url column is always last; urls never contain a bare comma in practice.
        let url = match line.split_once(',') {
            Some((priority, url)) if looks_like_priority(priority) => url,
            _ => line,
        };
        let url = strip_quotes(url.trim());
        if url.is_empty() {
            warn!(line = line_no + 1, "Seed line has no URL");
            continue;
        }
        seeds.push(normalize_url_for_cli(url));
    }
    seeds
}

fn looks_like_priority(column: &str) -> bool {
    let column = strip_quotes(column.trim());
    column.is_empty() || column.parse::<f64>().is_ok()
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}
