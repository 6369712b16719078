//! Text and JSON rendering of search results.

use std::fmt::Write as _;

use crate::types::SearchResult;

/// Render one numbered line per chain, preceded by a summary line.
pub fn render_text(result: &SearchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} chain(s) from {} to {} within {} hop(s)",
        result.chains.len(),
        result.start,
        result.target,
        result.max_hops
    );
    for (i, chain) in result.chains.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", i + 1, chain);
    }
    let _ = writeln!(out, "digest {}", result.digest);
    out
}

/// Render the full result as a single JSON document.
pub fn render_json(result: &SearchResult) -> serde_json::Result<String> {
    serde_json::to_string(result)
}
