//! Retrieved-context formatting.
//!
//! Turns a ranked list of search results into the single text block the
//! language model receives as background. `None` signals "no context
//! available" to the generation step, which is distinct from an empty
//! string ("context retrieved but blank").

use std::path::Path;

use crate::models::SearchResult;

/// Format search results into a prompt-ready context block.
///
/// Results are rendered in the order given (closest first), one labelled
/// block per result with an ordinal index and a human-readable source label
/// (the final path segment of the chunk's source), separated by blank lines.
/// Empty input yields `None`.
pub fn format_context(results: &[SearchResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    let blocks: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "[{}] {}:\n{}",
                i + 1,
                source_label(&result.metadata.source),
                result.document.trim()
            )
        })
        .collect();

    Some(blocks.join("\n\n"))
}

/// Final path segment of a source path, used as the citation label.
fn source_label(source: &str) -> &str {
    Path::new(source)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source)
}
