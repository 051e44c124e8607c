//! Markdown document loader.
//!
//! Reads the candidate's biography/resume corpus from a directory: one
//! [`Document`] per markdown file, found recursively. Non-markdown files are
//! ignored. A missing or empty directory yields an empty list, never an
//! error, so the rest of the pipeline degrades to answering without context.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::models::Document;

const INCLUDE_GLOBS: &[&str] = &["**/*.md", "**/*.markdown"];

/// Scan `dir` recursively and return one [`Document`] per markdown file.
///
/// `source_path` records the literal filesystem path the text was read from;
/// it is used downstream purely as a citation label. Results are sorted by
/// path for deterministic ordering.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let include_set = build_globset(INCLUDE_GLOBS)?;

    let mut documents = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if !include_set.is_match(relative.to_string_lossy().as_ref()) {
            continue;
        }

        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };

        documents.push(Document {
            text,
            source_path: path.to_string_lossy().to_string(),
        });
    }

    // Sort for deterministic ordering
    documents.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    Ok(documents)
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
