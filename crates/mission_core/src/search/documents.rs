use super::{SearchKind, SearchResult};
use std::path::{Component, Path};
use walkdir::{DirEntry, WalkDir};

const SKIP_DIRS: &[&str] = &["node_modules", "dist", "build"];
const SEARCHABLE_EXTENSIONS: &[&str] = &[".md", ".txt"];
const UNSCOPED_ROOTS: &[&str] = &["memory", "research"];
const MEMORY_SEGMENT: &str = "memory";
const SNIPPET_CONTEXT: usize = 100;

/// Walks `root` depth-first and returns Markdown/text files whose content or
/// name contains `query`, ignoring case. Stops once `limit` hits are found.
pub fn search_documents(root: &Path, query: &str, limit: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();
    if limit == 0 {
        return results;
    }

    let needle = query.to_lowercase();
    // Symlinks are followed; walkdir reports link cycles as errors, which are
    // skipped below.
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "skipping unreadable workspace entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let Some(title) = strip_searchable_extension(&file_name) else {
            continue;
        };

        let bytes = match std::fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(path = %entry.path().display(), error = %err, "skipping unreadable file");
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        let lower_content = content.to_lowercase();
        let content_match = lower_content.find(&needle);
        if content_match.is_none() && !file_name.to_lowercase().contains(&needle) {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let segments = path_segments(relative);
        let snippet_start = content_match.map(|byte_index| lower_content[..byte_index].chars().count());

        results.push(SearchResult {
            kind: classify(&segments),
            title: title.to_string(),
            content: snippet(&content, snippet_start, query.chars().count()),
            path: Some(segments.join("/")),
            timestamp: None,
            project: project_for(&segments),
        });

        if results.len() >= limit {
            break;
        }
    }

    results
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
}

fn strip_searchable_extension(file_name: &str) -> Option<&str> {
    SEARCHABLE_EXTENSIONS
        .iter()
        .find_map(|extension| file_name.strip_suffix(extension))
}

fn path_segments(relative: &Path) -> Vec<String> {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Files under any `memory/` directory are agent memories; the rest are
/// plain documents.
fn classify(segments: &[String]) -> SearchKind {
    let directories = &segments[..segments.len().saturating_sub(1)];
    if directories.iter().any(|segment| segment == MEMORY_SEGMENT) {
        SearchKind::Memory
    } else {
        SearchKind::Document
    }
}

fn project_for(segments: &[String]) -> Option<String> {
    if segments.len() < 2 {
        return None;
    }
    let first = &segments[0];
    if UNSCOPED_ROOTS.contains(&first.as_str()) {
        None
    } else {
        Some(first.clone())
    }
}

/// Up to 100 characters either side of the match, flattened to one line.
/// Without a content match (file name hit) the head of the file is used.
fn snippet(content: &str, match_start: Option<usize>, query_len: usize) -> String {
    let (start, end) = match match_start {
        Some(at) => (
            at.saturating_sub(SNIPPET_CONTEXT),
            at + query_len + SNIPPET_CONTEXT,
        ),
        None => (0, 2 * SNIPPET_CONTEXT),
    };

    content
        .chars()
        .skip(start)
        .take(end - start)
        .map(|ch| if ch == '\n' { ' ' } else { ch })
        .collect()
}
