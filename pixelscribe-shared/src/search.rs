/// Read-only project document index
///
/// The chat widget can look up text in the project's own sources and docs.
/// Files are read once at startup into memory; queries never touch the
/// filesystem.
///
/// Indexed: `.js .jsx .ts .tsx .json .md .css .rs .toml` files up to
/// [`MAX_FILE_BYTES`] that are valid UTF-8. Skipped: dependency and build
/// directories ([`SKIPPED_DIRS`]) and environment files.
///
/// # Example
///
/// ```
/// use pixelscribe_shared::search::DocIndex;
///
/// let index = DocIndex::empty();
/// assert!(index.search("x").is_err());
/// assert!(index.search("pricing").unwrap().is_empty());
/// ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

/// Extensions eligible for indexing
pub const INDEXED_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "json", "md", "css", "rs", "toml"];

/// Directory names never descended into
pub const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target", ".git"];

/// Files larger than this are skipped
pub const MAX_FILE_BYTES: u64 = 512 * 1024;

/// Characters of context on each side of a match
pub const SNIPPET_RADIUS: usize = 120;

/// Maximum number of hits per query
pub const MAX_RESULTS: usize = 20;

/// Minimum trimmed query length in characters
pub const MIN_QUERY_CHARS: usize = 2;

/// Search error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Query too short")]
    QueryTooShort,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Path relative to the index root it was found under
    pub file: String,

    /// Text around the first match
    pub snippet: String,
}

#[derive(Debug)]
struct IndexedDoc {
    file: String,
    content: String,
    lowered: String,
}

/// In-memory document index
#[derive(Debug, Default)]
pub struct DocIndex {
    docs: Vec<IndexedDoc>,
}

impl DocIndex {
    /// Index with no documents
    pub fn empty() -> Self {
        Self::default()
    }

    /// Walks every root once and loads eligible files
    ///
    /// Missing roots and unreadable files are logged and skipped.
    pub fn build(roots: &[PathBuf]) -> Self {
        let mut docs = Vec::new();

        for root in roots {
            if !root.is_dir() {
                tracing::warn!(root = %root.display(), "Search root is not a directory, skipping");
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !is_skipped_dir(entry));

            for entry in walker.filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() || !is_indexable(entry.path()) {
                    continue;
                }

                if let Some(doc) = load(root, &entry) {
                    docs.push(doc);
                }
            }
        }

        tracing::info!(documents = docs.len(), "Document index built");

        Self { docs }
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Case-insensitive substring search
    ///
    /// Returns at most [`MAX_RESULTS`] hits in index order, one per file.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Err(SearchError::QueryTooShort);
        }

        let needle = query.to_lowercase();

        Ok(self
            .docs
            .iter()
            .filter(|doc| doc.lowered.contains(&needle))
            .filter_map(|doc| {
                let (start, end) = find_ignore_case(&doc.content, &needle)?;
                Some(SearchHit {
                    file: doc.file.clone(),
                    snippet: snippet(&doc.content, start, end),
                })
            })
            .take(MAX_RESULTS)
            .collect())
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

fn is_indexable(path: &Path) -> bool {
    // Environment files hold secrets
    let is_env = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name == ".env" || name.starts_with(".env."))
        .unwrap_or(false);

    !is_env
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| INDEXED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
}

fn load(root: &Path, entry: &DirEntry) -> Option<IndexedDoc> {
    let path = entry.path();

    let size = entry.metadata().ok()?.len();
    if size > MAX_FILE_BYTES {
        tracing::debug!(path = %path.display(), size, "Skipping large file");
        return None;
    }

    let content = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8(bytes).ok()?,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            return None;
        }
    };

    let file = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");

    Some(IndexedDoc {
        file,
        lowered: content.to_lowercase(),
        content,
    })
}

/// Byte range in `haystack` of the first case-insensitive match of `needle`
///
/// `needle` must already be lowercase. Offsets are found on the original text
/// since lowercasing can change byte lengths.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    haystack.char_indices().find_map(|(start, _)| {
        match_len(&haystack[start..], needle).map(|len| (start, start + len))
    })
}

/// Byte length of the prefix of `text` that lowercases to `needle`
fn match_len(text: &str, needle: &str) -> Option<usize> {
    let mut expected = needle.chars().peekable();

    for (offset, c) in text.char_indices() {
        for lowered in c.to_lowercase() {
            if expected.next() != Some(lowered) {
                return None;
            }
        }
        if expected.peek().is_none() {
            return Some(offset + c.len_utf8());
        }
    }

    None
}

fn snippet(content: &str, start: usize, end: usize) -> String {
    let before = content[..start]
        .char_indices()
        .rev()
        .nth(SNIPPET_RADIUS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let after = content[end..]
        .char_indices()
        .nth(SNIPPET_RADIUS)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());

    content[before..after].to_string()
}
