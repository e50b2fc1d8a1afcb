//! Parsing and locating `$ref` targets.
//!
//! Internal references (`#/components/schemas/Book`) restart resolution at the root of the
//! document they were found in. Everything else names a file relative to that document's
//! directory, optionally followed by an anchor (`./schemas/author.yml#/properties/id`).
//! External files must stay inside the specification's base directory.

use crate::error::{ClientError, Result};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// A parsed `$ref` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference<'a> {
    /// `#/a/b` within the current document
    Internal(Vec<String>),
    /// `file#anchor` relative to the current document
    External { file: &'a str, anchor: Vec<String> },
    /// `http(s)://…`, never fetched
    Remote(&'a str),
}

impl<'a> Reference<'a> {
    pub(crate) fn parse(reference: &'a str) -> Self {
        if let Some(pointer) = reference.strip_prefix('#') {
            return Reference::Internal(anchor_segments(pointer));
        }
        if reference.contains("://") {
            return Reference::Remote(reference);
        }
        match reference.split_once('#') {
            Some((file, anchor)) => Reference::External {
                file,
                anchor: anchor_segments(anchor),
            },
            None => Reference::External {
                file: reference,
                anchor: Vec::new(),
            },
        }
    }
}

/// Split an anchor into decoded segments.
///
/// `/a/b`, `a/b` and `./a/b` all address the same node.
pub(crate) fn anchor_segments(anchor: &str) -> Vec<String> {
    let anchor = anchor
        .strip_prefix("./")
        .or_else(|| anchor.strip_prefix('/'))
        .unwrap_or(anchor);
    anchor
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode_segment)
        .collect()
}

/// Decode one JSON pointer segment: `~1` → `/`, `~0` → `~`, then percent-escapes.
pub(crate) fn decode_segment(segment: &str) -> String {
    let unescaped = segment.replace("~1", "/").replace("~0", "~");
    let decoded = urlencoding::decode(&unescaped).map(Cow::into_owned);
    decoded.unwrap_or(unescaped)
}

/// Collapse `.` and `..` components without touching the file system.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Locate `file` relative to `current_dir`, refusing anything outside `base`.
///
/// Containment is checked lexically first, so escaping paths are rejected whether or not the
/// target exists. When the target does exist its canonical path is checked too, which keeps
/// symlinks inside the tree from pointing out of it. A relative `base` confines nothing, so
/// every external file is refused then.
pub(crate) fn locate(reference: &str, file: &str, current_dir: &Path, base: &Path) -> Result<PathBuf> {
    let candidate = normalize(&current_dir.join(file));
    let permission = |path: PathBuf| ClientError::Permission {
        reference: reference.to_string(),
        path,
        base: base.to_path_buf(),
    };

    if !base.is_absolute() || !candidate.starts_with(base) {
        return Err(permission(candidate));
    }

    if let (Ok(canonical), Ok(canonical_base)) = (candidate.canonicalize(), base.canonicalize()) {
        if !canonical.starts_with(&canonical_base) {
            return Err(permission(canonical));
        }
        return Ok(canonical);
    }

    Ok(candidate)
}
