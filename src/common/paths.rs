//! Utilities for destination-relative path arithmetic.
//!
//! Destination paths are kept as `/`-separated strings relative to the
//! install root. The root itself is the empty string. Keeping them as plain
//! strings makes depth and ordering independent of the host separator, so a
//! script synthesized on Linux is byte-identical to one synthesized on Windows.

use std::path::{Component, Path, PathBuf};

/// Join a relative prefix and a relative segment, normalizing the result.
///
/// Empty segments mean "same directory". `.` components are dropped and `..`
/// pops the previous component. A `..` that would climb above the root is
/// dropped, so the result never escapes the install root.
pub fn join_rel(prefix: &str, segment: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in prefix.split(['/', '\\']).chain(segment.split(['/', '\\'])) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Normalize a single relative path (same rules as [`join_rel`]).
pub fn normalize_rel(path: &str) -> String {
    join_rel("", path)
}

/// Number of separators in a relative path; root-level files have depth 0.
pub fn depth(rel: &str) -> usize {
    rel.matches('/').count()
}

/// Directory part of a relative path ("" for root-level entries).
pub fn parent_dir(rel: &str) -> &str {
    match rel.rfind('/') {
        Some(idx) => &rel[..idx],
        None => "",
    }
}

/// Every ancestor directory of `dir`, deepest first, excluding the root.
///
/// `a/b/c` yields `a/b/c`, `a/b`, `a`. The root (`""`) yields nothing.
pub fn ancestors(dir: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = dir;
    while !current.is_empty() {
        result.push(current.to_string());
        current = parent_dir(current);
    }
    result
}

/// Lexically normalize an absolute or relative filesystem path.
///
/// Resolves `.` and `..` without touching the filesystem, so source paths like
/// `build/newview/../../scripts/x.msg` compare and display cleanly.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
