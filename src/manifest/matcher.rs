//! Glob-style file selection against a source directory.
//!
//! Wildcards (`*`, `?`, `[...]`) match inside a single path component; `*`
//! never crosses a `/`. A pattern whose components are all literal matches
//! exactly that path. Whenever a match is a directory, the whole directory is
//! selected recursively.
//!
//! Every match is reported with its path components lined up against the
//! pattern's components, so callers can tell which part of a match came from
//! which part of the pattern (needed to expand wildcard prefixes into
//! destination paths).

use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::common::lexical_normalize;
use crate::error::{PackError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// True if the text contains glob metacharacters.
pub fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

/// Exclusion patterns in effect for a run. Only ever grows.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    patterns: Vec<Exclusion>,
    /// Absolute paths never selected, whatever the pattern (the staging tree
    /// and the packaging outputs when they sit inside the source tree).
    pruned: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
struct Exclusion {
    pattern: Pattern,
    /// Patterns without a separator also apply to every single component.
    per_component: bool,
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: &str) -> Result<()> {
        let normalized = pattern.replace('\\', "/");
        let normalized = normalized.trim_start_matches("./").trim_end_matches('/');
        let compiled = Pattern::new(normalized).map_err(|e| PackError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.patterns.push(Exclusion {
            pattern: compiled,
            per_component: !normalized.contains('/'),
        });
        Ok(())
    }

    /// Test a `/`-separated relative path against every exclusion.
    pub fn is_excluded(&self, rel: &str) -> bool {
        let options = MatchOptions {
            require_literal_leading_dot: false,
            ..MATCH_OPTIONS
        };
        self.patterns.iter().any(|ex| {
            ex.pattern.matches_with(rel, options)
                || (ex.per_component
                    && rel.split('/').any(|c| ex.pattern.matches_with(c, options)))
        })
    }

    /// Never select `path` or anything below it.
    pub fn prune(&mut self, path: &Path) {
        self.pruned.push(lexical_normalize(path));
    }

    pub fn is_pruned(&self, path: &Path) -> bool {
        self.pruned.iter().any(|p| path.starts_with(p))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// A selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Path of the file on disk.
    pub path: PathBuf,
    /// Relative path components: one per pattern component, followed by the
    /// components below a recursively selected directory.
    pub components: Vec<String>,
}

impl Match {
    /// The match as a `/`-separated relative path.
    pub fn rel(&self) -> String {
        self.components.join("/")
    }
}

/// Resolve `pattern` under `base`.
///
/// An empty result is fine for optional rules and a `MissingSource` failure
/// otherwise. Results are sorted by relative path.
pub fn match_pattern(
    base: &Path,
    pattern: &str,
    exclusions: &Exclusions,
    optional: bool,
) -> Result<Vec<Match>> {
    let matches = find(base, pattern, exclusions)?;
    if matches.is_empty() && !optional {
        return Err(PackError::MissingSource {
            pattern: pattern.to_string(),
            base: base.to_path_buf(),
        });
    }
    Ok(matches)
}

fn find(base: &Path, pattern: &str, exclusions: &Exclusions) -> Result<Vec<Match>> {
    let components: Vec<&str> = pattern
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    if components.is_empty() {
        return Ok(Vec::new());
    }

    // Everything before the first wildcard is resolved directly; only the
    // remainder goes through glob.
    let split = components
        .iter()
        .position(|c| has_wildcard(c))
        .unwrap_or(components.len());
    let (anchor, rest) = components.split_at(split);
    let anchor_dir = lexical_normalize(&base.join(anchor.join("/")));
    let anchor_components: Vec<String> = anchor.iter().map(|c| c.to_string()).collect();

    let mut found = Vec::new();
    if rest.is_empty() {
        if fs::symlink_metadata(&anchor_dir).is_ok() {
            collect(&anchor_dir, anchor_components, exclusions, &mut found)?;
        }
    } else {
        let anchor_text = anchor_dir.to_str().ok_or_else(|| PackError::Pattern {
            pattern: pattern.to_string(),
            message: format!("non UTF-8 base path {}", anchor_dir.display()),
        })?;
        let full = format!("{}/{}", Pattern::escape(anchor_text), rest.join("/"));
        let entries = glob::glob_with(&full, MATCH_OPTIONS).map_err(|e| PackError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                PackError::io(path, std::io::Error::from(e))
            })?;
            let mut matched = anchor_components.clone();
            matched.extend(relative_components(&path, &anchor_dir));
            collect(&path, matched, exclusions, &mut found)?;
        }
    }

    found.sort_by(|a, b| a.components.cmp(&b.components));
    Ok(found)
}

/// Add one matched path, expanding directories recursively.
fn collect(
    path: &Path,
    components: Vec<String>,
    exclusions: &Exclusions,
    found: &mut Vec<Match>,
) -> Result<()> {
    if exclusions.is_excluded(&components.join("/")) || exclusions.is_pruned(path) {
        return Ok(());
    }

    if !path.is_dir() {
        if path.is_file() {
            found.push(Match {
                path: path.to_path_buf(),
                components,
            });
        } else {
            warn!(path = %path.display(), "not a regular file, skipping");
        }
        return Ok(());
    }

    let prefix = components.join("/");
    let walker = WalkDir::new(path)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let below = relative_components(entry.path(), path).join("/");
            !exclusions.is_excluded(&format!("{}/{}", prefix, below))
                && !exclusions.is_pruned(entry.path())
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf());
            PackError::io(at, e.into())
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        // Links are not followed while walking; one that resolves to a
        // directory (or nowhere) has nothing to stage as a file.
        if !entry.path().is_file() {
            warn!(path = %entry.path().display(), "symlink does not resolve to a file, skipping");
            continue;
        }
        let mut matched = components.clone();
        matched.extend(relative_components(entry.path(), path));
        found.push(Match {
            path: entry.path().to_path_buf(),
            components: matched,
        });
    }
    Ok(())
}

fn relative_components(path: &Path, root: &Path) -> Vec<String> {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
