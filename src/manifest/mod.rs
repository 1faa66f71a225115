//! Declarative rule trees and their evaluation into staged file pairs.
//!
//! A rule tree describes WHAT ends up in the package, never HOW it gets there.
//! The evaluator in [`builder`] interprets it against a source tree:
//!
//! ```text
//! Rule Tree (DATA)                     Evaluator (LOGIC)
//! ─────────────────────────────        ─────────────────
//! exclude("*.svn*")                    for op in tree.ops() {
//! prefix_same("app_settings", |t| {      match op { Select => matcher + stage,
//!     t.exclude("logcontrol.xml");                  PushPrefix => stack.push,
//!     t.select("*.xml");                            ... }
//! })                                   }
//! ```
//!
//! Prefixes nest: every selection resolves relative to the innermost
//! (source, destination) prefix. [`RuleTree::prefix`] emits balanced
//! push/pop pairs by construction; raw [`Op::PushPrefix`]/[`Op::PopPrefix`]
//! values (as found in rule files) are checked when the tree is evaluated.

pub mod builder;
pub mod definitions;
pub mod matcher;
pub mod prefix;
pub mod stage;

pub use builder::{build_manifest, BuildContext};
pub use stage::{CopyStager, DryRun, LinkStager, Stager};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PackError, Result};

/// A single file-selection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRule {
    /// Pattern relative to the current source prefix. `*` and `?` match
    /// within one path component; a directory match is taken recursively.
    pub pattern: String,
    /// Destination relative to the current destination prefix. Defaults to
    /// the matched source path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    /// Optional rules that match nothing are skipped silently.
    #[serde(default)]
    pub optional: bool,
}

/// Operations that make up a rule tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    // ─────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────
    /// Select files by pattern and stage them.
    Select(SelectionRule),

    /// Exclude matching paths from every later selection in the run.
    Exclude { pattern: String },

    /// Write generated content to a destination file and package it.
    WriteFile { dst: String, content: String },

    // ─────────────────────────────────────────────────────────────────────
    // Prefix scoping
    // ─────────────────────────────────────────────────────────────────────
    /// Open a nested (source, destination) prefix.
    PushPrefix { src: String, dst: String },

    /// Close the innermost prefix; `src` must name the segment being closed.
    PopPrefix { src: String },
}

/// An ordered list of operations, built imperatively or loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTree {
    ops: Vec<Op>,
}

impl RuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing operation list without checking its balance.
    pub fn from_ops(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Load a rule tree from a JSON file (an array of tagged operations).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| PackError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Select a mandatory pattern, destination mirroring the source.
    pub fn select(&mut self, pattern: &str) -> &mut Self {
        self.push_op(select(pattern))
    }

    /// Select a mandatory pattern into an explicit destination.
    pub fn select_to(&mut self, pattern: &str, dst: &str) -> &mut Self {
        self.push_op(select_to(pattern, dst))
    }

    /// Select a pattern that may legitimately match nothing.
    pub fn optional(&mut self, pattern: &str) -> &mut Self {
        self.push_op(optional(pattern))
    }

    /// Optional selection into an explicit destination.
    pub fn optional_to(&mut self, pattern: &str, dst: &str) -> &mut Self {
        self.push_op(optional_to(pattern, dst))
    }

    pub fn exclude(&mut self, pattern: &str) -> &mut Self {
        self.push_op(exclude(pattern))
    }

    pub fn write_file(&mut self, dst: &str, content: &str) -> &mut Self {
        self.push_op(write_file(dst, content))
    }

    /// Run `body` inside a (src, dst) prefix. The matching pop is always
    /// emitted, so trees built this way are balanced by construction.
    ///
    /// An empty `dst` keeps the current destination directory.
    pub fn prefix<F>(&mut self, src: &str, dst: &str, body: F) -> &mut Self
    where
        F: FnOnce(&mut RuleTree),
    {
        self.ops.push(Op::PushPrefix {
            src: src.to_string(),
            dst: dst.to_string(),
        });
        body(self);
        self.ops.push(Op::PopPrefix {
            src: label_for(src, dst).to_string(),
        });
        self
    }

    /// Same as [`RuleTree::prefix`] with the destination mirroring the source.
    pub fn prefix_same<F>(&mut self, src: &str, body: F) -> &mut Self
    where
        F: FnOnce(&mut RuleTree),
    {
        self.prefix(src, src, body)
    }

    /// Open a prefix without closing it. Prefer [`RuleTree::prefix`].
    pub fn push_prefix(&mut self, src: &str, dst: &str) -> &mut Self {
        self.push_op(Op::PushPrefix {
            src: src.to_string(),
            dst: dst.to_string(),
        })
    }

    /// Close a prefix opened with [`RuleTree::push_prefix`].
    pub fn pop_prefix(&mut self, src: &str) -> &mut Self {
        self.push_op(Op::PopPrefix {
            src: src.to_string(),
        })
    }

    /// Append all operations of another tree.
    pub fn extend(&mut self, other: RuleTree) -> &mut Self {
        self.ops.extend(other.ops);
        self
    }

    /// Static balance check: every push has a matching pop and no pop
    /// closes a prefix that was never opened.
    pub fn is_balanced(&self) -> bool {
        let mut open = 0usize;
        for op in &self.ops {
            match op {
                Op::PushPrefix { .. } => open += 1,
                Op::PopPrefix { .. } => {
                    if open == 0 {
                        return false;
                    }
                    open -= 1;
                }
                _ => {}
            }
        }
        open == 0
    }

    fn push_op(&mut self, op: Op) -> &mut Self {
        self.ops.push(op);
        self
    }
}

/// The label used to close a prefix: its source segment, or its
/// destination segment when the source segment is empty.
pub(crate) fn label_for<'a>(src: &'a str, dst: &'a str) -> &'a str {
    if src.is_empty() {
        dst
    } else {
        src
    }
}

/// One resolved file: where it came from and where it lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedPair {
    /// Absolute source path.
    pub source: PathBuf,
    /// `/`-separated path relative to the install root.
    pub dest: String,
    /// False when the pair was resolved but not physically staged.
    pub staged: bool,
}

/// Result of a manifest pass: one pair per destination, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pairs: Vec<StagedPair>,
}

impl Manifest {
    pub fn from_pairs(pairs: Vec<StagedPair>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[StagedPair] {
        &self.pairs
    }

    /// Pairs whose file physically exists in the destination tree.
    pub fn staged(&self) -> impl Iterator<Item = &StagedPair> {
        self.pairs.iter().filter(|p| p.staged)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Look up the pair for a destination path.
    pub fn get(&self, dest: &str) -> Option<&StagedPair> {
        self.pairs.iter().find(|p| p.dest == dest)
    }

    /// Persist the pair list as JSON for later inspection.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| PackError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        crate::common::write_file_with_dirs(path, json).map_err(|e| PackError::io(path, e))
    }

    /// Load a pair list written by [`Manifest::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
        serde_json::from_str(&json).map_err(|source| PackError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper functions for readable rule definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Mandatory selection. Fails the pass if nothing matches.
pub fn select(pattern: &str) -> Op {
    Op::Select(SelectionRule {
        pattern: pattern.to_string(),
        dst: None,
        optional: false,
    })
}

/// Mandatory selection into an explicit destination.
pub fn select_to(pattern: &str, dst: &str) -> Op {
    Op::Select(SelectionRule {
        pattern: pattern.to_string(),
        dst: Some(dst.to_string()),
        optional: false,
    })
}

/// Optional selection.
pub fn optional(pattern: &str) -> Op {
    Op::Select(SelectionRule {
        pattern: pattern.to_string(),
        dst: None,
        optional: true,
    })
}

/// Optional selection into an explicit destination.
pub fn optional_to(pattern: &str, dst: &str) -> Op {
    Op::Select(SelectionRule {
        pattern: pattern.to_string(),
        dst: Some(dst.to_string()),
        optional: true,
    })
}

/// Exclude a pattern for the rest of the run.
pub fn exclude(pattern: &str) -> Op {
    Op::Exclude {
        pattern: pattern.to_string(),
    }
}

/// Write generated content into the package.
pub fn write_file(dst: &str, content: &str) -> Op {
    Op::WriteFile {
        dst: dst.to_string(),
        content: content.to_string(),
    }
}
