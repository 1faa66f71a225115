//! Nested (source, destination) prefix stack.
//!
//! The stack always holds the root frame, which maps the source root onto the
//! install root. Source prefixes are kept as unnormalized pattern text so a
//! prefix may itself contain wildcards (`skins/*/textures`) or climb out of
//! the source root (`../sharedlibs/Release`). Destination prefixes are
//! normalized install-relative paths.

use std::path::{Path, PathBuf};

use super::label_for;
use crate::common::join_rel;
use crate::error::{PackError, Result};

#[derive(Debug, Clone)]
struct Frame {
    src_segment: String,
    dst_segment: String,
    base: PathBuf,
    src: String,
    dst: String,
}

/// The prefix in effect for the next selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix<'a> {
    /// Directory the source pattern is resolved against.
    pub base: &'a Path,
    /// Source pattern prefix relative to `base` (may contain wildcards).
    pub src: &'a str,
    /// Destination prefix relative to the install root.
    pub dst: &'a str,
}

#[derive(Debug, Clone)]
pub struct PrefixStack {
    frames: Vec<Frame>,
}

impl PrefixStack {
    /// Create a stack holding only the root frame.
    pub fn new(source_root: &Path) -> Self {
        Self {
            frames: vec![Frame {
                src_segment: String::new(),
                dst_segment: String::new(),
                base: source_root.to_path_buf(),
                src: String::new(),
                dst: String::new(),
            }],
        }
    }

    /// Open a prefix. An empty segment keeps the current directory on that
    /// side; an absolute source segment re-roots source resolution.
    pub fn push(&mut self, src: &str, dst: &str) {
        let top = self.top();
        let (base, src_prefix) = if Path::new(src).is_absolute() {
            (PathBuf::from(src), String::new())
        } else {
            (top.base.clone(), concat_pattern(&top.src, src))
        };
        let frame = Frame {
            src_segment: src.to_string(),
            dst_segment: dst.to_string(),
            base,
            src: src_prefix,
            dst: join_rel(&top.dst, dst),
        };
        self.frames.push(frame);
    }

    /// Close the innermost prefix.
    ///
    /// `expected` must equal the source segment that was pushed, or the
    /// destination segment when the pushed source segment was empty.
    pub fn pop(&mut self, expected: &str) -> Result<()> {
        if self.frames.len() == 1 {
            return Err(PackError::StackMismatch {
                expected: expected.to_string(),
                found: "no open prefix".to_string(),
            });
        }
        let top = self.top();
        if !label_matches(top, expected) {
            return Err(PackError::StackMismatch {
                expected: expected.to_string(),
                found: format!("'{}'", label_for(&top.src_segment, &top.dst_segment)),
            });
        }
        self.frames.pop();
        Ok(())
    }

    pub fn current(&self) -> Prefix<'_> {
        let top = self.top();
        Prefix {
            base: &top.base,
            src: &top.src,
            dst: &top.dst,
        }
    }

    /// Number of prefixes currently open (the root frame is not counted).
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Verify that every prefix was closed.
    pub fn finish(&self) -> Result<()> {
        if self.depth() == 0 {
            return Ok(());
        }
        let open = self.frames[1..]
            .iter()
            .map(|f| label_for(&f.src_segment, &f.dst_segment).to_string())
            .collect();
        Err(PackError::UnclosedPrefix { open })
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }
}

fn label_matches(frame: &Frame, expected: &str) -> bool {
    let expected = expected.trim_end_matches(['/', '\\']);
    let src = frame.src_segment.trim_end_matches(['/', '\\']);
    if src.is_empty() {
        frame.dst_segment.trim_end_matches(['/', '\\']) == expected
    } else {
        src == expected
    }
}

/// Concatenate two source pattern fragments without resolving `..`.
///
/// Wildcard components have to line up one-to-one with the path components
/// they match, so the text is only cleaned of empty and `.` components.
pub(crate) fn concat_pattern(prefix: &str, segment: &str) -> String {
    prefix
        .split(['/', '\\'])
        .chain(segment.split(['/', '\\']))
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}
