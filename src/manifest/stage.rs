//! Staging primitives: how a resolved pair lands in the destination tree.
//!
//! The manifest builder decides WHAT to stage; a [`Stager`] decides HOW.
//! Every implementation is idempotent so a run can be repeated over an
//! existing staging tree.

use std::fs;
use std::io;
use std::path::Path;

use crate::common::{ensure_parent_exists, write_file_with_dirs};

/// Places files into the destination tree.
pub trait Stager {
    /// Name for logging.
    fn name(&self) -> &str;

    /// Stage `src` at `dst`. Returns whether a file was physically placed.
    fn stage(&self, src: &Path, dst: &Path) -> io::Result<bool>;

    /// Write generated content at `dst`. Returns whether it was written.
    fn write(&self, dst: &Path, content: &str) -> io::Result<bool>;
}

/// Copies files, preserving permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStager;

impl Stager for CopyStager {
    fn name(&self) -> &str {
        "copy"
    }

    fn stage(&self, src: &Path, dst: &Path) -> io::Result<bool> {
        ensure_parent_exists(dst)?;
        if same_file(src, dst) {
            return Ok(true);
        }
        remove_existing(dst)?;
        fs::copy(src, dst)?;
        Ok(true)
    }

    fn write(&self, dst: &Path, content: &str) -> io::Result<bool> {
        remove_existing(dst)?;
        write_file_with_dirs(dst, content)?;
        Ok(true)
    }
}

/// Hard-links files, falling back to a copy across filesystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkStager;

impl Stager for LinkStager {
    fn name(&self) -> &str {
        "link"
    }

    fn stage(&self, src: &Path, dst: &Path) -> io::Result<bool> {
        ensure_parent_exists(dst)?;
        if same_file(src, dst) {
            return Ok(true);
        }
        remove_existing(dst)?;
        if fs::hard_link(src, dst).is_err() {
            fs::copy(src, dst)?;
        }
        Ok(true)
    }

    fn write(&self, dst: &Path, content: &str) -> io::Result<bool> {
        remove_existing(dst)?;
        write_file_with_dirs(dst, content)?;
        Ok(true)
    }
}

/// Resolves pairs without touching the destination tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

impl Stager for DryRun {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn stage(&self, _src: &Path, _dst: &Path) -> io::Result<bool> {
        Ok(false)
    }

    fn write(&self, _dst: &Path, _content: &str) -> io::Result<bool> {
        Ok(false)
    }
}

fn same_file(src: &Path, dst: &Path) -> bool {
    match (fs::canonicalize(src), fs::canonicalize(dst)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Remove a previous file at `dst` so links and read-only copies can be replaced.
fn remove_existing(dst: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dst) {
        Ok(meta) if !meta.is_dir() => fs::remove_file(dst),
        _ => Ok(()),
    }
}
