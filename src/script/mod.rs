//! Installer script synthesis.
//!
//! The synthesizer turns a manifest into two directive sequences: the install
//! fragment (create directories, copy files) and the uninstall fragment
//! (delete files, remove directories). Both are derived from the same pair
//! list, so whatever the installer writes the uninstaller removes.
//!
//! Directives carry install-relative paths. Turning them into text for a
//! particular installer toolchain is the job of a renderer ([`nsis`]).

pub mod nsis;
pub mod synth;

pub use synth::{install_fragment, uninstall_fragment};

use std::fmt;

/// Which fragment a directive belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Install,
    Uninstall,
}

/// One installer-script instruction. Paths are `/`-separated and relative to
/// the install root; the root itself is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Make `path` the current output directory, creating it.
    SetOutputDirectory(String),
    /// Install the staged file at `path` into the current output directory.
    CopyFile(String),
    /// Delete the installed file at `path`.
    DeleteFile(String),
    /// Remove the directory at `path` (only succeeds if empty).
    RemoveDirectory(String),
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::SetOutputDirectory(_) | Directive::CopyFile(_) => DirectiveKind::Install,
            Directive::DeleteFile(_) | Directive::RemoveDirectory(_) => DirectiveKind::Uninstall,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Directive::SetOutputDirectory(p)
            | Directive::CopyFile(p)
            | Directive::DeleteFile(p)
            | Directive::RemoveDirectory(p) => p,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::SetOutputDirectory(p) => write!(f, "SetOutputDirectory({})", p),
            Directive::CopyFile(p) => write!(f, "CopyFile({})", p),
            Directive::DeleteFile(p) => write!(f, "DeleteFile({})", p),
            Directive::RemoveDirectory(p) => write!(f, "RemoveDirectory({})", p),
        }
    }
}
