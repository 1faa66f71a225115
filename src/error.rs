//! Error types for manifest evaluation, script synthesis and finishing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a packaging run.
#[derive(Debug, Error)]
pub enum PackError {
    /// A mandatory selection rule matched nothing.
    #[error("no files match '{pattern}' under {}", .base.display())]
    MissingSource { pattern: String, base: PathBuf },

    /// A prefix was closed with the wrong label, or closed when none was open.
    #[error("prefix mismatch: expected to close '{expected}', found {found}")]
    StackMismatch { expected: String, found: String },

    /// The rule tree ended with prefixes still open.
    #[error("rule tree ended with unclosed prefixes: {}", .open.join(", "))]
    UnclosedPrefix { open: Vec<String> },

    /// A template placeholder has no value in the substitution map.
    #[error("template references unknown key '%%{key}%%'")]
    MissingKey { key: String },

    /// An external tool (installer compiler, signer, archiver) failed.
    #[error("{program} failed with exit code {code}{}", stderr_suffix(.stderr))]
    ExternalTool {
        program: String,
        code: i32,
        stderr: String,
    },

    /// A selection or exclusion pattern is not a valid glob.
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// A rule file or manifest record is not valid JSON.
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackError {
    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the stack-discipline failures (mismatched pop or unclosed prefix).
    pub fn is_stack_mismatch(&self) -> bool {
        matches!(
            self,
            PackError::StackMismatch { .. } | PackError::UnclosedPrefix { .. }
        )
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{}", trimmed)
    }
}

pub type Result<T> = std::result::Result<T, PackError>;
