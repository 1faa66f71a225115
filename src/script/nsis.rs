//! NSIS rendering of installer directives.
//!
//! ```text
//! SetOutputDirectory(fonts)   ->  SetOutPath $INSTDIR\fonts
//! CopyFile(fonts/a.ttf)       ->  File C:\build\staging\fonts\a.ttf
//! DeleteFile(fonts/a.ttf)     ->  Delete $INSTDIR\fonts\a.ttf
//! RemoveDirectory(fonts)      ->  RMDir $INSTDIR\fonts
//! ```

use std::path::Path;

use super::Directive;

/// Install directory variable every installed path is relative to.
pub const INSTDIR: &str = "$INSTDIR";

/// Renders directives as NSIS script lines.
#[derive(Debug, Clone)]
pub struct NsisRenderer<'a> {
    /// Staging root; `File` directives reference the staged copies.
    staging: &'a Path,
}

impl<'a> NsisRenderer<'a> {
    pub fn new(staging: &'a Path) -> Self {
        Self { staging }
    }

    /// Render one directive as a single line (no trailing newline).
    pub fn line(&self, directive: &Directive) -> String {
        match directive {
            Directive::SetOutputDirectory(dir) => format!("SetOutPath {}", installed(dir)),
            Directive::CopyFile(path) => {
                format!("File {}", windows_path(&self.staging.join(path).to_string_lossy()))
            }
            Directive::DeleteFile(path) => format!("Delete {}", installed(path)),
            Directive::RemoveDirectory(dir) => format!("RMDir {}", installed(dir)),
        }
    }

    /// Render a fragment, one directive per line.
    pub fn render(&self, directives: &[Directive]) -> String {
        let mut out = String::new();
        for directive in directives {
            out.push_str(&self.line(directive));
            out.push('\n');
        }
        out
    }
}

/// `$INSTDIR`-relative path; the install root renders as `$INSTDIR`.
fn installed(rel: &str) -> String {
    if rel.is_empty() {
        INSTDIR.to_string()
    } else {
        windows_path(&format!("{}/{}", INSTDIR, rel))
    }
}

/// Backslash separators, no trailing separator.
pub fn windows_path(path: &str) -> String {
    let converted = path.replace('/', "\\");
    match converted.strip_suffix('\\') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => converted,
    }
}
