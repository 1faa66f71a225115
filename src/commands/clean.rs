//! Clean command - removes staged output.
//!
//! Only paths a build writes are touched. The output directory is the parent
//! of the staging tree and may be shared with unrelated files, so it is never
//! removed itself.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::record_path;
use crate::artifact::{self, windows::script_file, PackageSettings};
use crate::config::Config;

/// Clean target for the clean command.
pub enum CleanTarget {
    /// The staging tree, manifest record and script (default)
    Staging,
    /// Also the installer or archive
    All,
}

/// Execute the clean command.
pub fn cmd_clean(target: CleanTarget, config: &Config) -> Result<()> {
    let mut cleaned = false;
    for path in targets(&target, config) {
        cleaned |= remove(&path)?;
    }

    if cleaned {
        println!("Clean complete.");
    } else {
        println!("Nothing to clean.");
    }
    Ok(())
}

/// Everything `target` covers for the configured platform.
fn targets(target: &CleanTarget, config: &Config) -> Vec<PathBuf> {
    let mut paths = vec![
        config.dest.clone(),
        record_path(config),
        config.output_dir().join(script_file(&config.channel())),
    ];
    if let CleanTarget::All = target {
        let settings = PackageSettings::new(config, &config.source, &config.dest, None);
        for output in artifact::outputs(config.platform, &settings) {
            if !paths.contains(&output) {
                paths.push(output);
            }
        }
    }
    paths
}

fn remove(path: &Path) -> Result<bool> {
    if fs::symlink_metadata(path).is_err() {
        return Ok(false);
    }
    println!("Removing {}...", path.display());
    if path.is_dir() && !path.is_symlink() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}
