//! Packaging finish - turns a staged tree into the platform's artifact.
//!
//! - `windows` - render the NSIS script, run the installer compiler, sign
//! - `linux` - mark launcher scripts executable, archive the tree
//! - `darwin` - mark bundle scripts executable

pub mod darwin;
pub mod linux;
pub mod windows;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::channel::{Channel, Version};
use crate::config::{output_dir_of, Config, Platform};
use crate::error::{PackError, Result};
use crate::manifest::Manifest;

/// Inputs for the packaging finish.
#[derive(Debug, Clone)]
pub struct PackageSettings {
    pub channel: Channel,
    pub version: Version,
    /// Source tree root (the installer's `%%SOURCE%%`).
    pub source: PathBuf,
    /// Staged destination tree.
    pub staging: PathBuf,
    /// Directory receiving the script, record and artifact.
    pub output_dir: PathBuf,
    /// Installer template (Windows only).
    pub template: PathBuf,
    /// Overrides the channel-derived installer file name.
    pub installer_name: Option<String>,
    /// Installer compiler program.
    pub makensis: String,
    /// Signer command line, run with the installer path appended.
    pub sign: Option<String>,
    /// Kill external tools that run longer than this.
    pub tool_timeout: Option<Duration>,
}

impl PackageSettings {
    /// Settings for packaging `staging`; outputs land next to it.
    pub fn new(config: &Config, source: &Path, staging: &Path, tool_timeout: Option<Duration>) -> Self {
        Self {
            channel: config.channel(),
            version: config.version(),
            source: source.to_path_buf(),
            staging: staging.to_path_buf(),
            output_dir: output_dir_of(staging),
            template: config.template_path(),
            installer_name: config.installer_name.clone(),
            makensis: config.makensis.clone(),
            sign: config.sign.clone(),
            tool_timeout,
        }
    }
}

/// What the finish produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    /// The installer or archive, when the platform produces one.
    pub package: Option<PathBuf>,
    /// Rendered installer script, when the platform uses one.
    pub script: Option<PathBuf>,
}

/// Run the packaging finish for `platform`.
pub fn finish(platform: Platform, settings: &PackageSettings, manifest: &Manifest) -> Result<Artifact> {
    match platform {
        Platform::Windows => windows::finish(settings, manifest),
        Platform::Darwin => darwin::finish(settings, manifest),
        Platform::LinuxI686 | Platform::LinuxX86_64 => linux::finish(platform, settings, manifest),
    }
}

/// Files the finish for `platform` writes into the output directory.
pub fn outputs(platform: Platform, settings: &PackageSettings) -> Vec<PathBuf> {
    let dir = &settings.output_dir;
    match platform {
        Platform::Windows => vec![
            dir.join(windows::script_file(&settings.channel)),
            dir.join(windows::installer_file(settings)),
        ],
        // The bundle is the staging tree itself.
        Platform::Darwin => Vec::new(),
        Platform::LinuxI686 | Platform::LinuxX86_64 => {
            vec![dir.join(linux::archive_name(platform, settings))]
        }
    }
}

/// Mark the given staged files executable. Destinations the manifest does
/// not contain are skipped.
pub(crate) fn make_scripts_executable(
    staging: &Path,
    manifest: &Manifest,
    scripts: &[&str],
) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    for script in scripts {
        if manifest.get(script).is_none() {
            tracing::debug!(script = %script, "not in manifest, not marking executable");
            continue;
        }
        let path = staging.join(script);
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "script not staged, not marking executable");
            continue;
        }
        crate::common::make_executable(&path).map_err(|e| PackError::io(&path, e))?;
        changed.push(path);
    }
    Ok(changed)
}
