//! Darwin finish - the staged tree is the application bundle.

use tracing::info;

use super::{make_scripts_executable, Artifact, PackageSettings};
use crate::error::Result;
use crate::manifest::Manifest;

const BUNDLE_SCRIPTS: &[&str] = &["Contents/MacOS/update_install"];

pub fn finish(settings: &PackageSettings, manifest: &Manifest) -> Result<Artifact> {
    let changed = make_scripts_executable(&settings.staging, manifest, BUNDLE_SCRIPTS)?;
    info!(scripts = changed.len(), bundle = %settings.staging.display(), "bundle ready");
    Ok(Artifact {
        package: Some(settings.staging.clone()),
        script: None,
    })
}
