//! Linux finish - executable launchers and a tarball.

use tracing::info;

use super::{make_scripts_executable, Artifact, PackageSettings};
use crate::config::Platform;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::process::Cmd;

/// Staged scripts that must be executable, relative to the install root.
fn launcher_scripts(settings: &PackageSettings) -> Vec<String> {
    let wrapper = settings
        .channel
        .app_name
        .split_whitespace()
        .collect::<String>()
        .to_lowercase();
    vec![
        "install.sh".to_string(),
        wrapper,
        "bin/update_install".to_string(),
    ]
}

/// Archive name, e.g. `Viewer_3_4_1_2_x86_64.tar.bz2`.
pub fn archive_name(platform: Platform, settings: &PackageSettings) -> String {
    let app: String = settings.channel.app_name.split_whitespace().collect();
    let arch = match platform {
        Platform::LinuxI686 => "i686",
        _ => "x86_64",
    };
    let channel = if settings.channel.is_default_channel() {
        String::new()
    } else {
        format!("{}_", settings.channel.oneword())
    };
    format!(
        "{}_{}{}_{}.tar.bz2",
        app,
        channel,
        settings.version.underscored(),
        arch
    )
}

pub fn finish(platform: Platform, settings: &PackageSettings, manifest: &Manifest) -> Result<Artifact> {
    let scripts = launcher_scripts(settings);
    let scripts: Vec<&str> = scripts.iter().map(String::as_str).collect();
    make_scripts_executable(&settings.staging, manifest, &scripts)?;

    let archive = settings.output_dir.join(archive_name(platform, settings));
    info!(archive = %archive.display(), "archiving staged tree");
    Cmd::new("tar")
        .arg("-cjf")
        .arg_path(&archive)
        .arg("-C")
        .arg_path(&settings.staging)
        .arg(".")
        .timeout(settings.tool_timeout)
        .run()?;

    Ok(Artifact {
        package: Some(archive),
        script: None,
    })
}
