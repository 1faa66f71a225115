//! Windows finish - NSIS installer.
//!
//! The installer template carries the fixed parts of the installer; the
//! packager fills in five blocks:
//!
//! | Key              | Content                                      |
//! |------------------|----------------------------------------------|
//! | `VERSION`        | `!define`s for the executable and version    |
//! | `SOURCE`         | source tree root                             |
//! | `GRID_VARS`      | output file, install name, shortcut, flags   |
//! | `INSTALL_FILES`  | install fragment                             |
//! | `DELETE_FILES`   | uninstall fragment                           |
//!
//! Every channel substitution string (`APP_NAME`, `CHANNEL`, ...) is
//! available as well.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{Artifact, PackageSettings};
use crate::channel::{Channel, Version};
use crate::common::write_file_with_dirs;
use crate::error::{PackError, Result};
use crate::manifest::Manifest;
use crate::process::{self, Cmd};
use crate::script::nsis::{windows_path, NsisRenderer};
use crate::script::{install_fragment, uninstall_fragment};
use crate::template::{self, Substitutions};

/// The installer file name for these settings.
pub fn installer_file(settings: &PackageSettings) -> String {
    settings
        .installer_name
        .clone()
        .unwrap_or_else(|| settings.channel.installer_file(&settings.version))
}

/// File name of the rendered script inside the output directory.
pub fn script_file(channel: &Channel) -> String {
    let app: String = channel.app_name.split_whitespace().collect();
    format!("{}_setup_tmp.nsi", app.to_lowercase())
}

/// `!define` block naming the executable and version strings.
pub fn version_vars(channel: &Channel, version: &Version) -> String {
    format!(
        "!define INSTEXE  \"{}\"\n\
         !define VERSION \"{}\"\n\
         !define VERSION_LONG \"{}\"\n\
         !define VERSION_DASHES \"{}\"\n",
        channel.final_exe(),
        version.short(),
        version.dotted(),
        version.dashed()
    )
}

/// All substitution strings for the installer template.
pub fn substitutions(settings: &PackageSettings, manifest: &Manifest) -> Substitutions {
    let renderer = NsisRenderer::new(&settings.staging);
    let installer = installer_file(settings);

    let mut map = settings.channel.substitutions(&settings.version);
    map.insert("INSTALLER_FILE".into(), installer.clone());
    map.insert(
        "VERSION".into(),
        version_vars(&settings.channel, &settings.version),
    );
    map.insert(
        "SOURCE".into(),
        windows_path(&settings.source.to_string_lossy()),
    );
    map.insert("GRID_VARS".into(), settings.channel.grid_vars(&installer));
    map.insert(
        "INSTALL_FILES".into(),
        renderer.render(&install_fragment(manifest.pairs())),
    );
    map.insert(
        "DELETE_FILES".into(),
        renderer.render(&uninstall_fragment(manifest.pairs())),
    );
    map
}

/// Render the installer script and write it to the output directory.
pub fn write_script(settings: &PackageSettings, manifest: &Manifest) -> Result<PathBuf> {
    let template_text = fs::read_to_string(&settings.template)
        .map_err(|e| PackError::io(&settings.template, e))?;
    let script = template::render(&template_text, &substitutions(settings, manifest))?;

    let path = settings.output_dir.join(script_file(&settings.channel));
    write_file_with_dirs(&path, script).map_err(|e| PackError::io(&path, e))?;
    info!(script = %path.display(), "wrote installer script");
    Ok(path)
}

pub fn finish(settings: &PackageSettings, manifest: &Manifest) -> Result<Artifact> {
    let script = write_script(settings, manifest)?;

    // The script now exists; tool failures below leave it in place.
    let compiler = process::which(&settings.makensis)
        .unwrap_or_else(|| PathBuf::from(&settings.makensis));
    info!(compiler = %compiler.display(), "compiling installer");
    Cmd::new(compiler.to_string_lossy())
        .arg_path(&script)
        .dir(&settings.output_dir)
        .timeout(settings.tool_timeout)
        .run()?;

    let installer = settings.output_dir.join(installer_file(settings));
    sign(settings, &installer)?;

    info!(installer = %installer.display(), "installer ready");
    Ok(Artifact {
        package: Some(installer),
        script: Some(script),
    })
}

fn sign(settings: &PackageSettings, installer: &Path) -> Result<()> {
    let Some(line) = settings.sign.as_deref() else {
        warn!("no signer configured, skipping code signing");
        return Ok(());
    };
    let Some(cmd) = Cmd::from_command_line(line) else {
        warn!("signer command is empty, skipping code signing");
        return Ok(());
    };
    info!(signer = cmd.program(), "signing installer");
    cmd.arg_path(installer)
        .timeout(settings.tool_timeout)
        .run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::StagedPair;
    use tempfile::TempDir;

    fn settings(root: &Path) -> PackageSettings {
        PackageSettings {
            channel: Channel {
                app_name: "Viewer".to_string(),
                name: "Viewer Release".to_string(),
                default_name: "Viewer Release".to_string(),
                grid: String::new(),
                login_channel: None,
            },
            version: Version::parse("3.4.1.2"),
            source: root.join("source"),
            staging: root.join("out/staging"),
            output_dir: root.join("out"),
            template: root.join("installer_template.nsi"),
            installer_name: None,
            makensis: "true".to_string(),
            sign: None,
            tool_timeout: None,
        }
    }

    fn manifest() -> Manifest {
        Manifest::from_pairs(vec![
            StagedPair {
                source: PathBuf::from("/src/a/one.txt"),
                dest: "app_settings/a/one.txt".to_string(),
                staged: true,
            },
            StagedPair {
                source: PathBuf::from("/src/viewer.exe"),
                dest: "Viewer.exe".to_string(),
                staged: true,
            },
        ])
    }

    #[test]
    fn test_version_vars() {
        let s = settings(Path::new("/tmp"));
        let vars = version_vars(&s.channel, &s.version);
        assert_eq!(
            vars,
            "!define INSTEXE  \"Viewer.exe\"\n\
             !define VERSION \"3.4.1\"\n\
             !define VERSION_LONG \"3.4.1.2\"\n\
             !define VERSION_DASHES \"3-4-1-2\"\n"
        );
    }

    #[test]
    fn test_installer_name_override() {
        let mut s = settings(Path::new("/tmp"));
        assert_eq!(installer_file(&s), "Viewer-3-4-1-2_Setup.exe");
        s.installer_name = Some("custom.exe".to_string());
        assert_eq!(installer_file(&s), "custom.exe");
    }

    #[test]
    fn test_substitutions_cover_template_blocks() {
        let s = settings(Path::new("/tmp"));
        let map = substitutions(&s, &manifest());
        for key in ["VERSION", "SOURCE", "GRID_VARS", "INSTALL_FILES", "DELETE_FILES"] {
            assert!(map.contains_key(key), "missing {}", key);
        }
        assert!(map["DELETE_FILES"].contains("RMDir $INSTDIR\\app_settings\\a\n"));
        assert!(map["GRID_VARS"].starts_with("OutFile \"Viewer-3-4-1-2_Setup.exe\""));
    }

    #[test]
    fn test_write_script_renders_template() {
        let temp = TempDir::new().unwrap();
        let s = settings(temp.path());
        fs::write(
            &s.template,
            "Name \"%%APP_NAME%%\"\n%%VERSION%%%%GRID_VARS%%Section\n%%INSTALL_FILES%%SectionEnd\n\
             Section Uninstall\n%%DELETE_FILES%%SectionEnd\n",
        )
        .unwrap();

        let path = write_script(&s, &manifest()).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert_eq!(path, temp.path().join("out/viewer_setup_tmp.nsi"));
        assert!(text.starts_with("Name \"Viewer\"\n!define INSTEXE"));
        assert!(text.contains("SetOutPath $INSTDIR\\app_settings\\a\n"));
        assert!(text.contains("Delete $INSTDIR\\Viewer.exe\n"));
        assert!(!text.contains("%%"));
    }

    #[test]
    fn test_unknown_template_key_fails_before_writing() {
        let temp = TempDir::new().unwrap();
        let s = settings(temp.path());
        fs::write(&s.template, "%%NOT_A_KEY%%\n").unwrap();

        let err = write_script(&s, &manifest()).unwrap_err();

        assert!(matches!(err, PackError::MissingKey { .. }));
        assert!(!temp.path().join("out/viewer_setup_tmp.nsi").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_compiler_failure_keeps_script() {
        let temp = TempDir::new().unwrap();
        let mut s = settings(temp.path());
        s.makensis = "false".to_string();
        fs::write(&s.template, "%%INSTALL_FILES%%").unwrap();

        let err = finish(&s, &manifest()).unwrap_err();

        assert!(matches!(err, PackError::ExternalTool { .. }));
        assert!(temp.path().join("out/viewer_setup_tmp.nsi").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_finish_runs_compiler_and_signer() {
        let temp = TempDir::new().unwrap();
        let mut s = settings(temp.path());
        s.sign = Some("true --sign".to_string());
        fs::write(&s.template, "%%GRID_VARS%%").unwrap();

        let artifact = finish(&s, &manifest()).unwrap();

        assert_eq!(
            artifact.package,
            Some(temp.path().join("out/Viewer-3-4-1-2_Setup.exe"))
        );
        assert!(artifact.script.unwrap().is_file());
    }
}
