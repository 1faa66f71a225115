//! Integration tests for the stagepack pipeline.
//!
//! These drive rule evaluation, staging, script synthesis and the packaging
//! finish together over a mock build tree in a temp directory.

mod helpers;

use helpers::{
    assert_file_contains, assert_file_exists, assert_not_exists, create_file,
    create_mock_viewer_tree, release_channel, TestEnv,
};
use stagepack::commands::build::{cmd_build, BuildOptions};
use stagepack::config::{Action, Config, Platform};
use stagepack::manifest::definitions::{rules_for, RuleSettings};
use stagepack::manifest::{build_manifest, CopyStager, DryRun, Manifest, RuleTree};
use stagepack::script::nsis::NsisRenderer;
use stagepack::script::{install_fragment, uninstall_fragment, Directive};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn config_for(env: &TestEnv, platform: Platform, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert(
        "STAGEPACK_SOURCE".into(),
        env.source.to_string_lossy().into_owned(),
    );
    vars.insert(
        "STAGEPACK_DEST".into(),
        env.staging.to_string_lossy().into_owned(),
    );
    vars.insert("STAGEPACK_PLATFORM".into(), platform.name().into());
    vars.insert("STAGEPACK_VERSION".into(), "3.4.1.2".into());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_vars(&vars).expect("valid test config")
}

fn write_rules(env: &TestEnv, json: &str) -> std::path::PathBuf {
    let path = env.root.join("rules.json");
    fs::write(&path, json).unwrap();
    path
}

// =============================================================================
// Reference scenario
// =============================================================================

#[test]
fn test_app_settings_scenario_end_to_end() {
    let env = TestEnv::new();
    env.source_file("app_settings/a/one.txt");
    env.source_file("app_settings/a/two.txt");

    let mut tree = RuleTree::new();
    tree.prefix_same("app_settings", |t| {
        t.select("a/*.txt");
    });
    let manifest = build_manifest(&env.build_context(), &tree, &CopyStager).unwrap();

    let set = |p: &str| Directive::SetOutputDirectory(p.to_string());
    let copy = |p: &str| Directive::CopyFile(p.to_string());
    let delete = |p: &str| Directive::DeleteFile(p.to_string());
    let rmdir = |p: &str| Directive::RemoveDirectory(p.to_string());

    assert_eq!(
        install_fragment(manifest.pairs()),
        vec![
            set("app_settings/a"),
            copy("app_settings/a/two.txt"),
            copy("app_settings/a/one.txt"),
        ]
    );
    assert_eq!(
        uninstall_fragment(manifest.pairs()),
        vec![
            delete("app_settings/a/two.txt"),
            delete("app_settings/a/one.txt"),
            rmdir("app_settings/a"),
            rmdir("app_settings"),
        ]
    );

    assert_file_exists(&env.staged("app_settings/a/one.txt"));
    assert_file_exists(&env.staged("app_settings/a/two.txt"));

    let renderer = NsisRenderer::new(Path::new("C:/build/staging"));
    assert_eq!(
        renderer.render(&uninstall_fragment(manifest.pairs())),
        "Delete $INSTDIR\\app_settings\\a\\two.txt\n\
         Delete $INSTDIR\\app_settings\\a\\one.txt\n\
         RMDir $INSTDIR\\app_settings\\a\n\
         RMDir $INSTDIR\\app_settings\n"
    );
}

// =============================================================================
// Platform rule definitions over a mock tree
// =============================================================================

#[test]
fn test_linux_rules_stage_mock_viewer_tree() {
    let env = TestEnv::new();
    create_mock_viewer_tree(&env);

    let mut channel = release_channel();
    channel.grid = "aditi".to_string();
    let settings = RuleSettings {
        configuration: "Release",
        channel: &channel,
    };
    let tree = rules_for(Platform::LinuxX86_64, &settings);

    // The mock tree lacks the third-party libraries.
    let ctx = env.build_context().with_permissive(true);
    let manifest = build_manifest(&ctx, &tree, &CopyStager).unwrap();

    for staged in [
        "app_settings/message_template.msg",
        "app_settings/message.xml",
        "app_settings/settings.xml",
        "app_settings/CA.pem",
        "app_settings/shaders/class1/deferred/fullbrightF.glsl",
        "app_settings/windlight/days/Default.xml",
        "character/avatar_eye.llm",
        "fonts/DejaVuSans.ttf",
        "skins/paths.xml",
        "skins/default/colors.xml",
        "skins/default/xui/en/panel_login.xml",
        "skins/default/textures/textures.xml",
        "skins/default/textures/icons/Inv_Object.png",
        "skins/default/html/en-us/loading/loading.html",
        "gpu_table.txt",
        "licenses.txt",
        "README-linux.txt",
        "viewer",
        "install.sh",
        "bin/do-not-directly-run-viewer-bin",
        "viewer_icon.png",
        "res-sdl/viewer_icon.BMP",
        "bin/update_install",
        "featuretable_linux.txt",
    ] {
        assert!(manifest.get(staged).is_some(), "missing pair for {}", staged);
        assert_file_exists(&env.staged(staged));
    }

    // Excluded by name at any depth.
    assert!(manifest.get("app_settings/logcontrol.xml").is_none());
    assert!(manifest.get("app_settings/logcontrol-dev.xml").is_none());
    assert!(manifest.get("app_settings/shaders/.svn/entries").is_none());
    assert_not_exists(&env.staged("app_settings/shaders/.svn"));

    // Generated launch arguments.
    assert_file_contains(&env.staged("etc/gridargs.dat"), "--grid aditi");
    assert!(manifest.get("etc/gridargs.dat").unwrap().staged);
}

#[test]
fn test_mandatory_rules_fail_without_permissive() {
    let env = TestEnv::new();
    create_mock_viewer_tree(&env);

    let channel = release_channel();
    let settings = RuleSettings {
        configuration: "Release",
        channel: &channel,
    };
    let tree = rules_for(Platform::LinuxX86_64, &settings);

    let err = build_manifest(&env.build_context(), &tree, &DryRun).unwrap_err();
    assert!(
        matches!(err, stagepack::PackError::MissingSource { .. }),
        "unexpected error: {}",
        err
    );
}

// =============================================================================
// Build command
// =============================================================================

const WINDOWS_RULES: &str = r#"[
    {"op": "exclude", "pattern": "*.pdb"},
    {"op": "select", "pattern": "Release/viewer-bin.exe", "dst": "Viewer.exe"},
    {"op": "push_prefix", "src": "app_settings", "dst": "app_settings"},
    {"op": "select", "pattern": "*.xml"},
    {"op": "pop_prefix", "src": "app_settings"},
    {"op": "push_prefix", "src": "../sharedlibs/Release", "dst": ""},
    {"op": "select", "pattern": "*.dll"},
    {"op": "select", "pattern": "missing.dll", "optional": true},
    {"op": "pop_prefix", "src": "../sharedlibs/Release"}
]"#;

fn create_windows_tree(env: &TestEnv) {
    env.source_file("Release/viewer-bin.exe");
    env.source_file("Release/viewer-bin.pdb");
    env.source_file("app_settings/settings.xml");
    create_file(&env.root.join("indra/sharedlibs/Release/llcommon.dll"), "dll");
    create_file(&env.root.join("indra/sharedlibs/Release/llcommon.pdb"), "pdb");
    create_file(
        &env.source.join("installers/windows/installer_template.nsi"),
        "Name \"%%APP_NAME%%\"\n%%VERSION%%%%GRID_VARS%%\
         Section\n%%INSTALL_FILES%%SectionEnd\n\
         Section Uninstall\n%%DELETE_FILES%%SectionEnd\n",
    );
}

#[cfg(unix)]
#[test]
fn test_build_command_windows_package() {
    let env = TestEnv::new();
    create_windows_tree(&env);
    let rules = write_rules(&env, WINDOWS_RULES);
    // `true` stands in for the installer compiler.
    let config = config_for(&env, Platform::Windows, &[("STAGEPACK_MAKENSIS", "true")]);

    let outcome = cmd_build(
        &config,
        &BuildOptions {
            rules: Some(rules),
            actions: vec![Action::Copy, Action::Package],
            tool_timeout: None,
        },
    )
    .unwrap();

    let dests: Vec<&str> = outcome
        .manifest
        .pairs()
        .iter()
        .map(|p| p.dest.as_str())
        .collect();
    assert_eq!(dests, vec!["Viewer.exe", "app_settings/settings.xml", "llcommon.dll"]);

    let artifact = outcome.artifact.expect("package action ran");
    let script = artifact.script.expect("windows writes a script");
    assert_eq!(script, env.root.join("out/viewer_setup_tmp.nsi"));
    assert_file_contains(&script, "Name \"Viewer\"");
    assert_file_contains(&script, "!define VERSION_LONG \"3.4.1.2\"");
    assert_file_contains(&script, "OutFile \"Viewer-3-4-1-2_Setup.exe\"");
    assert_file_contains(&script, "SetOutPath $INSTDIR\\app_settings\n");
    assert_file_contains(&script, "Delete $INSTDIR\\llcommon.dll\n");
    assert_file_contains(&script, "RMDir $INSTDIR\\app_settings\n");
    assert_eq!(
        artifact.package,
        Some(env.root.join("out/Viewer-3-4-1-2_Setup.exe"))
    );

    // The record round-trips for `show`.
    assert_eq!(outcome.record, env.root.join("out/manifest.json"));
    let record = Manifest::load(&outcome.record).unwrap();
    assert_eq!(record, outcome.manifest);
}

#[test]
fn test_build_command_dry_run_stages_nothing() {
    let env = TestEnv::new();
    create_windows_tree(&env);
    let rules = write_rules(&env, WINDOWS_RULES);
    let config = config_for(&env, Platform::Windows, &[]);

    let outcome = cmd_build(
        &config,
        &BuildOptions {
            rules: Some(rules),
            actions: vec![],
            tool_timeout: None,
        },
    )
    .unwrap();

    assert_eq!(outcome.manifest.len(), 3);
    assert_eq!(outcome.manifest.staged().count(), 0);
    assert!(outcome.artifact.is_none());
    assert_not_exists(&env.staging);

    // Nothing to install, but the uninstaller still knows every file.
    assert!(install_fragment(outcome.manifest.pairs()).is_empty());
    let deletes = uninstall_fragment(outcome.manifest.pairs())
        .into_iter()
        .filter(|d| matches!(d, Directive::DeleteFile(_)))
        .count();
    assert_eq!(deletes, 3);
}

#[test]
fn test_build_command_link_staging() {
    let env = TestEnv::new();
    create_windows_tree(&env);
    let config = config_for(&env, Platform::Windows, &[("STAGEPACK_LINK", "1")]);

    let outcome = cmd_build(
        &config,
        &BuildOptions {
            rules: Some(write_rules(&env, WINDOWS_RULES)),
            actions: vec![Action::Copy],
            tool_timeout: None,
        },
    )
    .unwrap();

    assert_eq!(outcome.manifest.staged().count(), 3);
    assert!(outcome.artifact.is_none());
    assert_file_contains(&env.staged("Viewer.exe"), "Release/viewer-bin.exe");
    assert_file_contains(&env.staged("llcommon.dll"), "dll");
}

#[test]
fn test_build_command_rejects_package_without_copy() {
    let env = TestEnv::new();
    create_windows_tree(&env);
    let config = config_for(&env, Platform::Windows, &[]);

    let err = cmd_build(
        &config,
        &BuildOptions {
            rules: Some(write_rules(&env, WINDOWS_RULES)),
            actions: vec![Action::Package],
            tool_timeout: None,
        },
    )
    .unwrap_err();

    assert!(err.to_string().contains("package action"));
}

#[test]
fn test_build_command_reports_missing_template_after_staging() {
    let env = TestEnv::new();
    create_windows_tree(&env);
    fs::remove_file(env.source.join("installers/windows/installer_template.nsi")).unwrap();
    let config = config_for(&env, Platform::Windows, &[("STAGEPACK_MAKENSIS", "true")]);

    let err = cmd_build(
        &config,
        &BuildOptions {
            rules: Some(write_rules(&env, WINDOWS_RULES)),
            actions: vec![Action::Copy, Action::Package],
            tool_timeout: None,
        },
    )
    .unwrap_err();

    assert!(format!("{:#}", err).contains("installer_template.nsi"));
    // Staged output and the record are kept for diagnosis.
    assert_file_exists(&env.staged("Viewer.exe"));
    assert_file_exists(&env.root.join("out/manifest.json"));
}

#[test]
fn test_build_command_invalid_rule_file() {
    let env = TestEnv::new();
    let config = config_for(&env, Platform::Windows, &[]);

    let err = cmd_build(
        &config,
        &BuildOptions {
            rules: Some(write_rules(&env, "[{\"op\": \"teleport\"}]")),
            actions: vec![],
            tool_timeout: None,
        },
    )
    .unwrap_err();

    assert!(format!("{:#}", err).contains("invalid JSON"));
}

#[cfg(unix)]
#[test]
fn test_build_command_linux_archive() {
    if !stagepack::process::exists("tar") || !stagepack::process::exists("bzip2") {
        eprintln!("skipping: tar/bzip2 not available");
        return;
    }
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::new();
    env.source_file("linux_tools/wrapper.sh");
    env.source_file("linux_tools/install.sh");
    env.source_file("viewer-bin");
    let rules = write_rules(
        &env,
        r#"[
            {"op": "push_prefix", "src": "linux_tools", "dst": ""},
            {"op": "select", "pattern": "wrapper.sh", "dst": "viewer"},
            {"op": "select", "pattern": "install.sh"},
            {"op": "pop_prefix", "src": "linux_tools"},
            {"op": "select", "pattern": "viewer-bin", "dst": "bin/do-not-directly-run-viewer-bin"}
        ]"#,
    );
    let config = config_for(&env, Platform::LinuxX86_64, &[]);

    let outcome = cmd_build(
        &config,
        &BuildOptions {
            rules: Some(rules),
            actions: vec![Action::Copy, Action::Package],
            tool_timeout: Some(std::time::Duration::from_secs(60)),
        },
    )
    .unwrap();

    for script in ["viewer", "install.sh"] {
        let mode = fs::metadata(env.staged(script)).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "{} not executable", script);
    }
    let archive = outcome.artifact.unwrap().package.unwrap();
    assert_eq!(archive, env.root.join("out/Viewer_3_4_1_2_x86_64.tar.bz2"));
    assert_file_exists(&archive);
}
