//! Shared test utilities for stagepack tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use stagepack::channel::Channel;
use stagepack::manifest::BuildContext;

/// Test environment laid out like a viewer checkout:
///
/// ```text
/// <root>/scripts/...         shared message templates
/// <root>/indra/newview/      source tree (build output of the viewer)
/// <root>/indra/packages/     third-party libraries
/// <root>/out/staging/        destination tree
/// ```
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub source: PathBuf,
    pub staging: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let source = root.join("indra/newview");
        let staging = root.join("out/staging");
        fs::create_dir_all(&source).expect("Failed to create source dir");

        Self {
            _temp_dir: temp_dir,
            root,
            source,
            staging,
        }
    }

    pub fn build_context(&self) -> BuildContext {
        BuildContext::new(&self.source, &self.staging).expect("Failed to create build context")
    }

    /// Create a file relative to the source tree.
    pub fn source_file(&self, rel: &str) -> PathBuf {
        let path = self.source.join(rel);
        create_file(&path, rel);
        path
    }

    /// Path inside the staging tree.
    pub fn staged(&self, rel: &str) -> PathBuf {
        self.staging.join(rel)
    }
}

/// Create a file (and its parents) holding `content`.
pub fn create_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Default-channel viewer identity used across tests.
pub fn release_channel() -> Channel {
    Channel {
        app_name: "Viewer".to_string(),
        name: "Viewer Release".to_string(),
        default_name: "Viewer Release".to_string(),
        grid: String::new(),
        login_channel: None,
    }
}

/// Create a partial viewer build tree: enough for the shared rules and the
/// Linux launcher rules to find something in every section.
pub fn create_mock_viewer_tree(env: &TestEnv) {
    create_file(
        &env.root.join("scripts/messages/message_template.msg"),
        "version 2.0",
    );
    create_file(&env.root.join("etc/message.xml"), "<llsd/>");

    for rel in [
        "app_settings/settings.xml",
        "app_settings/logcontrol.xml",
        "app_settings/logcontrol-dev.xml",
        "app_settings/CA.pem",
        "app_settings/viewer.ini",
        "app_settings/shaders/class1/deferred/fullbrightF.glsl",
        "app_settings/shaders/.svn/entries",
        "app_settings/windlight/days/Default.xml",
        "character/avatar_lad.xml",
        "character/avatar_eye.llm",
        "character/head_color.tga",
        "fonts/DejaVuSans.ttf",
        "skins/paths.xml",
        "skins/default/colors.xml",
        "skins/default/xui/en/panel_login.xml",
        "skins/default/textures/textures.xml",
        "skins/default/textures/icons/Inv_Object.png",
        "skins/default/html/en-us/loading/loading.html",
        "gpu_table.txt",
        "featuretable_linux.txt",
        "licenses-linux.txt",
        "linux_tools/wrapper.sh",
        "linux_tools/install.sh",
        "linux_tools/client-readme.txt",
        "viewer-bin",
        "icons/release/viewer_icon.png",
        "icons/release/viewer_icon.BMP",
    ] {
        env.source_file(rel);
    }

    create_file(
        &env
            .root
            .join("indra/viewer_components/updater/scripts/linux/update_install"),
        "#!/bin/sh\n",
    );
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.is_file(), "Expected file to exist: {}", path.display());
}

/// Assert that a path does not exist.
pub fn assert_not_exists(path: &Path) {
    assert!(!path.exists(), "Expected no file at: {}", path.display());
}

/// Assert that a file contains expected content.
pub fn assert_file_contains(path: &Path, expected: &str) {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
    assert!(
        content.contains(expected),
        "File {} does not contain expected content.\nExpected to find: {}\nActual content: {}",
        path.display(),
        expected,
        content
    );
}
