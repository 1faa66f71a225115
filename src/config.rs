//! Configuration management for stagepack.
//!
//! Reads configuration from the environment. `main` loads a `.env` file
//! first (dotenvy), so real environment variables take precedence over it.
//! Command-line flags override both.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::channel::{Channel, Version};

/// Default installer template, relative to the source tree.
pub const DEFAULT_TEMPLATE: &str = "installers/windows/installer_template.nsi";

/// Default application name.
pub const DEFAULT_APP_NAME: &str = "Viewer";

/// Default channel name.
pub const DEFAULT_CHANNEL: &str = "Viewer Release";

/// Target platform of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Darwin,
    LinuxI686,
    LinuxX86_64,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Windows,
        Platform::Darwin,
        Platform::LinuxI686,
        Platform::LinuxX86_64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Darwin => "darwin",
            Platform::LinuxI686 => "linux-i686",
            Platform::LinuxX86_64 => "linux-x86_64",
        }
    }

    /// The platform this binary was built for.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Darwin
        } else if cfg!(target_arch = "x86") {
            Platform::LinuxI686
        } else {
            Platform::LinuxX86_64
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win" => Ok(Platform::Windows),
            "darwin" | "mac" | "macos" => Ok(Platform::Darwin),
            "linux-i686" | "linux" | "i686" => Ok(Platform::LinuxI686),
            "linux-x86_64" | "linux64" | "x86_64" => Ok(Platform::LinuxX86_64),
            other => bail!(
                "Unknown platform '{}'. Expected one of: windows, darwin, linux-i686, linux-x86_64",
                other
            ),
        }
    }
}

/// What a build run does after resolving the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Physically stage files into the destination tree.
    Copy,
    /// Run the platform's packaging finish.
    Package,
}

impl Action {
    /// Parse a comma-separated action list such as `copy,package`.
    pub fn parse_list(list: &str) -> Result<Vec<Action>> {
        let mut actions = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let action = match item {
                "copy" => Action::Copy,
                "package" => Action::Package,
                other => bail!("Unknown action '{}'. Expected copy or package", other),
            };
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        Ok(actions)
    }
}

/// Stagepack configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source (build) tree root.
    pub source: PathBuf,
    /// Destination (staging) tree root.
    pub dest: PathBuf,
    pub platform: Platform,
    /// Build configuration directory name.
    pub configuration: String,
    pub app_name: String,
    pub channel: String,
    pub default_channel: String,
    /// Grid name; empty for the default grid.
    pub grid: String,
    pub login_channel: Option<String>,
    pub version: String,
    /// Explicit installer file name; derived from the channel when unset.
    pub installer_name: Option<String>,
    /// Installer template path, relative to `source` unless absolute.
    pub template: PathBuf,
    /// Downgrade unmatched mandatory rules to warnings.
    pub permissive: bool,
    /// Hard-link staged files instead of copying them.
    pub link: bool,
    /// Installer compiler program.
    pub makensis: String,
    /// Command run on the finished installer, if any.
    pub sign: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Build configuration from a variable map, applying defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let platform = match get("STAGEPACK_PLATFORM") {
            Some(p) => p.parse()?,
            None => Platform::host(),
        };

        let permissive = match get("STAGEPACK_PERMISSIVE") {
            Some(v) => parse_bool(&v)?,
            None => false,
        };
        let link = match get("STAGEPACK_LINK") {
            Some(v) => parse_bool(&v)?,
            None => false,
        };

        Ok(Self {
            source: PathBuf::from(get("STAGEPACK_SOURCE").unwrap_or_else(|| ".".to_string())),
            dest: PathBuf::from(
                get("STAGEPACK_DEST").unwrap_or_else(|| "output/staging".to_string()),
            ),
            platform,
            configuration: get("STAGEPACK_CONFIGURATION").unwrap_or_else(|| "Release".to_string()),
            app_name: get("STAGEPACK_APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            channel: get("STAGEPACK_CHANNEL").unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            default_channel: get("STAGEPACK_DEFAULT_CHANNEL")
                .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            // Empty is meaningful here (default grid), so no filter.
            grid: vars
                .get("STAGEPACK_GRID")
                .map(|g| g.trim().to_string())
                .unwrap_or_default(),
            login_channel: get("STAGEPACK_LOGIN_CHANNEL"),
            version: get("STAGEPACK_VERSION").unwrap_or_else(|| "0.0.0.0".to_string()),
            installer_name: get("STAGEPACK_INSTALLER_NAME"),
            template: PathBuf::from(
                get("STAGEPACK_TEMPLATE").unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            ),
            permissive,
            link,
            makensis: get("STAGEPACK_MAKENSIS").unwrap_or_else(|| "makensis".to_string()),
            sign: get("STAGEPACK_SIGN"),
        })
    }

    pub fn channel(&self) -> Channel {
        Channel {
            app_name: self.app_name.clone(),
            name: self.channel.clone(),
            default_name: self.default_channel.clone(),
            grid: self.grid.clone(),
            login_channel: self.login_channel.clone(),
        }
    }

    pub fn version(&self) -> Version {
        Version::parse(&self.version)
    }

    /// Template path resolved against the source tree.
    pub fn template_path(&self) -> PathBuf {
        if self.template.is_absolute() {
            self.template.clone()
        } else {
            self.source.join(&self.template)
        }
    }

    /// Directory that holds the staged tree, the rendered script and the
    /// manifest record.
    pub fn output_dir(&self) -> PathBuf {
        output_dir_of(&self.dest)
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  STAGEPACK_SOURCE: {}", self.source.display());
        println!("  STAGEPACK_DEST: {}", self.dest.display());
        println!("  STAGEPACK_PLATFORM: {}", self.platform);
        println!("  STAGEPACK_CONFIGURATION: {}", self.configuration);
        println!("  STAGEPACK_APP_NAME: {}", self.app_name);
        println!("  STAGEPACK_CHANNEL: {}", self.channel);
        println!("  STAGEPACK_DEFAULT_CHANNEL: {}", self.default_channel);
        if self.grid.is_empty() {
            println!("  STAGEPACK_GRID: (default grid)");
        } else {
            println!("  STAGEPACK_GRID: {}", self.grid);
        }
        if let Some(login) = &self.login_channel {
            println!("  STAGEPACK_LOGIN_CHANNEL: {}", login);
        }
        println!("  STAGEPACK_VERSION: {}", self.version);
        if let Some(name) = &self.installer_name {
            println!("  STAGEPACK_INSTALLER_NAME: {}", name);
        }
        println!("  STAGEPACK_TEMPLATE: {}", self.template.display());
        println!("  STAGEPACK_PERMISSIVE: {}", self.permissive);
        println!("  STAGEPACK_LINK: {}", self.link);
        println!("  STAGEPACK_MAKENSIS: {}", self.makensis);
        match &self.sign {
            Some(sign) => println!("  STAGEPACK_SIGN: {}", sign),
            None => println!("  STAGEPACK_SIGN: (not set, installer will be unsigned)"),
        }
        if self.source.is_dir() {
            println!("  Source tree: FOUND");
        } else {
            println!("  Source tree: NOT FOUND");
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Expected a boolean, got '{}'", other),
    }
}

/// Parent of a staging tree, or `.` when it has none.
pub fn output_dir_of(staging: &Path) -> PathBuf {
    match staging.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
