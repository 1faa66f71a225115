//! Channel, grid and version strings used by the installer.
//!
//! The channel name decides the executable name, the icon set and the launch
//! flags baked into the package. A channel or grid other than the default
//! gets its own settings file so side-by-side installs do not share state.

use std::fmt;

use crate::template::Substitutions;

/// Helper URI template for non-default grids; `{grid}` is replaced.
const HELPER_URI: &str = "http://preview-{grid}.secondlife.com/helpers/";

/// A dotted version such as `3.4.1.26738`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: Vec<String>,
}

impl Version {
    pub fn parse(text: &str) -> Self {
        let parts = text
            .trim()
            .split(['.', '-', '_'])
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Self { parts }
    }

    /// `3.4.1.26738`
    pub fn dotted(&self) -> String {
        self.parts.join(".")
    }

    /// All but the last component: `3.4.1`
    pub fn short(&self) -> String {
        let end = self.parts.len().saturating_sub(1);
        self.parts[..end].join(".")
    }

    /// `3-4-1-26738`
    pub fn dashed(&self) -> String {
        self.parts.join("-")
    }

    /// `3_4_1_26738`
    pub fn underscored(&self) -> String {
        self.parts.join("_")
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Channel and grid identity of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Application name, e.g. `Kokua`.
    pub app_name: String,
    /// Channel name, e.g. `Kokua Release`.
    pub name: String,
    /// The channel name that counts as the default channel.
    pub default_name: String,
    /// Target grid; empty for the default grid.
    pub grid: String,
    /// Channel reported at login, if different from `name`.
    pub login_channel: Option<String>,
}

impl Channel {
    pub fn is_default_channel(&self) -> bool {
        self.name == self.default_name
    }

    pub fn is_default_grid(&self) -> bool {
        self.grid.is_empty()
    }

    /// Channel name without the application name: `Kokua Beta` -> `Beta`.
    pub fn unique(&self) -> String {
        self.name.replace(&self.app_name, "").trim().to_string()
    }

    /// [`Channel::unique`] with whitespace removed.
    pub fn oneword(&self) -> String {
        self.unique().split_whitespace().collect()
    }

    pub fn lowerword(&self) -> String {
        self.oneword().to_lowercase()
    }

    fn app_lower(&self) -> String {
        self.app_name.split_whitespace().collect::<String>().to_lowercase()
    }

    /// Source directory of the channel's icon set.
    pub fn icon_path(&self) -> String {
        let channel = self.lowerword();
        let app = self.app_lower();
        let set = match channel.as_str() {
            "release" | "development" => channel.clone(),
            "betaviewer" => "beta".to_string(),
            c if c.starts_with("project") => "project".to_string(),
            _ => app,
        };
        format!("icons/{}", set)
    }

    /// Command-line flags the launcher passes to the viewer.
    pub fn flags(&self) -> String {
        let grid_flags = if self.is_default_grid() {
            String::new()
        } else {
            format!(
                "--grid {} --helperuri {}",
                self.grid,
                HELPER_URI.replace("{grid}", &self.grid)
            )
        };

        let channel_flags = match &self.login_channel {
            Some(login) if *login != self.name => format!("--channel \"{}\"", login),
            _ if !self.is_default_channel() => format!("--channel \"{}\"", self.name),
            _ => String::new(),
        };

        let setting_flags = if self.is_default_channel() && self.is_default_grid() {
            String::new()
        } else if self.is_default_grid() {
            format!("--settings settings_{}_{}.xml", self.lowerword(), self.app_lower())
        } else {
            format!("--settings settings_{}_{}.xml", self.grid, self.lowerword())
        };

        [channel_flags, grid_flags, setting_flags]
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Name of the installed executable on Windows.
    pub fn final_exe(&self) -> String {
        if self.is_default_channel() {
            format!("{}.exe", self.app_name.split_whitespace().collect::<String>())
        } else {
            format!("{}.exe", self.name.split_whitespace().collect::<String>())
        }
    }

    fn app_oneword(&self) -> String {
        self.app_name.split_whitespace().collect()
    }

    /// Installer file name, unless overridden by configuration.
    pub fn installer_file(&self, version: &Version) -> String {
        let app = self.app_oneword();
        if !self.is_default_channel() {
            format!("{}_{}_{}_Setup.exe", app, version.dashed(), self.oneword())
        } else if self.is_default_grid() {
            format!("{}-{}_Setup.exe", app, version.dashed())
        } else {
            format!(
                "{}-{}_({})_Setup.exe",
                app,
                version.dashed(),
                self.grid.to_uppercase()
            )
        }
    }

    /// NSIS `!define` block naming the install, shortcut and output file.
    pub fn grid_vars(&self, installer_file: &str) -> String {
        let flags = nsis_escape(&self.flags());
        let app = self.app_oneword();
        let mut lines = vec![
            format!("OutFile \"{}\"", installer_file),
            format!("!define INSTFLAGS \"{}\"", flags),
        ];
        if !self.is_default_channel() {
            lines.push(format!("!define INSTNAME   \"{}{}\"", app, self.oneword()));
            lines.push(format!("!define SHORTCUT   \"{}\"", self.name));
            lines.push(format!("!define URLNAME   \"{}\"", self.app_lower()));
            lines.push("!define UNINSTALL_SETTINGS 1".to_string());
            lines.push(format!("Caption \"{} ${{VERSION}}\"", self.name));
        } else if self.is_default_grid() {
            lines.push(format!("!define INSTNAME   \"{}\"", app));
            lines.push(format!("!define SHORTCUT   \"{}\"", self.app_name));
            lines.push(format!("!define URLNAME   \"{}\"", self.app_lower()));
            lines.push(format!("Caption \"{} ${{VERSION}}\"", self.app_name));
        } else {
            let grid_caps = self.grid.to_uppercase();
            lines.push(format!("!define INSTNAME   \"{}{}\"", app, grid_caps));
            lines.push(format!("!define SHORTCUT   \"{} ({})\"", self.app_name, grid_caps));
            lines.push(format!("!define URLNAME   \"{}{}\"", self.app_lower(), self.grid));
            lines.push("!define UNINSTALL_SETTINGS 1".to_string());
            lines.push(format!("Caption \"{} {} ${{VERSION}}\"", self.app_name, self.grid));
        }
        lines.join("\n") + "\n"
    }

    /// Named strings available to installer templates.
    pub fn substitutions(&self, version: &Version) -> Substitutions {
        let mut map = Substitutions::new();
        map.insert("APP_NAME".into(), self.app_name.clone());
        map.insert("VERSION_LONG".into(), version.dotted());
        map.insert("VERSION_SHORT".into(), version.short());
        map.insert("VERSION_DASHES".into(), version.dashed());
        map.insert("FINAL_EXE".into(), self.final_exe());
        map.insert("GRID".into(), self.grid.clone());
        map.insert("GRID_CAPS".into(), self.grid.to_uppercase());
        map.insert("FLAGS".into(), nsis_escape(&self.flags()));
        map.insert("CHANNEL".into(), self.name.clone());
        map.insert("CHANNEL_ONEWORD".into(), self.oneword());
        map.insert("CHANNEL_UNIQUE".into(), self.unique());
        map
    }
}

/// NSIS does not cope with bare quotes inside defines.
pub fn nsis_escape(text: &str) -> String {
    text.replace('"', "$\\\"")
}
