//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Resolve the manifest, stage files, finish the package
//! - `show` - Display configuration, the manifest record, or the script
//! - `clean` - Remove staged output

pub mod build;
pub mod clean;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use show::cmd_show;

use std::path::PathBuf;

use crate::config::Config;

/// File name of the staged-file record written next to the staging tree.
pub const MANIFEST_RECORD: &str = "manifest.json";

/// Where the manifest record of a build lives.
pub fn record_path(config: &Config) -> PathBuf {
    config.output_dir().join(MANIFEST_RECORD)
}
