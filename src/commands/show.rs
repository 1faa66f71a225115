//! Show command - displays information.

use anyhow::{bail, Context, Result};

use super::record_path;
use crate::config::Config;
use crate::manifest::Manifest;
use crate::script::nsis::NsisRenderer;
use crate::script::{install_fragment, uninstall_fragment};

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// Show the staged-file record of the last build
    Manifest,
    /// Show the install/uninstall script fragments of the last build
    Script,
}

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => config.print(),
        ShowTarget::Manifest => {
            let manifest = load_record(config)?;
            for pair in manifest.pairs() {
                let marker = if pair.staged { ' ' } else { '?' };
                println!("{} {} <- {}", marker, pair.dest, pair.source.display());
            }
            println!();
            println!(
                "{} files, {} staged",
                manifest.len(),
                manifest.staged().count()
            );
        }
        ShowTarget::Script => {
            let manifest = load_record(config)?;
            let renderer = NsisRenderer::new(&config.dest);
            println!("; install");
            print!("{}", renderer.render(&install_fragment(manifest.pairs())));
            println!("; uninstall");
            print!("{}", renderer.render(&uninstall_fragment(manifest.pairs())));
        }
    }
    Ok(())
}

fn load_record(config: &Config) -> Result<Manifest> {
    let path = record_path(config);
    if !path.exists() {
        bail!(
            "No manifest record at {}. Run 'stagepack build' first.",
            path.display()
        );
    }
    Manifest::load(&path).with_context(|| format!("Failed to read {}", path.display()))
}
