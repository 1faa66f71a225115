//! Build command - resolves the manifest, stages files and finishes the package.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::MANIFEST_RECORD;
use crate::artifact::{self, Artifact, PackageSettings};
use crate::config::{Action, Config};
use crate::manifest::definitions::{rules_for, RuleSettings};
use crate::manifest::{
    build_manifest, BuildContext, CopyStager, DryRun, LinkStager, Manifest, RuleTree, Stager,
};
use crate::timing::Timer;

/// Options that only exist on the command line.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// JSON rule file replacing the built-in platform rules.
    pub rules: Option<PathBuf>,
    pub actions: Vec<Action>,
    /// Kill external tools after this long.
    pub tool_timeout: Option<Duration>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            rules: None,
            actions: vec![Action::Copy, Action::Package],
            tool_timeout: None,
        }
    }
}

/// What a build produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub manifest: Manifest,
    /// Path of the saved manifest record.
    pub record: PathBuf,
    /// Present when the package action ran.
    pub artifact: Option<Artifact>,
}

/// Execute the build command.
pub fn cmd_build(config: &Config, options: &BuildOptions) -> Result<BuildOutcome> {
    let copy = options.actions.contains(&Action::Copy);
    let package = options.actions.contains(&Action::Package);
    if package && !copy {
        bail!("The package action needs staged files. Use --actions copy,package");
    }

    info!(platform = %config.platform, channel = %config.channel, "building package");

    let tree = load_rules(config, options.rules.as_deref())?;
    let mut ctx = BuildContext::new(&config.source, &config.dest)
        .with_context(|| format!("Cannot use source tree {}", config.source.display()))?
        .with_permissive(config.permissive);
    let settings = PackageSettings::new(config, &ctx.source, &ctx.staging, options.tool_timeout);
    let record = settings.output_dir.join(MANIFEST_RECORD);

    // Outputs of earlier runs may sit inside the source tree.
    let outputs = artifact::outputs(config.platform, &settings);
    for output in std::iter::once(&record).chain(&outputs) {
        ctx = ctx.with_pruned(output)?;
    }

    let stager: &dyn Stager = match (copy, config.link) {
        (false, _) => &DryRun,
        (true, false) => &CopyStager,
        (true, true) => &LinkStager,
    };

    let timer = Timer::start("Manifest");
    let manifest = build_manifest(&ctx, &tree, stager).context("Manifest pass failed")?;
    timer.finish();

    manifest
        .save(&record)
        .context("Failed to write manifest record")?;
    info!(record = %record.display(), files = manifest.len(), "manifest recorded");

    let artifact = if package {
        let timer = Timer::start("Package");
        let artifact = artifact::finish(config.platform, &settings, &manifest)
            .with_context(|| format!("Packaging for {} failed", config.platform))?;
        timer.finish();
        Some(artifact)
    } else {
        None
    };

    print_summary(&manifest, artifact.as_ref());
    Ok(BuildOutcome {
        manifest,
        record,
        artifact,
    })
}

/// The rule tree for this build: a rule file when given, otherwise the
/// built-in definitions for the configured platform.
pub fn load_rules(config: &Config, rules: Option<&Path>) -> Result<RuleTree> {
    let tree = match rules {
        Some(path) => RuleTree::from_json_file(path)
            .with_context(|| format!("Failed to load rule file {}", path.display()))?,
        None => {
            let channel = config.channel();
            let settings = RuleSettings {
                configuration: &config.configuration,
                channel: &channel,
            };
            rules_for(config.platform, &settings)
        }
    };
    if !tree.is_balanced() {
        // Evaluation reports exactly which prefix is wrong.
        warn!("rule tree has unbalanced prefixes");
    }
    Ok(tree)
}

fn print_summary(manifest: &Manifest, artifact: Option<&Artifact>) {
    let staged = manifest.staged().count();
    println!();
    println!("=== Build Complete ===");
    println!("  Files:  {} ({} staged)", manifest.len(), staged);
    if let Some(artifact) = artifact {
        if let Some(script) = &artifact.script {
            println!("  Script: {}", script.display());
        }
        if let Some(package) = &artifact.package {
            println!("  Output: {}", package.display());
        }
    }
}
