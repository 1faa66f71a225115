//! Manifest builder - interprets a rule tree into staged pairs.
//!
//! This is the single place where rule operations are given meaning. The
//! evaluator owns the prefix stack and the exclusion set for the duration of
//! one pass; nothing about a pass outlives it except the returned manifest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::matcher::{has_wildcard, match_pattern, Exclusions, Match};
use super::prefix::{concat_pattern, PrefixStack};
use super::stage::Stager;
use super::{Manifest, Op, RuleTree, SelectionRule, StagedPair};
use crate::common::{join_rel, lexical_normalize};
use crate::error::{PackError, Result};

/// Paths and policy shared by one manifest pass.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Root the rule tree's source patterns are resolved against.
    pub source: PathBuf,
    /// Destination (staging) tree root.
    pub staging: PathBuf,
    /// Downgrade mandatory rules that match nothing to a logged skip.
    pub permissive: bool,
    /// Outputs that must never be selected back in. The staging tree is
    /// always one of them.
    pub pruned: Vec<PathBuf>,
}

impl BuildContext {
    /// Create a build context. The source tree must exist.
    pub fn new(source: &Path, staging: &Path) -> Result<Self> {
        let source = absolute(source)?;
        if !source.is_dir() {
            return Err(PackError::io(
                &source,
                std::io::Error::new(std::io::ErrorKind::NotFound, "source tree not found"),
            ));
        }
        let staging = absolute(staging)?;
        Ok(Self {
            source,
            pruned: vec![staging.clone()],
            staging,
            permissive: false,
        })
    }

    /// Keep `path` (a file or a directory) out of every selection.
    pub fn with_pruned(mut self, path: &Path) -> Result<Self> {
        self.pruned.push(absolute(path)?);
        Ok(self)
    }

    /// Set permissive mode.
    pub fn with_permissive(mut self, permissive: bool) -> Self {
        self.permissive = permissive;
        self
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(lexical_normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|e| PackError::io(path, e))?;
    Ok(lexical_normalize(&cwd.join(path)))
}

/// Evaluate `tree` against the source tree, staging every resolved file.
///
/// The pass either completes with a balanced prefix stack or fails as a
/// whole; on failure no manifest is returned.
pub fn build_manifest(ctx: &BuildContext, tree: &RuleTree, stager: &dyn Stager) -> Result<Manifest> {
    info!(
        source = %ctx.source.display(),
        staging = %ctx.staging.display(),
        stager = stager.name(),
        ops = tree.len(),
        "building manifest"
    );

    let mut builder = ManifestBuilder::new(ctx, stager);
    for op in tree.ops() {
        builder.apply(op)?;
    }
    builder.finish()
}

struct ManifestBuilder<'a> {
    ctx: &'a BuildContext,
    stager: &'a dyn Stager,
    stack: PrefixStack,
    exclusions: Exclusions,
    pairs: Vec<StagedPair>,
    /// Destination -> index into `pairs`.
    index: HashMap<String, usize>,
}

impl<'a> ManifestBuilder<'a> {
    fn new(ctx: &'a BuildContext, stager: &'a dyn Stager) -> Self {
        let mut exclusions = Exclusions::new();
        for path in &ctx.pruned {
            exclusions.prune(path);
        }
        Self {
            ctx,
            stager,
            stack: PrefixStack::new(&ctx.source),
            exclusions,
            pairs: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn apply(&mut self, op: &Op) -> Result<()> {
        match op {
            Op::Select(rule) => self.select(rule)?,

            Op::Exclude { pattern } => {
                debug!(pattern = %pattern, "exclude");
                self.exclusions.add(pattern)?;
            }

            Op::WriteFile { dst, content } => {
                let dest = join_rel(self.stack.current().dst, dst);
                let target = self.ctx.staging.join(&dest);
                let staged = self
                    .stager
                    .write(&target, content)
                    .map_err(|e| PackError::io(&target, e))?;
                self.record(target, dest, staged);
            }

            Op::PushPrefix { src, dst } => {
                self.stack.push(src, dst);
                debug!(src = %src, dst = %dst, depth = self.stack.depth(), "push prefix");
            }

            Op::PopPrefix { src } => {
                self.stack.pop(src)?;
                debug!(src = %src, depth = self.stack.depth(), "pop prefix");
            }
        }
        Ok(())
    }

    fn select(&mut self, rule: &SelectionRule) -> Result<()> {
        let prefix = self.stack.current();
        let base = prefix.base.to_path_buf();
        let src_prefix = prefix.src.to_string();
        let dst_prefix = prefix.dst.to_string();
        let pattern = concat_pattern(&src_prefix, &rule.pattern);

        let optional = rule.optional;
        let matches = match match_pattern(&base, &pattern, &self.exclusions, optional) {
            Ok(matches) => matches,
            Err(PackError::MissingSource { .. }) if self.ctx.permissive => {
                warn!(pattern = %pattern, base = %base.display(), "no files matched, skipping");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if matches.is_empty() {
            debug!(pattern = %pattern, "optional rule matched nothing");
            return Ok(());
        }

        for m in matches {
            let dest = destination(&src_prefix, &dst_prefix, rule, &m)?;
            if dest.is_empty() {
                return Err(PackError::Pattern {
                    pattern: rule.pattern.clone(),
                    message: "destination resolves to the install root".to_string(),
                });
            }
            let source = lexical_normalize(&m.path);
            let target = self.ctx.staging.join(&dest);
            let staged = self
                .stager
                .stage(&source, &target)
                .map_err(|e| PackError::io(&source, e))?;
            self.record(source, dest, staged);
        }
        Ok(())
    }

    /// Record a pair. A later rule for the same destination replaces the
    /// earlier one in place.
    fn record(&mut self, source: PathBuf, dest: String, staged: bool) {
        debug!(src = %source.display(), dst = %dest, staged, "staged");
        let pair = StagedPair {
            source,
            dest: dest.clone(),
            staged,
        };
        match self.index.get(&dest) {
            Some(&i) => {
                debug!(dst = %dest, "destination selected again, last rule wins");
                self.pairs[i] = pair;
            }
            None => {
                self.index.insert(dest, self.pairs.len());
                self.pairs.push(pair);
            }
        }
    }

    fn finish(self) -> Result<Manifest> {
        self.stack.finish()?;
        let staged = self.pairs.iter().filter(|p| p.staged).count();
        info!(files = self.pairs.len(), staged, "manifest complete");
        Ok(Manifest::from_pairs(self.pairs))
    }
}

/// Work out where a match lands.
///
/// The match components line up with `src_prefix` followed by the rule
/// pattern; anything after that is the part below a recursively selected
/// directory. Wildcards in a destination take the text their source-side
/// counterparts matched, in order.
fn destination(
    src_prefix: &str,
    dst_prefix: &str,
    rule: &SelectionRule,
    m: &Match,
) -> Result<String> {
    let prefix_parts = components(src_prefix);
    let split = prefix_parts.len().min(m.components.len());
    let (matched_prefix, matched_rest) = m.components.split_at(split);
    let dst_prefix = expand_wildcards(dst_prefix, &prefix_parts, matched_prefix)?;

    Ok(match &rule.dst {
        None => join_rel(&dst_prefix, &matched_rest.join("/")),
        Some(dst) => {
            let rule_parts = components(&rule.pattern);
            let split = rule_parts.len().min(matched_rest.len());
            let (matched_rule, below) = matched_rest.split_at(split);
            let dst = expand_wildcards(dst, &rule_parts, matched_rule)?;
            join_rel(&join_rel(&dst_prefix, &dst), &below.join("/"))
        }
    })
}

fn components(pattern: &str) -> Vec<&str> {
    pattern
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

/// Fails when `target` has more wildcards than the source side matched;
/// a literal `*` never reaches the staging tree.
fn expand_wildcards(target: &str, pattern_parts: &[&str], matched: &[String]) -> Result<String> {
    let mut values = pattern_parts
        .iter()
        .zip(matched)
        .filter(|(p, _)| has_wildcard(p))
        .map(|(_, m)| m.as_str());

    let parts = target
        .split('/')
        .map(|part| {
            if !has_wildcard(part) {
                return Ok(part);
            }
            values.next().ok_or_else(|| PackError::Pattern {
                pattern: target.to_string(),
                message: "destination has more wildcards than the source pattern".to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}
