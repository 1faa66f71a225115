//! Install/uninstall fragment synthesis.
//!
//! Both fragments walk destinations in the same order: ascending by
//! (depth, path), then reversed. The walk therefore visits the deepest files
//! first and, within one depth, goes in descending path order. Installers
//! built from earlier releases rely on this exact order, so it is kept even
//! though directory creation does not need it.
//!
//! The synthesizer never looks at the filesystem; the manifest is its only
//! input.

use std::cmp::Ordering;

use super::Directive;
use crate::common::{ancestors, depth, parent_dir};
use crate::manifest::StagedPair;

/// Directives that create every staged file on the target machine.
///
/// One `SetOutputDirectory` per run of consecutive files sharing a
/// directory, one `CopyFile` per staged file, nothing for unstaged pairs.
pub fn install_fragment(pairs: &[StagedPair]) -> Vec<Directive> {
    let dests = walk_order(pairs.iter().filter(|p| p.staged).map(|p| p.dest.as_str()));

    let mut directives = Vec::with_capacity(dests.len() * 2);
    let mut out_dir: Option<&str> = None;
    for dest in dests {
        let dir = parent_dir(dest);
        if out_dir != Some(dir) {
            directives.push(Directive::SetOutputDirectory(dir.to_string()));
            out_dir = Some(dir);
        }
        directives.push(Directive::CopyFile(dest.to_string()));
    }
    directives
}

/// Directives that remove everything the manifest declares.
///
/// Every pair is deleted whether or not it was staged. Afterwards every
/// ancestor directory of every destination is removed, deepest first, so no
/// directory is targeted before its contents.
pub fn uninstall_fragment(pairs: &[StagedPair]) -> Vec<Directive> {
    let dests = walk_order(pairs.iter().map(|p| p.dest.as_str()));

    let mut directives: Vec<Directive> = dests
        .iter()
        .map(|dest| Directive::DeleteFile(dest.to_string()))
        .collect();

    let mut dirs: Vec<String> = dests
        .iter()
        .flat_map(|dest| ancestors(parent_dir(dest)))
        .collect();
    dirs.sort_by(|a, b| by_depth_then_path(a, b));
    dirs.reverse();
    dirs.dedup();

    directives.extend(dirs.into_iter().map(Directive::RemoveDirectory));
    directives
}

fn walk_order<'a>(dests: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut dests: Vec<&str> = dests.collect();
    dests.sort_by(|a, b| by_depth_then_path(a, b));
    dests.reverse();
    dests
}

fn by_depth_then_path(a: &str, b: &str) -> Ordering {
    depth(a).cmp(&depth(b)).then_with(|| a.cmp(b))
}
