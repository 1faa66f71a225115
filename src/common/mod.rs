//! Shared utilities across stagepack modules.

pub mod files;
pub mod paths;

pub use files::{ensure_parent_exists, make_executable, write_file_with_dirs};
pub use paths::{ancestors, depth, join_rel, lexical_normalize, normalize_rel, parent_dir};
