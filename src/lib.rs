//! stagepack library exports.
//!
//! The binary is a thin CLI over these modules; integration tests drive them
//! directly.

pub mod artifact;
pub mod channel;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod manifest;
pub mod process;
pub mod script;
pub mod template;
pub mod timing;

pub use error::{PackError, Result};
