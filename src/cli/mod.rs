//! CLI module
//!
//! Command-line interface for loading files into object storage.
//!
//! # Commands
//!
//! - `upload` - Stream a file into a destination as a multipart upload
//! - `check` - Validate a destination config

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{upload_parts, Runner};
