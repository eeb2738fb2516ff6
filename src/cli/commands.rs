//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy Load CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-load")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Destination config file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file as one object
    Upload {
        /// Catalog file (YAML or JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Stream the object belongs to
        #[arg(long)]
        stream: String,

        /// File to upload
        #[arg(short, long)]
        input: PathBuf,

        /// Object key (default: `{prefix}/{stream}/dt={date}/{file name}`)
        #[arg(short, long)]
        key: Option<String>,

        /// Upload id shared by producers of the same object
        #[arg(long)]
        upload_id: Option<String>,

        /// Number of concurrent part workers (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Part size in bytes (overrides config)
        #[arg(long)]
        part_size: Option<usize>,
    },

    /// Validate the destination config
    Check,
}
