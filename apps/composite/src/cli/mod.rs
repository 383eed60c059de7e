//! # Composite CLI Module
//!
//! ## Available Commands
//!
//! - `check` - Build an assembly and report its size
//! - `get` - Read a property on one node
//! - `sum` - Sum a property over a node and its descendants
//! - `roots` - Show the composite roots above a node
//! - `show` - Show the composite state of one or all nodes

mod commands;

use clap::{Parser, Subcommand};
use composite::AssemblyError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Composite - aggregate properties over a multi-parent graph
///
/// Loads an assembly file (TOML, or JSON by extension), builds the graph and
/// answers questions about it.
#[derive(Parser, Debug)]
#[command(name = "composite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Graph configuration file (TOML); falls back to $COMPOSITE_CONFIG
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an assembly and report node and edge counts
    Check {
        /// Assembly file
        file: PathBuf,
    },

    /// Read a property on one node
    Get {
        /// Assembly file
        file: PathBuf,

        /// Node name
        #[arg(short, long)]
        node: String,

        /// Property name
        #[arg(short, long)]
        key: String,
    },

    /// Sum the integer contributions to a property
    Sum {
        /// Assembly file
        file: PathBuf,

        /// Node name
        #[arg(short, long)]
        node: String,

        /// Property name
        #[arg(short, long)]
        key: String,
    },

    /// Show the composite roots above a node
    Roots {
        /// Assembly file
        file: PathBuf,

        /// Node name
        #[arg(short, long)]
        node: String,
    },

    /// Show the composite state of a node (all nodes when omitted)
    Show {
        /// Assembly file
        file: PathBuf,

        /// Node name
        #[arg(short, long)]
        node: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AssemblyError> {
    let config = load_config(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Check { file } => cmd_check(&file, config, json_mode),
        Commands::Get { file, node, key } => cmd_get(&file, config, json_mode, &node, &key),
        Commands::Sum { file, node, key } => cmd_sum(&file, config, json_mode, &node, &key),
        Commands::Roots { file, node } => cmd_roots(&file, config, json_mode, &node),
        Commands::Show { file, node } => cmd_show(&file, config, json_mode, node.as_deref()),
    }
}
