//! # tenc CLI Module
//!
//! This module implements the CLI interface for tenc.
//!
//! ## Available Commands
//!
//! - `convert` - Convert input files into a sealed archive
//! - `serialize` - Prune an archive and restate it in an output format
//! - `status` - Show the shape of an archive
//! - `index` - Print one index table of an archive
//! - `list` - List available readers and encoders
//! - `init` - Write the default configuration file
//! - `hash` - Compute the BLAKE3 digest of an archive

mod commands;

use crate::config::{DEFAULT_CONFIG_FILE, TencConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tenc_core::TencError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// tenc - convert large multigraphs to adjacency tensors
///
/// Interns weighted triples into a sealed archive of integer subscripts and
/// index tables, then exports it with min-count pruning applied.
#[derive(Parser, Debug)]
#[command(name = "tenc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short = 'c', long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert input files into an archive
    Convert {
        /// Input files (standard input if none are given)
        #[arg(short, long = "file", num_args = 1..)]
        files: Vec<PathBuf>,

        /// Input format (see `tenc list`)
        #[arg(short, long)]
        input_format: Option<String>,

        /// Base name of the archive
        #[arg(short, long)]
        name: Option<String>,

        /// Prefix prepended to output file names
        #[arg(short, long)]
        prefix: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Prune an archive and write it in an output format
    Serialize {
        /// Path to the archive
        #[arg(short, long)]
        archive: PathBuf,

        /// Output format (see `tenc list`)
        #[arg(short = 't', long)]
        format: String,

        /// Entities with at most this many occurrences are pruned
        #[arg(long, allow_negative_numbers = true)]
        min_count_ent: Option<i64>,

        /// Predicates with at most this many occurrences are pruned
        #[arg(long, allow_negative_numbers = true)]
        min_count_pred: Option<i64>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show the shape of an archive
    Status {
        /// Path to the archive
        #[arg(short, long)]
        archive: PathBuf,
    },

    /// Print an index table (entities and predicates pruned per config)
    Index {
        /// Path to the archive
        #[arg(short, long)]
        archive: PathBuf,

        /// entities, predicates, entity-attributes or predicate-attributes
        #[arg(short, long, default_value = "entities")]
        kind: String,
    },

    /// List available readers and encoders
    List,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Compute BLAKE3 digest of an archive
    Hash {
        /// Path to the archive
        #[arg(short, long)]
        archive: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), TencError> {
    let json_mode = cli.json_mode;

    let Some(command) = cli.command else {
        // No subcommand - list readers and encoders by default
        return cmd_list(json_mode);
    };

    if let Commands::Init { force } = command {
        return cmd_init(&cli.config, force);
    }

    let config = TencConfig::load(&cli.config)?;
    match command {
        Commands::Convert {
            files,
            input_format,
            name,
            prefix,
            output_dir,
        } => {
            let options = ConvertOptions {
                input_format: input_format.unwrap_or_else(|| config.convert.input_format.clone()),
                name: name.unwrap_or_else(|| config.convert.name.clone()),
                prefix: prefix.or_else(|| config.convert.prefix.clone()),
                output_dir: output_dir.unwrap_or_else(|| config.convert.output_dir.clone()),
            };
            cmd_convert(&config, &options, &files, json_mode)
        }
        Commands::Serialize {
            archive,
            format,
            min_count_ent,
            min_count_pred,
            output_dir,
        } => {
            let min_counts = config.prune.min_counts(min_count_ent, min_count_pred);
            let output_dir = output_dir.unwrap_or_else(|| config.convert.output_dir.clone());
            cmd_serialize(&archive, &format, min_counts, &output_dir, json_mode)
        }
        Commands::Status { archive } => cmd_status(&archive, &config, json_mode),
        Commands::Index { archive, kind } => cmd_index(&archive, &kind, &config, json_mode),
        Commands::List => cmd_list(json_mode),
        Commands::Hash { archive } => cmd_hash(&archive, json_mode),
        Commands::Init { force } => cmd_init(&cli.config, force),
    }
}
