//! Commands for the Morpheus permissions CLI
//!

use std::path::PathBuf;

use clap::{self, Parser, Subcommand};

use morpheus_core::{config::DecodeMode, logging::LevelFilter};

/// Morpheus permissions CLI: compare and reconcile role permission documents
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
pub(crate) struct MorpheusArgs {
    #[clap(subcommand)]
    pub(crate) command: MorpheusCommand,
    #[clap(global = true, short = 'v', long)]
    pub(crate) log_level: Option<LevelFilter>,
    /// Config file to use instead of ./morpheus_config.yaml
    #[clap(global = true, short, long)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum MorpheusCommand {
    /// Check whether SUBSET is contained in SUPERSET
    Check {
        /// The fuller, reference document
        superset: PathBuf,
        /// The partial document being checked
        subset: PathBuf,
        /// How to decode both documents (typed or generic)
        #[clap(short, long)]
        mode: Option<DecodeMode>,
    },
    /// Print the permission document that should become current state
    Reconcile {
        /// The locally stored declaration
        #[clap(long)]
        stored: PathBuf,
        /// The document the server returned
        #[clap(long)]
        server: PathBuf,
        /// How to decode both documents (typed or generic)
        #[clap(short, long)]
        mode: Option<DecodeMode>,
    },
}
