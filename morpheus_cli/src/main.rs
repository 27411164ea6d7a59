//! Morpheus permissions CLI
//!

#![deny(missing_docs)]

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use morpheus_core::{
    config::{DecodeMode, ReconcileConfig},
    contains_subset,
    logging::{self, debug, info},
    reconcile::{decode_permissions, reconcile_permissions, Source},
};

use cmd::{MorpheusArgs, MorpheusCommand};

fn main() -> Result<()> {
    let args = MorpheusArgs::parse();
    logging::setup(args.log_level);

    match &args.command {
        MorpheusCommand::Check {
            superset,
            subset,
            mode,
        } => {
            let config = load_config(&args.config, *mode)?;
            check(superset, subset, &config)?;
        }
        MorpheusCommand::Reconcile {
            stored,
            server,
            mode,
        } => {
            let config = load_config(&args.config, *mode)?;
            reconcile(stored, server, &config)?;
        }
    }

    Ok(())
}

/// Read the explicit config file, or discover one in the working directory.
/// A `--mode` flag overrides whatever the file says.
fn load_config(path: &Option<PathBuf>, mode: Option<DecodeMode>) -> Result<ReconcileConfig> {
    let mut config = match path {
        Some(path) => ReconcileConfig::read_from_file(path)?,
        None => ReconcileConfig::discover(".")?,
    };
    if let Some(mode) = mode {
        config.mode = mode;
    }
    debug!("using config {:?}", config);
    Ok(config)
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))
}

fn check(superset: &Path, subset: &Path, config: &ReconcileConfig) -> Result<()> {
    let sup = decode_permissions(&read_document(superset)?, config)
        .with_context(|| format!("Decoding {}", superset.display()))?;
    let sub = decode_permissions(&read_document(subset)?, config)
        .with_context(|| format!("Decoding {}", subset.display()))?;

    match contains_subset(&sup, &sub) {
        Ok(()) => {
            println!(
                "{}",
                format!(
                    "✔ {} is contained in {}",
                    subset.display(),
                    superset.display()
                )
                .green()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "{}",
                format!(
                    "✘ {} is not contained in {}",
                    subset.display(),
                    superset.display()
                )
                .red()
            );
            Err(e.into())
        }
    }
}

fn reconcile(stored: &Path, server: &Path, config: &ReconcileConfig) -> Result<()> {
    let reconciled =
        reconcile_permissions(&read_document(stored)?, &read_document(server)?, config)?;

    match reconciled.source {
        Source::Stored => info!("keeping stored permissions from {}", stored.display()),
        Source::Server => info!("using server permissions from {}", server.display()),
    }
    if let Some(mismatch) = &reconciled.mismatch {
        eprintln!("{}", format!("~ {mismatch}").yellow());
    }

    println!("{}", reconciled.permissions.trim_end());
    Ok(())
}
