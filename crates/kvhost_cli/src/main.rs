//! kvhost CLI
//!
//! Command-line checks for kvhost storage configurations.
//!
//! # Commands
//!
//! - `validate` - Validate a configuration and print its normalized form
//! - `probe` - Report the host platform and engine availability

mod commands;

use clap::{Parser, Subcommand};
use kvhost_core::{Configuration, Mode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// kvhost storage configuration tools.
#[derive(Parser)]
#[command(name = "kvhost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration and print it with defaults applied
    Validate {
        /// JSON configuration file (flags override its fields)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Instance id
        #[arg(long)]
        id: Option<String>,

        /// Root directory of the instance
        #[arg(long)]
        path: Option<PathBuf>,

        /// Encryption key (at most 16 bytes)
        #[arg(long)]
        encryption_key: Option<String>,

        /// Process mode (single-process, multi-process)
        #[arg(short, long, value_parser = commands::validate::parse_mode)]
        mode: Option<Mode>,

        /// Open the instance read-only
        #[arg(long)]
        read_only: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Report the host platform and whether a native engine can run
    Probe {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays machine readable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            config,
            id,
            path,
            encryption_key,
            mode,
            read_only,
            format,
        } => {
            let overrides = overrides_from_flags(id, path, encryption_key, mode, read_only);
            commands::validate::run(config.as_deref(), overrides, &format)?;
        }
        Commands::Probe { format } => {
            commands::probe::run(&format)?;
        }
        Commands::Version => {
            println!("kvhost CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("kvhost core v{}", kvhost_core::VERSION);
        }
    }

    Ok(())
}

/// Builds a configuration holding only the fields given on the command line.
fn overrides_from_flags(
    id: Option<String>,
    path: Option<PathBuf>,
    encryption_key: Option<String>,
    mode: Option<Mode>,
    read_only: bool,
) -> Configuration {
    let mut config = Configuration::new();
    if let Some(id) = id {
        config = config.with_id(id);
    }
    if let Some(path) = path {
        config = config.with_path(path);
    }
    if let Some(key) = encryption_key {
        config = config.with_encryption_key(key);
    }
    if let Some(mode) = mode {
        config = config.with_mode(mode);
    }
    // An absent flag leaves the file's value in place
    if read_only {
        config = config.with_read_only(true);
    }
    config
}
