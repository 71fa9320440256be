//! Validate command implementation.

use kvhost_core::{Configuration, Mode, NormalizedConfiguration};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Normalized configuration as printed by the CLI. The key itself is
/// never shown.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ConfigurationSummary {
    /// Instance id.
    pub id: String,
    /// Root directory, if overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether an encryption key is set.
    pub encrypted: bool,
    /// Process mode.
    pub mode: Mode,
    /// Whether the instance is read-only.
    pub read_only: bool,
}

impl From<&NormalizedConfiguration> for ConfigurationSummary {
    fn from(config: &NormalizedConfiguration) -> Self {
        Self {
            id: config.id().to_string(),
            path: config.path().map(|p| p.display().to_string()),
            encrypted: config.is_encrypted(),
            mode: config.mode(),
            read_only: config.read_only(),
        }
    }
}

/// Parses a mode given on the command line.
pub fn parse_mode(value: &str) -> Result<Mode, String> {
    match value.to_ascii_lowercase().replace('_', "-").as_str() {
        "single-process" | "single" => Ok(Mode::SingleProcess),
        "multi-process" | "multi" => Ok(Mode::MultiProcess),
        _ => Err(format!(
            "unknown mode '{value}' (expected single-process or multi-process)"
        )),
    }
}

/// Reads the optional JSON file and lays `overrides` on top of it.
pub fn load_configuration(
    file: Option<&Path>,
    overrides: Configuration,
) -> Result<Configuration, Box<dyn std::error::Error>> {
    let base = match file {
        Some(path) => {
            info!("Reading configuration from {:?}", path);
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => Configuration::new(),
    };
    Ok(overrides.or(base))
}

/// Runs the validate command.
pub fn run(
    file: Option<&Path>,
    overrides: Configuration,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_configuration(file, overrides)?;
    let normalized = config.validate()?;
    let summary = ConfigurationSummary::from(&normalized);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            print_text_output(&summary);
        }
    }

    Ok(())
}

fn print_text_output(summary: &ConfigurationSummary) {
    println!("Configuration is valid");
    println!("  id:        {}", summary.id);
    println!(
        "  path:      {}",
        summary.path.as_deref().unwrap_or("(engine default)")
    );
    println!("  encrypted: {}", summary.encrypted);
    println!("  mode:      {}", summary.mode);
    println!("  read-only: {}", summary.read_only);
}
