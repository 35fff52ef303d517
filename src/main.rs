//! iniremap - remap 3DMigoto mod `.ini` files to other character variants
//!
//! Usage:
//!   iniremap [OPTIONS] <FILES>...
//!
//! Each file is undone (earlier generated content removed) and then fixed
//! (remapped sections appended), unless `--fix-only` or `--undo-only` is given.
//! Files are rewritten in place, once, and only if their text changed.
//!
//! # Configuration Files
//!
//! Expected in the `--config-dir` directory (default `Remap Data/`):
//! - `Remap Main.yaml`: mod types, root patterns and asset replacement tables
//! - `Remap Config.yaml`: default types, variants and logging settings
//!
//! Both are optional. Command-line options override the user settings.

use std::process::ExitCode;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;

use iniremap::models::RemapSettings;
use iniremap::{APP_NAME, ConfigManager, ModTypes, RemapOptions, RemapService, VERSION};

#[derive(Parser)]
#[command(name = "iniremap", version)]
#[command(about = "Remap 3DMigoto mod .ini files so they work on other character variants")]
struct Cli {
    /// Mod .ini files to process
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,

    /// Only generate remapped content, never remove earlier content
    #[arg(long)]
    fix_only: bool,

    /// Only remove previously generated content
    #[arg(long)]
    undo_only: bool,

    /// Mod types to look for (names or aliases); default is every configured type
    #[arg(short, long, value_delimiter = ',')]
    types: Vec<String>,

    /// Mod type assumed for files that match none of the types
    #[arg(long)]
    default_type: Option<String>,

    /// Variants to generate; default is every variant of the detected type
    #[arg(short, long, value_delimiter = ',')]
    variants: Vec<String>,

    /// Directory holding Remap Main.yaml and Remap Config.yaml
    #[arg(short, long, default_value = "Remap Data")]
    config_dir: Utf8PathBuf,

    /// Directory for log files (overrides the user config)
    #[arg(long)]
    log_dir: Option<String>,

    /// Write the log file as JSON lines instead of text
    #[arg(long)]
    log_json: bool,

    /// Debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Saved settings with the command-line options layered on top
    fn options(&self, settings: &RemapSettings) -> RemapOptions {
        let mut options = RemapOptions::from_settings(settings);
        options.fix_only = self.fix_only;
        options.undo_only = self.undo_only;

        if !self.types.is_empty() {
            options.types = self.types.clone();
        }
        if self.default_type.is_some() {
            options.default_type = self.default_type.clone();
        }
        if !self.variants.is_empty() {
            options.variants = self.variants.clone();
        }
        options
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let config_manager =
        ConfigManager::new(&cli.config_dir).context("Failed to open the config directory")?;
    let user_config = config_manager.load_user_config()?;
    let settings = &user_config.remap_settings;

    let log_dir = cli.log_dir.as_deref().unwrap_or(&settings.log_dir);
    let debug = cli.debug || settings.debug_mode;
    let _guard = if cli.log_json {
        iniremap::logging::setup_json_logging(log_dir, APP_NAME, debug)?
    } else {
        iniremap::logging::setup_logging_with_console(log_dir, APP_NAME, debug, true)?
    };

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let main_config = config_manager.load_main_config()?;
    let mod_types = ModTypes::from_config(&main_config).context("Invalid mod type in main config")?;

    let service = RemapService::new(&mod_types, cli.options(settings))?;
    let summary = service.run(&cli.files);

    for (path, reason) in &summary.skipped {
        tracing::error!("Failed to process {}: {}", path, reason);
    }
    if !summary.removed_files.is_empty() {
        tracing::info!(
            "Generated buffer files no longer referenced ({}):",
            summary.removed_files.len()
        );
        for file in &summary.removed_files {
            tracing::info!("  {}", file);
        }
    }

    if !summary.generated_files.is_empty() {
        tracing::info!(
            "Buffer files referenced by the new resources ({}):",
            summary.generated_files.len()
        );
        for file in &summary.generated_files {
            tracing::info!("  {}", file);
        }
    }

    println!("{}", summary.summary());
    Ok(!summary.has_failures())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "iniremap",
            "--fix-only",
            "--variants",
            "RaidenBoss,Other",
            "mod.ini",
        ]);
        let settings = RemapSettings {
            types: vec!["Raiden".to_string()],
            variants: vec!["Saved".to_string()],
            ..RemapSettings::default()
        };

        let options = cli.options(&settings);
        assert!(options.fix_only);
        assert_eq!(options.types, vec!["Raiden"]);
        assert_eq!(options.variants, vec!["RaidenBoss", "Other"]);
        assert_eq!(cli.files, vec![Utf8PathBuf::from("mod.ini")]);
        assert_eq!(cli.config_dir, "Remap Data");
    }

    #[test]
    fn test_cli_requires_files() {
        assert!(Cli::try_parse_from(["iniremap"]).is_err());
    }
}
