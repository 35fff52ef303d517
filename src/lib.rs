// iniremap - Remap game mod .ini files to new character variants
//
// This is the library crate containing the rewriting engine and data structures.
// The binary crate (main.rs) provides the command-line entry point.

pub mod config;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{MainConfig, ModType, ModTypes, UserConfig};
pub use services::{ApplyOutcome, IniFile, RemapError, RemapOptions, RemapService};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
