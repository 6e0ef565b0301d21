//! # Shower presenter
//!
//! Terminal front-end for the `shower` runtime. Loads a deck, starts a
//! presentation on it and drives it from commands typed on stdin.
//!
//! ## Quick Start
//!
//! ```bash
//! # Present a text deck with the default configuration
//! shower talk.md
//!
//! # Keep the view mode between runs
//! shower --session .shower-session.json talk.md
//!
//! # Custom configuration, verbose JSON logs
//! shower --config shower.toml --log-level debug --json-logs deck.html
//! ```
//!
//! ## Configuration
//!
//! Settings are read from a TOML file (default: `shower.toml`) with
//! `[presentation]`, `[session]` and `[logging]` sections. A missing file is
//! created with the defaults.

use tracing::error;

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deck;
pub mod logging;
pub mod signals;
pub mod storage;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the presenter: parses arguments, sets up logging, then loads and
/// presents the deck until the presenter quits.
///
/// # Exit Codes
///
/// * **0**: The presenter quit normally
/// * **1**: Error during startup or while presenting
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging needs the configured level before anything else runs
    let mut log_settings = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        log_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&log_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start presentation: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{LoggingSettings, SessionSettings};
pub use deck::{Deck, DeckError};
pub use storage::FileStorage;
