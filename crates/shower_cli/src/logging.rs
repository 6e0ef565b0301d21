//! Logging system setup.
//!
//! Human-readable or JSON output through `tracing-subscriber`. Logs go to
//! stderr so that command replies on stdout stay clean.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system.
///
/// # Arguments
///
/// * `config` - Logging configuration from the config file
/// * `json_format` - Whether to force JSON output format (CLI override)
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn setup_logging(
    config: &LoggingSettings,
    json_format: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_file(false)
                    .with_line_number(false)
                    .with_target(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_target(false),
            )
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    Ok(())
}

/// Displays the startup banner through the log.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════╗");
    info!("║          🚿 SHOWER PRESENTER          ║");
    info!("║              v{:<23}║", version);
    info!("║                                      ║");
    info!("║  ⌨️  Keyboard navigation               ║");
    info!("║  🔗 Fragment deep links              ║");
    info!("║  💾 Session-persisted view mode      ║");
    info!("╚══════════════════════════════════════╝");
}
