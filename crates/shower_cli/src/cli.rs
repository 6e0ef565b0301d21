//! Command-line interface handling for the `shower` presenter.
//!
//! Uses the `clap` builder API. Every flag except the deck path overrides a
//! value from the configuration file.

use clap::{Arg, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Deck to present, `.html` markup or the text format
    pub deck_path: PathBuf,
    /// Optional override for the session state file
    pub session_file: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Start with keyboard navigation disabled
    pub no_hotkeys: bool,
    /// Start in debug mode
    pub debug: bool,
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list. The first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        command()
            .try_get_matches_from(args)
            .map(|matches| Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("shower.toml")),
            deck_path: matches
                .get_one::<String>("deck")
                .map(PathBuf::from)
                .unwrap_or_default(),
            session_file: matches.get_one::<String>("session").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            no_hotkeys: matches.get_flag("no-hotkeys"),
            debug: matches.get_flag("debug"),
        }
    }
}

fn command() -> Command {
    Command::new("Shower")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal presenter for Shower slide decks")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("shower.toml"),
        )
        .arg(
            Arg::new("session")
                .short('s')
                .long("session")
                .value_name("FILE")
                .help("Session state file (view mode survives restarts)"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-hotkeys")
                .long("no-hotkeys")
                .help("Disable keyboard navigation")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug mode")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("deck")
                .value_name("DECK")
                .help("Deck file (.html, or text slides separated by ---)")
                .required(true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["shower", "talk.md"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("shower.toml"));
        assert_eq!(args.deck_path, PathBuf::from("talk.md"));
        assert!(args.session_file.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
        assert!(!args.no_hotkeys);
        assert!(!args.debug);
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "shower",
            "-c",
            "custom.toml",
            "--session",
            "state.json",
            "-l",
            "debug",
            "--json-logs",
            "--no-hotkeys",
            "--debug",
            "deck.html",
        ])
        .unwrap();
        assert_eq!(args.config_path, PathBuf::from("custom.toml"));
        assert_eq!(args.session_file, Some(PathBuf::from("state.json")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs && args.no_hotkeys && args.debug);
        assert_eq!(args.deck_path, PathBuf::from("deck.html"));
    }

    #[test]
    fn test_deck_is_required() {
        assert!(CliArgs::try_parse_from(["shower"]).is_err());
    }
}
