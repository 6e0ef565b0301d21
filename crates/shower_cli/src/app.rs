//! Application lifecycle: configuration, deck loading and the command loop.

use crate::cli::CliArgs;
use crate::commands::{self, Command};
use crate::config::AppConfig;
use crate::deck;
use crate::logging::display_banner;
use crate::signals::shutdown_signal;
use crate::storage::FileStorage;
use serde_json::{json, Map, Value};
use shower::{auto_init, Document, MemoryStorage, SessionStorage, Shower, ShowerContext, Window};
use std::path::PathBuf;
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

/// What the command loop should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Continue(String),
    Quit,
}

/// One presentation driven from stdin.
pub struct Application {
    config: AppConfig,
    context: ShowerContext,
    shower: Shower,
}

impl Application {
    /// Loads configuration and deck, applies CLI overrides and starts the
    /// presentation.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Load the deck and start the presentation
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        apply_overrides(&mut config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let document = deck::load_document(&args.deck_path).await?;
        let overrides = option_overrides(&args);
        Self::start(config, document, overrides)
    }

    /// Starts the presentation on an already loaded document.
    ///
    /// `overrides` are explicit options; when given, the container's data
    /// attributes are not consulted.
    pub fn start(
        config: AppConfig,
        document: Document,
        overrides: Option<Map<String, Value>>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let storage: Rc<dyn SessionStorage> = match &config.session.file {
            Some(file) => Rc::new(FileStorage::open(PathBuf::from(file))),
            None => Rc::new(MemoryStorage::new()),
        };
        let window = Window::with_storage(document, storage);
        let context = ShowerContext::with_default_options(config.presentation_options());

        let shower = auto_init(&context, &window, overrides)?
            .ok_or("Deck turns automatic initialisation off")?;

        info!(
            "📂 Deck \"{}\" | {} slides | session: {}",
            window.document().title(),
            shower.slides_count(),
            config.session.file.as_deref().unwrap_or("memory")
        );
        Ok(Self {
            config,
            context,
            shower,
        })
    }

    pub fn shower(&self) -> &Shower {
        &self.shower
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handles one line of presenter input.
    pub fn handle_line(&self, line: &str) -> Reply {
        match line.parse::<Command>() {
            Ok(Command::Quit) => Reply::Quit,
            Ok(command) => match commands::execute(&self.shower, &command) {
                Ok(reply) => Reply::Continue(reply),
                Err(e) => Reply::Continue(format!("error: {e}")),
            },
            Err(e) => Reply::Continue(format!("error: {e}")),
        }
    }

    /// Reads commands from stdin until `quit`, end of input or a shutdown
    /// signal, then tears the presentation down.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Presenting - type `help` for commands");
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        write_line(&mut stdout, &commands::status(&self.shower)).await?;

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("End of input");
                        break;
                    };
                    match self.handle_line(&line) {
                        Reply::Continue(reply) => write_line(&mut stdout, &reply).await?,
                        Reply::Quit => break,
                    }
                }
                result = &mut shutdown => {
                    if let Err(e) = result {
                        error!("❌ Signal handling failed: {e}");
                    }
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn shutdown(&self) {
        if let Some(location) = self.shower.location() {
            if let Err(e) = location.save() {
                warn!("Failed to persist session state: {}", e);
            }
        }
        self.context.teardown();
        info!("👋 Presentation closed");
    }
}

/// Folds CLI flags into the file configuration.
fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(session_file) = &args.session_file {
        config.session.file = Some(session_file.to_string_lossy().to_string());
    }
    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if args.no_hotkeys {
        config.presentation.hotkeys = false;
    }
    if args.debug {
        config.presentation.debug_mode = true;
    }
}

/// Presentation flags given on the command line win over data attributes.
fn option_overrides(args: &CliArgs) -> Option<Map<String, Value>> {
    let mut options = Map::new();
    if args.no_hotkeys {
        options.insert("hotkeys".into(), json!(false));
    }
    if args.debug {
        options.insert("debug_mode".into(), json!(true));
    }
    (!options.is_empty()).then_some(options)
}

async fn write_line(
    stdout: &mut tokio::io::Stdout,
    text: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Deck;
    use tempfile::TempDir;

    const TALK: &str = "# Talk\n## One {#one}\n---\n## Two\n---\n## Three\n";

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["shower"];
        argv.extend_from_slice(extra);
        argv.push("talk.md");
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        let cli = args(&["--session", "s.json", "-l", "debug", "--no-hotkeys", "--debug"]);
        apply_overrides(&mut config, &cli);

        assert_eq!(config.session.file.as_deref(), Some("s.json"));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.presentation.hotkeys);
        assert!(config.presentation.debug_mode);

        let options = option_overrides(&cli).unwrap();
        assert_eq!(options.get("hotkeys"), Some(&json!(false)));
        assert!(option_overrides(&args(&[])).is_none());
    }

    #[test]
    fn test_handle_line() {
        let app = Application::start(AppConfig::default(), Deck::parse(TALK).to_document(), None)
            .unwrap();

        assert_eq!(
            app.handle_line("next"),
            Reply::Continue("[list] 1/3 #one \"One\"".to_string())
        );
        assert_eq!(
            app.handle_line("go 9"),
            Reply::Continue("error: No slide number 9".to_string())
        );
        assert_eq!(
            app.handle_line("jump"),
            Reply::Continue("error: Unknown command: jump (try `help`)".to_string())
        );
        assert_eq!(app.handle_line("quit"), Reply::Quit);
    }

    #[test]
    fn test_config_options_reach_the_presentation() {
        let mut config = AppConfig::default();
        config.presentation.hotkeys = false;
        config.presentation.slide_active_classname = "now".to_string();
        let app = Application::start(config, Deck::parse(TALK).to_document(), None).unwrap();

        assert!(!app.shower().is_hotkeys_enabled());
        app.handle_line("key right");
        assert_eq!(app.shower().player().current_slide_index(), None);

        app.handle_line("go 2");
        assert!(app.shower().get(1).unwrap().element().has_class("now"));
    }

    #[test]
    fn test_data_attributes_and_explicit_overrides() {
        let markup = "<title>Markup</title>\
            <div class=\"shower\" data-hotkeys=\"false\">\
            <section class=\"slide\"><h2>A</h2></section>\
            <section class=\"slide\"><h2>B</h2></section></div>";

        let app = Application::start(AppConfig::default(), Document::parse(markup).unwrap(), None)
            .unwrap();
        assert!(!app.shower().is_hotkeys_enabled());

        let mut overrides = Map::new();
        overrides.insert("debug_mode".into(), json!(true));
        let app = Application::start(
            AppConfig::default(),
            Document::parse(markup).unwrap(),
            Some(overrides),
        )
        .unwrap();
        assert!(app.shower().is_hotkeys_enabled());
        assert!(app.shower().document().body().has_class("debug"));
    }

    #[test]
    fn test_view_mode_persists_in_session_file() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.session.file = Some(dir.path().join("session.json").display().to_string());

        let app = Application::start(config.clone(), Deck::parse(TALK).to_document(), None)
            .unwrap();
        app.handle_line("full");
        app.shutdown();

        let app = Application::start(config, Deck::parse(TALK).to_document(), None).unwrap();
        assert!(app.shower().container().is_slide_mode());
        assert_eq!(
            app.handle_line("status"),
            Reply::Continue("[full] 1/3 #one \"One\"".to_string())
        );
    }
}
