//! Presenter commands read from stdin.
//!
//! Slide numbers typed by the presenter are 1-based.

use shower::{Key, Modifiers, Shower};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const HELP: &str = "\
commands:
  next | n              next slide
  prev | p              previous slide
  first | last          jump to either end
  go N                  slide number N
  goto ID               slide with id ID
  key NAME [MOD]...     press a key (MOD: shift, alt, ctrl, meta)
  hash ID               follow a #ID link
  back                  history back
  full | list | toggle  switch view mode
  click N               click slide number N
  status | slides       show where you are
  help                  this text
  quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    First,
    Last,
    Go(usize),
    Goto(String),
    Key(Key, Modifiers),
    Hash(String),
    Back,
    Full,
    List,
    Toggle,
    Click(usize),
    Status,
    Slides,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("Invalid argument for {command}: {value}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
    #[error("No slide with id {0}")]
    UnknownSlide(String),
    #[error("No slide number {0}")]
    NoSuchSlide(usize),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Command::Status);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "first" => Command::First,
            "last" => Command::Last,
            "go" => Command::Go(slide_number("go", words.next())?),
            "goto" => Command::Goto(argument("goto", words.next())?.to_string()),
            "key" => {
                let name = argument("key", words.next())?;
                let key = Key::from_name(name).ok_or_else(|| CommandError::InvalidArgument {
                    command: "key",
                    value: name.to_string(),
                })?;
                let mut modifiers = Modifiers::none();
                for modifier in words.by_ref() {
                    match modifier.to_ascii_lowercase().as_str() {
                        "shift" => modifiers.shift = true,
                        "alt" => modifiers.alt = true,
                        "ctrl" => modifiers.ctrl = true,
                        "meta" => modifiers.meta = true,
                        _ => {
                            return Err(CommandError::InvalidArgument {
                                command: "key",
                                value: modifier.to_string(),
                            })
                        }
                    }
                }
                Command::Key(key, modifiers)
            }
            "hash" => Command::Hash(
                argument("hash", words.next())?
                    .trim_start_matches('#')
                    .to_string(),
            ),
            "back" => Command::Back,
            "full" => Command::Full,
            "list" => Command::List,
            "toggle" => Command::Toggle,
            "click" => Command::Click(slide_number("click", words.next())?),
            "status" => Command::Status,
            "slides" => Command::Slides,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn argument<'a>(command: &'static str, word: Option<&'a str>) -> Result<&'a str, CommandError> {
    word.ok_or(CommandError::MissingArgument(command))
}

fn slide_number(command: &'static str, word: Option<&str>) -> Result<usize, CommandError> {
    let word = argument(command, word)?;
    match word.parse::<usize>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(CommandError::InvalidArgument {
            command,
            value: word.to_string(),
        }),
    }
}

/// Runs `command` against `shower` and returns the reply for the presenter.
///
/// `Quit` is left to the caller and answers with an empty reply.
pub fn execute(shower: &Shower, command: &Command) -> Result<String, CommandError> {
    debug!("Executing {:?}", command);
    let player = shower.player();
    let container = shower.container();
    let window = shower.window();

    match command {
        Command::Next => {
            player.next();
        }
        Command::Prev => {
            player.prev();
        }
        Command::First => {
            player.first();
        }
        Command::Last => {
            player.last();
        }
        Command::Go(number) => {
            player.go(slide_at(shower, *number)?);
        }
        Command::Goto(id) => {
            let slide = shower
                .slides()
                .into_iter()
                .find(|slide| slide.id().as_deref() == Some(id.as_str()))
                .ok_or_else(|| CommandError::UnknownSlide(id.clone()))?;
            player.go(&slide);
        }
        Command::Key(key, modifiers) => {
            let event = window.key_down(*key, *modifiers);
            if !event.default_prevented() {
                return Ok(format!("(key ignored) {}", status(shower)));
            }
        }
        Command::Hash(id) => {
            window.navigate_hash(id);
        }
        Command::Back => {
            if window.back().is_none() {
                return Ok(format!("(no history) {}", status(shower)));
            }
        }
        Command::Full => {
            container.enter_slide_mode();
        }
        Command::List => {
            container.exit_slide_mode();
        }
        Command::Toggle => {
            container.toggle_mode();
        }
        Command::Click(number) => {
            let index = slide_at(shower, *number)?;
            if let Some(slide) = shower.get(index) {
                slide.element().click();
            }
        }
        Command::Slides => return Ok(slides(shower)),
        Command::Help => return Ok(HELP.to_string()),
        Command::Quit => return Ok(String::new()),
        Command::Status => {}
    }
    Ok(status(shower))
}

fn slide_at(shower: &Shower, number: usize) -> Result<usize, CommandError> {
    if number == 0 || number > shower.slides_count() {
        return Err(CommandError::NoSuchSlide(number));
    }
    Ok(number - 1)
}

/// One line: view mode, position, fragment and title of the current slide.
pub fn status(shower: &Shower) -> String {
    let mode = if shower.container().is_slide_mode() {
        "full"
    } else {
        "list"
    };
    let count = shower.slides_count();
    let player = shower.player();

    match (player.current_slide_index(), player.current_slide()) {
        (Some(index), Some(slide)) => {
            let mut line = format!("[{}] {}/{}", mode, index + 1, count);
            if let Some(id) = slide.id() {
                let _ = write!(line, " #{}", id);
            }
            if let Some(title) = slide.title().filter(|title| !title.is_empty()) {
                let _ = write!(line, " \"{}\"", title);
            }
            line
        }
        _ => format!("[{}] -/{}", mode, count),
    }
}

/// Every slide on its own line. `>` marks the current slide, `·` visited ones.
pub fn slides(shower: &Shower) -> String {
    let current = shower.player().current_slide();
    shower
        .slides()
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            let marker = if current.as_ref() == Some(slide) {
                '>'
            } else if slide.is_visited() {
                '·'
            } else {
                ' '
            };
            format!(
                "{} {:>3} #{} {}",
                marker,
                i + 1,
                slide.id().unwrap_or_default(),
                slide.title().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
