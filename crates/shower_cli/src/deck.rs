//! Deck loading.
//!
//! A deck is either a markup document (`.html`/`.htm`) or plain text:
//!
//! ```text
//! # Deck title
//!
//! ## First slide {#intro}
//! Some text
//! - a point
//! ---
//! ## Second slide
//! ```
//!
//! Slides are separated by `---` lines. A `# ` line at the very top names the
//! deck, `## ` gives a slide its title and an optional `{#id}` suffix its id.
//! Runs of lines become paragraphs, `- ` and `* ` lines become lists.

use shower::{Document, Element, ShowerError};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Title used when a text deck does not name itself.
pub const DEFAULT_DECK_TITLE: &str = "Shower";

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Cannot read deck {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid deck markup: {0}")]
    Markup(#[from] ShowerError),
    #[error("Deck {0} has no slides")]
    Empty(String),
}

/// A block of slide body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckSlide {
    pub id: Option<String>,
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

impl DeckSlide {
    fn is_empty(&self) -> bool {
        self.id.is_none() && self.title.is_none() && self.blocks.is_empty()
    }
}

/// A parsed text deck.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    pub title: Option<String>,
    pub slides: Vec<DeckSlide>,
}

impl Deck {
    /// Parses the text format. Never fails; unrecognised lines are text.
    pub fn parse(text: &str) -> Self {
        let mut deck = Deck::default();
        let mut lines = text.lines().peekable();

        while lines.peek().is_some_and(|line| line.trim().is_empty()) {
            lines.next();
        }
        if let Some(title) = lines
            .peek()
            .and_then(|line| line.trim().strip_prefix("# "))
        {
            deck.title = Some(title.trim().to_string());
            lines.next();
        }

        let mut builder = SlideBuilder::default();
        for line in lines {
            let line = line.trim();
            if line == "---" {
                deck.push(builder.finish());
                builder = SlideBuilder::default();
            } else {
                builder.line(line);
            }
        }
        deck.push(builder.finish());

        debug!(
            "Parsed text deck {:?} with {} slides",
            deck.title,
            deck.slides.len()
        );
        deck
    }

    fn push(&mut self, slide: DeckSlide) {
        if !slide.is_empty() {
            self.slides.push(slide);
        }
    }

    /// Builds the document the runtime presents: a `.shower` container of
    /// `section.slide` elements.
    pub fn to_document(&self) -> Document {
        let document = Document::new();
        document.set_title(self.title.as_deref().unwrap_or(DEFAULT_DECK_TITLE));

        let container = document.create_element("div");
        container.add_class("shower");
        for slide in &self.slides {
            container.append_child(&slide_element(&document, slide));
        }
        document.body().append_child(&container);
        document
    }
}

fn slide_element(document: &Document, slide: &DeckSlide) -> Element {
    let section = document.create_element("section");
    section.add_class("slide");
    if let Some(id) = &slide.id {
        section.set_id(id);
    }
    if let Some(title) = &slide.title {
        let heading = document.create_element("h2");
        heading.set_text_content(title);
        section.append_child(&heading);
    }
    for block in &slide.blocks {
        let element = match block {
            Block::Paragraph(text) => {
                let paragraph = document.create_element("p");
                paragraph.set_text_content(text);
                paragraph
            }
            Block::List(items) => {
                let list = document.create_element("ul");
                for item in items {
                    let entry = document.create_element("li");
                    entry.set_text_content(item);
                    list.append_child(&entry);
                }
                list
            }
        };
        section.append_child(&element);
    }
    section
}

#[derive(Default)]
struct SlideBuilder {
    slide: DeckSlide,
    paragraph: Vec<String>,
    list: Vec<String>,
}

impl SlideBuilder {
    fn line(&mut self, line: &str) {
        if line.is_empty() {
            self.flush_paragraph();
            self.flush_list();
        } else if let Some(heading) = line
            .strip_prefix("## ")
            .filter(|_| self.slide.title.is_none())
        {
            self.flush_paragraph();
            self.flush_list();
            let (title, id) = split_heading_id(heading);
            self.slide.title = Some(title.to_string());
            if id.is_some() {
                self.slide.id = id.map(str::to_string);
            }
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            self.flush_paragraph();
            self.list.push(item.trim().to_string());
        } else {
            self.flush_list();
            self.paragraph.push(line.to_string());
        }
    }

    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let text = self.paragraph.join(" ");
            self.paragraph.clear();
            self.slide.blocks.push(Block::Paragraph(text));
        }
    }

    fn flush_list(&mut self) {
        if !self.list.is_empty() {
            let items = std::mem::take(&mut self.list);
            self.slide.blocks.push(Block::List(items));
        }
    }

    fn finish(mut self) -> DeckSlide {
        self.flush_paragraph();
        self.flush_list();
        self.slide
    }
}

/// Splits `Title {#id}` into its title and id.
fn split_heading_id(heading: &str) -> (&str, Option<&str>) {
    let heading = heading.trim();
    if let Some(rest) = heading.strip_suffix('}') {
        if let Some(start) = rest.rfind("{#") {
            let id = rest[start + 2..].trim();
            if !id.is_empty() && !id.contains(char::is_whitespace) {
                return (rest[..start].trim_end(), Some(id));
            }
        }
    }
    (heading, None)
}

/// Reads a deck file into a document.
pub async fn load_document(path: &Path) -> Result<Document, DeckError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DeckError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let is_markup = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

    let document = if is_markup {
        Document::parse(&text)?
    } else {
        let deck = Deck::parse(&text);
        if deck.slides.is_empty() {
            return Err(DeckError::Empty(path.display().to_string()));
        }
        deck.to_document()
    };

    info!("📄 Loaded deck {} (\"{}\")", path.display(), document.title());
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TALK: &str = "
# Rust for presenters

## Hello {#intro}
Slides in
plain text.

- one
- two
---
## Second
---

---
Just text
";

    #[test]
    fn test_parse_text_deck() {
        let deck = Deck::parse(TALK);
        assert_eq!(deck.title.as_deref(), Some("Rust for presenters"));
        assert_eq!(deck.slides.len(), 3);

        let intro = &deck.slides[0];
        assert_eq!(intro.id.as_deref(), Some("intro"));
        assert_eq!(intro.title.as_deref(), Some("Hello"));
        assert_eq!(
            intro.blocks,
            vec![
                Block::Paragraph("Slides in plain text.".to_string()),
                Block::List(vec!["one".to_string(), "two".to_string()]),
            ]
        );

        assert_eq!(deck.slides[1].title.as_deref(), Some("Second"));
        assert!(deck.slides[1].id.is_none());
        assert_eq!(
            deck.slides[2].blocks,
            vec![Block::Paragraph("Just text".to_string())]
        );
    }

    #[test]
    fn test_heading_ids() {
        assert_eq!(split_heading_id("Title {#t-1}"), ("Title", Some("t-1")));
        assert_eq!(split_heading_id("Title {# }"), ("Title {# }", None));
        assert_eq!(split_heading_id("Plain"), ("Plain", None));
    }

    #[test]
    fn test_deck_document() {
        let document = Deck::parse(TALK).to_document();
        assert_eq!(document.title(), "Rust for presenters");

        let slides = document.query_selector_all(".shower .slide").unwrap();
        assert_eq!(slides.len(), 3);
        assert_eq!(slides[0].id().as_deref(), Some("intro"));
        assert_eq!(
            slides[0].inner_html(),
            "<h2>Hello</h2><p>Slides in plain text.</p><ul><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn test_untitled_deck() {
        let deck = Deck::parse("## Only <slide>");
        assert!(deck.title.is_none());
        let document = deck.to_document();
        assert_eq!(document.title(), DEFAULT_DECK_TITLE);
        let slide = document.query_selector(".slide").unwrap().unwrap();
        assert_eq!(slide.inner_html(), "<h2>Only &lt;slide&gt;</h2>");
    }

    #[tokio::test]
    async fn test_load_documents() {
        let dir = TempDir::new().unwrap();

        let text = dir.path().join("talk.md");
        tokio::fs::write(&text, TALK).await.unwrap();
        let document = load_document(&text).await.unwrap();
        assert_eq!(document.query_selector_all(".slide").unwrap().len(), 3);

        let markup = dir.path().join("talk.HTML");
        tokio::fs::write(
            &markup,
            "<title>Markup</title><div class=\"shower\"><section class=\"slide\"></section></div>",
        )
        .await
        .unwrap();
        let document = load_document(&markup).await.unwrap();
        assert_eq!(document.title(), "Markup");

        let empty = dir.path().join("empty.txt");
        tokio::fs::write(&empty, "\n---\n").await.unwrap();
        assert!(matches!(
            load_document(&empty).await,
            Err(DeckError::Empty(_))
        ));

        assert!(matches!(
            load_document(&dir.path().join("missing.md")).await,
            Err(DeckError::Io { .. })
        ));
    }
}
