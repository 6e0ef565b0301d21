//! Lenient HTML fragment parsing and serialization

use super::{Element, Node};
use crate::error::ShowerError;
use crate::Result;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Parses a markup fragment into top-level nodes.
///
/// Unknown closing tags are ignored and open elements are closed at the end
/// of input. Unterminated tags, comments and quoted attribute values are
/// errors.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>> {
    FragmentParser {
        input,
        pos: 0,
        roots: Vec::new(),
        open: Vec::new(),
    }
    .run()
}

struct FragmentParser<'a> {
    input: &'a str,
    pos: usize,
    roots: Vec<Node>,
    open: Vec<Element>,
}

impl<'a> FragmentParser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn error(&self, position: usize, reason: &str) -> ShowerError {
        ShowerError::Markup {
            position,
            reason: reason.to_string(),
        }
    }

    fn run(mut self) -> Result<Vec<Node>> {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                let end = rest[4..]
                    .find("-->")
                    .ok_or_else(|| self.error(self.pos, "unterminated comment"))?;
                self.pos += 4 + end + 3;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| self.error(self.pos, "unterminated declaration"))?;
                self.pos += end + 1;
            } else if rest.starts_with("</") {
                self.close_tag()?;
            } else if rest.starts_with('<')
                && rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.open_tag()?;
            } else {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
                let text = decode_entities(&rest[..end]);
                self.pos += end;
                self.push_node(Node::Text(text));
            }
        }
        Ok(self.roots)
    }

    fn push_node(&mut self, node: Node) {
        match self.open.last() {
            Some(parent) => parent.append_node(node),
            None => self.roots.push(node),
        }
    }

    fn close_tag(&mut self) -> Result<()> {
        let start = self.pos;
        let end = self
            .rest()
            .find('>')
            .ok_or_else(|| self.error(start, "unterminated closing tag"))?;
        let name = self.rest()[2..end].trim().to_ascii_lowercase();
        self.pos += end + 1;

        if let Some(depth) = self.open.iter().rposition(|element| element.tag() == name) {
            self.open.truncate(depth);
        }
        Ok(())
    }

    fn open_tag(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;

        let name_len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(self.rest().len());
        let tag = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;

        let element = Element::new(&tag);
        let self_closing = self.parse_attributes(&element, start)?;
        self.push_node(Node::Element(element.clone()));

        if self_closing || is_void(&tag) {
            return Ok(());
        }

        if is_raw_text(&tag) {
            let closing = format!("</{}", tag);
            let rest = self.rest();
            let end = rest
                .to_ascii_lowercase()
                .find(&closing)
                .ok_or_else(|| self.error(start, "unterminated raw text element"))?;
            let text = &rest[..end];
            if !text.is_empty() {
                let text = if tag == "script" || tag == "style" {
                    text.to_string()
                } else {
                    decode_entities(text)
                };
                element.append_node(Node::Text(text));
            }
            self.pos += end;
            let close = self
                .rest()
                .find('>')
                .ok_or_else(|| self.error(self.pos, "unterminated closing tag"))?;
            self.pos += close + 1;
            return Ok(());
        }

        self.open.push(element);
        Ok(())
    }

    /// Reads attributes up to the end of the tag. Returns whether the tag
    /// ended with `/>`.
    fn parse_attributes(&mut self, element: &Element, start: usize) -> Result<bool> {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.input.len() - trimmed.len();

            if trimmed.is_empty() {
                return Err(self.error(start, "unterminated tag"));
            }
            if trimmed.starts_with("/>") {
                self.pos += 2;
                return Ok(true);
            }
            if trimmed.starts_with('>') {
                self.pos += 1;
                return Ok(false);
            }
            if trimmed.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name_len = trimmed
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(trimmed.len());
            let name = trimmed[..name_len].to_ascii_lowercase();
            self.pos += name_len;

            let after = self.rest().trim_start();
            if !after.starts_with('=') {
                element.set_attribute(&name, "");
                continue;
            }
            self.pos = self.input.len() - after.len() + 1;

            let value_start = self.rest().trim_start();
            self.pos = self.input.len() - value_start.len();
            let value = match value_start.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let end = value_start[1..]
                        .find(quote)
                        .ok_or_else(|| self.error(self.pos, "unterminated attribute value"))?;
                    self.pos += end + 2;
                    &value_start[1..end + 1]
                }
                _ => {
                    let end = value_start
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(value_start.len());
                    self.pos += end;
                    &value_start[..end]
                }
            };
            if !name.is_empty() {
                element.set_attribute(&name, &decode_entities(value));
            }
        }
    }
}

/// Decodes the named entities markup commonly carries plus numeric references.
/// Anything unrecognised is kept as-is.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Serializes `element` including its own tag.
pub fn serialize_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(element.tag());
    for (name, value) in element.attributes() {
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&value));
        out.push('"');
    }
    out.push('>');

    if is_void(element.tag()) {
        return;
    }
    serialize_children(element, out);
    out.push_str("</");
    out.push_str(element.tag());
    out.push('>');
}

/// Serializes the children of `element` only.
pub fn serialize_children(element: &Element, out: &mut String) {
    let raw = matches!(element.tag(), "script" | "style");
    for node in element.child_nodes() {
        match node {
            Node::Element(child) => serialize_element(&child, out),
            Node::Text(text) if raw => out.push_str(&text),
            Node::Text(text) => out.push_str(&escape_text(&text)),
        }
    }
}
