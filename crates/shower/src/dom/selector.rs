//! CSS selector subset used for element queries
//!
//! Supported: type selectors and `*`, `.class`, `#id`, attribute selectors
//! (`[a]`, `[a=v]`, `[a~=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`), compounds of
//! those, the descendant and child (`>`) combinators, and comma lists.

use super::Element;
use crate::error::ShowerError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttrSelector>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.ids.is_empty() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !element.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.ids.is_empty() {
            let id = element.id();
            if !self.ids.iter().all(|wanted| id.as_deref() == Some(wanted.as_str())) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }
        self.attributes.iter().all(|attr| {
            let Some(value) = element.attribute(&attr.name) else {
                return false;
            };
            match &attr.op {
                AttrOp::Exists => true,
                AttrOp::Equals(v) => value == *v,
                AttrOp::Includes(v) => value.split_whitespace().any(|word| word == v),
                AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
                AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
                AttrOp::Substring(v) => !v.is_empty() && value.contains(v.as_str()),
            }
        })
    }
}

/// A chain of compounds. `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, element: &Element) -> bool {
        self.matches_at(element, self.compounds.len() - 1)
    }

    fn matches_at(&self, element: &Element, index: usize) -> bool {
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => element
                .parent()
                .is_some_and(|parent| self.matches_at(&parent, index - 1)),
            Combinator::Descendant => {
                let mut ancestor = element.parent();
                while let Some(current) = ancestor {
                    if self.matches_at(&current, index - 1) {
                        return true;
                    }
                    ancestor = current.parent();
                }
                false
            }
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    /// Whether `element` matches any alternative. Ancestors are checked all
    /// the way up to the root, not only inside the queried subtree.
    pub fn matches(&self, element: &Element) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(element))
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ShowerError {
        ShowerError::InvalidSelector {
            selector: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse(mut self) -> Result<Selector> {
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.parse_complex()?);
            match self.peek() {
                Some(',') => self.pos += 1,
                None => break,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(Selector { alternatives })
    }

    fn parse_complex(&mut self) -> Result<Complex> {
        self.skip_whitespace();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();

        if self.peek() == Some('*') {
            self.pos += 1;
            compound.tag = Some("*".to_string());
        } else if self.peek().is_some_and(is_name_char) {
            compound.tag = Some(self.parse_name()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_name()?);
                }
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.parse_name()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => return Err(self.error("pseudo-classes are not supported")),
                _ => break,
            }
        }

        if compound.is_empty() {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_attribute(&mut self) -> Result<AttrSelector> {
        self.skip_whitespace();
        let name = self.parse_name()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                });
            }
            Some('=') => {
                self.pos += 1;
                '='
            }
            Some(c @ ('~' | '^' | '$' | '*')) if self.chars.get(self.pos + 1) == Some(&'=') => {
                self.pos += 2;
                c
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_whitespace();
        let value = self.parse_attribute_value()?;
        self.skip_whitespace();
        if self.peek() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        self.pos += 1;

        let op = match operator {
            '~' => AttrOp::Includes(value),
            '^' => AttrOp::Prefix(value),
            '$' => AttrOp::Suffix(value),
            '*' => AttrOp::Substring(value),
            _ => AttrOp::Equals(value),
        };
        Ok(AttrSelector { name, op })
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(self.error("unterminated string"));
                }
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                Ok(value)
            }
            _ => self.parse_name(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
