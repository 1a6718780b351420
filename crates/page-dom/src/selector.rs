//! Typed CSS-subset selectors.
//!
//! Supported: type selectors, `*`, `.class`, `#id`, `[attr]`, `[attr="v"]`, `[attr*="v"]`,
//! the descendant combinator and comma-separated alternatives. Selectors render back to CSS
//! text so adapters backed by a real browser can hand them to `querySelectorAll`.

use std::fmt;
use std::str::FromStr;

use crate::errors::DomError;
use crate::node::NodeId;

/// Read access a document needs to offer for selector matching.
pub trait SelectorTarget {
    /// Lower-case tag name, `None` for non-element nodes.
    fn tag_name(&self, node: NodeId) -> Option<&str>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn parent_element(&self, node: NodeId) -> Option<NodeId>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttrOp {
    Exists,
    Equals,
    Contains,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttrMatcher {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
}

impl AttrMatcher {
    fn matches(&self, actual: Option<&str>) -> bool {
        match (self.op, actual) {
            (_, None) => false,
            (AttrOp::Exists, Some(_)) => true,
            (AttrOp::Equals, Some(actual)) => actual == self.value,
            (AttrOp::Contains, Some(actual)) => {
                !self.value.is_empty() && actual.contains(self.value.as_str())
            }
        }
    }
}

/// A run of simple selectors that all apply to one element.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttrMatcher>,
}

impl Compound {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(name: &str) -> Self {
        Self {
            tag: Some(name.to_ascii_lowercase()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str) -> Self {
        self.attributes.push(AttrMatcher {
            name: name.to_ascii_lowercase(),
            op: AttrOp::Exists,
            value: String::new(),
        });
        self
    }

    pub fn with_attr_eq(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(AttrMatcher {
            name: name.to_ascii_lowercase(),
            op: AttrOp::Equals,
            value: value.to_string(),
        });
        self
    }

    pub fn with_attr_contains(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(AttrMatcher {
            name: name.to_ascii_lowercase(),
            op: AttrOp::Contains,
            value: value.to_string(),
        });
        self
    }

    pub fn matches<T: SelectorTarget + ?Sized>(&self, target: &T, node: NodeId) -> bool {
        let Some(tag) = target.tag_name(node) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if target.attribute(node, "id") != Some(expected.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = target.attribute(node, "class").unwrap_or_default();
            let has_all = self
                .classes
                .iter()
                .all(|class| class_attr.split_whitespace().any(|c| c == class));
            if !has_all {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|matcher| matcher.matches(target.attribute(node, &matcher.name)))
    }

    fn is_universal(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }
}

/// Compounds joined by descendant combinators; the last compound is the subject.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Complex {
    compounds: Vec<Compound>,
}

impl Complex {
    pub fn new(compounds: Vec<Compound>) -> Self {
        Self { compounds }
    }

    fn matches<T: SelectorTarget + ?Sized>(&self, target: &T, node: NodeId) -> bool {
        let Some((subject, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !subject.matches(target, node) {
            return false;
        }
        let mut cursor = target.parent_element(node);
        for compound in ancestors.iter().rev() {
            loop {
                let Some(candidate) = cursor else {
                    return false;
                };
                cursor = target.parent_element(candidate);
                if compound.matches(target, candidate) {
                    break;
                }
            }
        }
        true
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let mut alternatives = Vec::new();
        for part in split_top_level(text, ',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(DomError::invalid_selector(text, "empty alternative"));
            }
            let mut compounds = Vec::new();
            for token in split_top_level(part, ' ') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                compounds.push(parse_compound(text, token)?);
            }
            alternatives.push(Complex::new(compounds));
        }
        if alternatives.is_empty() {
            return Err(DomError::invalid_selector(text, "empty selector"));
        }
        Ok(Self { alternatives })
    }

    pub fn any_of(selectors: impl IntoIterator<Item = Selector>) -> Self {
        Self {
            alternatives: selectors
                .into_iter()
                .flat_map(|selector| selector.alternatives)
                .collect(),
        }
    }

    pub fn matches<T: SelectorTarget + ?Sized>(&self, target: &T, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches(target, node))
    }
}

impl From<Compound> for Selector {
    fn from(compound: Compound) -> Self {
        Self {
            alternatives: vec![Complex::new(vec![compound])],
        }
    }
}

impl From<Complex> for Selector {
    fn from(complex: Complex) -> Self {
        Self {
            alternatives: vec![complex],
        }
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Selector::parse(text)
    }
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn take_ident(chars: &[char], pos: &mut usize) -> String {
    let begin = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    chars[begin..*pos].iter().collect()
}

fn parse_compound(full: &str, token: &str) -> Result<Compound, DomError> {
    let chars: Vec<char> = token.chars().collect();
    let mut pos = 0;
    let mut compound = Compound::any();

    if chars.first() == Some(&'*') {
        pos = 1;
    } else if chars.first().copied().is_some_and(is_ident_char) {
        compound.tag = Some(take_ident(&chars, &mut pos).to_ascii_lowercase());
    }

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                pos += 1;
                let class = take_ident(&chars, &mut pos);
                if class.is_empty() {
                    return Err(DomError::invalid_selector(full, "empty class name"));
                }
                compound.classes.push(class);
            }
            '#' => {
                pos += 1;
                let id = take_ident(&chars, &mut pos);
                if id.is_empty() {
                    return Err(DomError::invalid_selector(full, "empty id"));
                }
                compound.id = Some(id);
            }
            '[' => {
                pos += 1;
                let begin = pos;
                let mut quote: Option<char> = None;
                while pos < chars.len() {
                    match (quote, chars[pos]) {
                        (Some(_), '\\') => pos += 1,
                        (Some(open), c) if c == open => quote = None,
                        (None, '"') | (None, '\'') => quote = Some(chars[pos]),
                        (None, ']') => break,
                        _ => {}
                    }
                    pos += 1;
                }
                if pos >= chars.len() {
                    return Err(DomError::invalid_selector(full, "unterminated attribute"));
                }
                let body: String = chars[begin..pos].iter().collect();
                pos += 1;
                compound.attributes.push(parse_attribute(full, &body)?);
            }
            other => {
                return Err(DomError::invalid_selector(
                    full,
                    format!("unsupported token '{other}'"),
                ));
            }
        }
    }

    Ok(compound)
}

fn parse_attribute(full: &str, body: &str) -> Result<AttrMatcher, DomError> {
    let (name, op, raw_value) = if let Some((name, value)) = body.split_once("*=") {
        (name, AttrOp::Contains, Some(value))
    } else if let Some((name, value)) = body.split_once('=') {
        (name, AttrOp::Equals, Some(value))
    } else {
        (body, AttrOp::Exists, None)
    };

    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(DomError::invalid_selector(full, "bad attribute name"));
    }

    let value = match raw_value {
        None => String::new(),
        Some(raw) => unquote(raw.trim()),
    };

    Ok(AttrMatcher {
        name: name.to_ascii_lowercase(),
        op,
        value,
    })
}

fn unquote(raw: &str) -> String {
    let inner = if raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')))
    {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for ch in inner.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_universal() {
            return f.write_str("*");
        }
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attr in &self.attributes {
            match attr.op {
                AttrOp::Exists => write!(f, "[{}]", attr.name)?,
                AttrOp::Equals => write!(f, "[{}=\"{}\"]", attr.name, escape_value(&attr.value))?,
                AttrOp::Contains => {
                    write!(f, "[{}*=\"{}\"]", attr.name, escape_value(&attr.value))?
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, complex) in self.alternatives.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            for (pos, compound) in complex.compounds.iter().enumerate() {
                if pos > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{compound}")?;
            }
        }
        Ok(())
    }
}
