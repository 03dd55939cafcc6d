//! Value paths into JSON object graphs
//!
//! A path such as `#order.items[0].sku` names a root variable followed by
//! field and index segments. The same segments identify fields inside a diff
//! tree.

use serde_json::Value;
use std::fmt;

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl PathSegment {
    /// Step from `value` into this segment
    pub fn apply<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match self {
            Self::Field(name) => value.get(name.as_str()),
            Self::Index(index) => value.get(*index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, ".{}", name),
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Walk `segments` starting at `root`
pub fn resolve_segments<'v>(root: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(root, |value, segment| segment.apply(value))
}

/// A parsed `#root.field[0]` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePath {
    root: String,
    segments: Vec<PathSegment>,
}

impl ValuePath {
    /// Parse a `#`-prefixed path
    pub fn parse(input: &str) -> Result<Self, String> {
        let rest = input
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("expected '#' at start of '{}'", input.trim()))?;

        let root_end = rest
            .char_indices()
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if root_end == 0 {
            return Err(format!("missing variable name in '{}'", input.trim()));
        }
        let root = rest[..root_end].to_string();
        let mut chars = rest[root_end..].char_indices().peekable();

        let mut segments = Vec::new();
        while let Some((start, c)) = chars.next() {
            let offset = root_end + start + 1;
            match c {
                '.' => {
                    let mut name = String::new();
                    while let Some((_, c)) = chars.peek().copied() {
                        if !is_ident_char(c) {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    if name.is_empty() {
                        return Err(format!("empty field name at offset {}", offset));
                    }
                    segments.push(PathSegment::Field(name));
                }
                '[' => {
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some((_, ']')) => break,
                            Some((_, c)) if c.is_ascii_digit() => digits.push(c),
                            _ => return Err(format!("malformed index at offset {}", offset)),
                        }
                    }
                    let index = digits
                        .parse()
                        .map_err(|_| format!("malformed index at offset {}", offset))?;
                    segments.push(PathSegment::Index(index));
                }
                other => return Err(format!("unexpected '{}' at offset {}", other, offset)),
            }
        }

        Ok(Self { root, segments })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Resolve the segments below an already looked-up root value
    pub fn resolve<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        resolve_segments(root, &self.segments)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Display text of a value: strings unquoted, null as empty text
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
