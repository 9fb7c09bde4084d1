//! Symbolic access paths into instance trees.
//!
//! A [`Path`] is rooted at the node of the class that owns the field. Each
//! structural [`PathSegment::Step`] names the RM attribute that was traversed,
//! optionally qualified by the node identifier and a name predicate; a
//! trailing [`PathSegment::Value`] selects one component of a data value.
//!
//! Text form: `/data[at0001]/events[at0002]/data[at0003]/items[at0004]/value|magnitude`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClassGenError, Result};

static STEP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/([A-Za-z_][A-Za-z0-9_]*)(?:\[([^,'\]]*)(?:,\s*'((?:[^'\\]|\\.)*)')?\])?")
        .expect("step pattern is a valid regex")
});

static VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|([A-Za-z_][A-Za-z0-9_]*)$").expect("value pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Step {
        attribute: String,
        node_id: Option<String>,
        name: Option<String>,
    },
    Value(String),
}

impl PathSegment {
    pub fn step(attribute: impl Into<String>, node_id: Option<&str>) -> Self {
        Self::Step {
            attribute: attribute.into(),
            node_id: node_id.map(str::to_string),
            name: None,
        }
    }

    pub fn named_step(attribute: impl Into<String>, node_id: Option<&str>, name: &str) -> Self {
        Self::Step {
            attribute: attribute.into(),
            node_id: node_id.map(str::to_string),
            name: Some(name.to_string()),
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step {
                attribute,
                node_id,
                name,
            } => {
                write!(f, "/{attribute}")?;
                match (node_id, name) {
                    (Some(id), Some(name)) => write!(f, "[{id},'{}']", escape_name(name)),
                    (Some(id), None) => write!(f, "[{id}]"),
                    (None, Some(name)) => write!(f, "[,'{}']", escape_name(name)),
                    (None, None) => Ok(()),
                }
            }
            Self::Value(component) => write!(f, "|{component}"),
        }
    }
}

fn escape_name(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

fn unescape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True once a value component has been selected; such a path cannot be extended.
    pub fn is_terminal(&self) -> bool {
        self.segments.last().is_some_and(PathSegment::is_value)
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn with_value(&self, component: impl Into<String>) -> Self {
        self.child(PathSegment::Value(component.into()))
    }

    /// Same path with name predicates dropped, as used for node lookups.
    pub fn without_names(&self) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Step {
                    attribute, node_id, ..
                } => PathSegment::Step {
                    attribute: attribute.clone(),
                    node_id: node_id.clone(),
                    name: None,
                },
                other => other.clone(),
            })
            .collect();
        Self { segments }
    }

    pub fn last_attribute(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Step { attribute, .. } => Some(attribute.as_str()),
            PathSegment::Value(_) => None,
        })
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = ClassGenError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ClassGenError::invalid_path(s));
        }
        if text == "/" {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut rest = text;
        while rest.starts_with('/') {
            let captures = STEP_PATTERN
                .captures(rest)
                .ok_or_else(|| ClassGenError::invalid_path(s))?;
            let whole = captures
                .get(0)
                .ok_or_else(|| ClassGenError::invalid_path(s))?;
            let attribute = captures[1].to_string();
            let node_id = captures
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            let name = captures.get(3).map(|m| unescape_name(m.as_str()));
            segments.push(PathSegment::Step {
                attribute,
                node_id,
                name,
            });
            rest = &rest[whole.end()..];
        }

        if !rest.is_empty() {
            let captures = VALUE_PATTERN
                .captures(rest)
                .ok_or_else(|| ClassGenError::invalid_path(s))?;
            segments.push(PathSegment::Value(captures[1].to_string()));
        }

        Ok(Self { segments })
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
