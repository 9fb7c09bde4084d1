//! Read-only model of an openEHR operational template.

pub mod index;

pub use index::TemplateIndex;

use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;

use crate::error::Result;

/// Occurrence bounds of a node; `max = None` is unbounded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Occurrences {
    pub min: u32,
    pub max: Option<u32>,
}

impl Default for Occurrences {
    fn default() -> Self {
        Self {
            min: 0,
            max: Some(1),
        }
    }
}

impl Occurrences {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    pub fn mandatory() -> Self {
        Self::new(1, Some(1))
    }

    pub fn unbounded(min: u32) -> Self {
        Self::new(min, None)
    }

    /// Upper bound above one, or no upper bound at all.
    pub fn is_repeating(&self) -> bool {
        self.max.is_none_or(|max| max > 1)
    }

    pub fn is_valid(&self) -> bool {
        self.max.is_none_or(|max| self.min <= max)
    }
}

/// One term of an inline value-set constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct TermEntry {
    pub value: String,
    #[serde(default)]
    pub description: String,
    pub terminology_id: String,
    pub code: String,
}

impl TermEntry {
    pub fn new(
        value: impl Into<String>,
        description: impl Into<String>,
        terminology_id: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
            terminology_id: terminology_id.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateAttribute {
    pub name: String,
    #[serde(default)]
    pub children: Vec<TemplateNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub rm_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub occurrences: Occurrences,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<TemplateAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_set: Vec<TermEntry>,
    /// Internal reference to another node of the same template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
}

impl TemplateNode {
    pub fn new(rm_type: impl Into<String>) -> Self {
        Self {
            node_id: None,
            rm_type: rm_type.into(),
            name: None,
            occurrences: Occurrences::default(),
            attributes: Vec::new(),
            value_set: Vec::new(),
            target_path: None,
        }
    }

    /// A node standing in for the node found at `target_path`.
    pub fn reference(rm_type: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            target_path: Some(target_path.into()),
            ..Self::new(rm_type)
        }
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_occurrences(mut self, min: u32, max: Option<u32>) -> Self {
        self.occurrences = Occurrences::new(min, max);
        self
    }

    /// Appends children to the named attribute, creating it on first use.
    pub fn with_attribute(mut self, name: impl Into<String>, children: Vec<TemplateNode>) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attribute) => attribute.children.extend(children),
            None => self.attributes.push(TemplateAttribute { name, children }),
        }
        self
    }

    pub fn with_value_set(mut self, terms: Vec<TermEntry>) -> Self {
        self.value_set = terms;
        self
    }

    pub fn is_reference(&self) -> bool {
        self.target_path.is_some()
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }

    pub fn attribute(&self, name: &str) -> Option<&TemplateAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn children(&self) -> impl Iterator<Item = &TemplateNode> {
        self.attributes.iter().flat_map(|a| a.children.iter())
    }

    pub fn has_constrained_attributes(&self) -> bool {
        self.attributes.iter().any(|a| !a.children.is_empty())
    }

    /// Identifier used in error reports; falls back to the RM type.
    pub fn display_id(&self) -> &str {
        self.node_id.as_deref().unwrap_or(&self.rm_type)
    }

    /// Archetype identifier, when this node is an archetype root.
    pub fn archetype_id(&self) -> Option<&str> {
        self.node_id().filter(|id| id.starts_with("openEHR-"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationalTemplate {
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    pub definition: TemplateNode,
}

impl OperationalTemplate {
    pub fn new(template_id: impl Into<String>, definition: TemplateNode) -> Self {
        Self {
            template_id: template_id.into(),
            concept: None,
            definition,
        }
    }

    pub fn with_concept(mut self, concept: impl Into<String>) -> Self {
        self.concept = Some(concept.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<FsPath>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
