//! Generation strategy per template node.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::config::OptimizerSetting;
use crate::model::{EntityCategory, Multiplicity};
use crate::rm::{RmCatalog, RmCategory, ValueComponent};
use crate::template::{TemplateAttribute, TemplateIndex, TemplateNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStrategy {
    /// Coded value constrained to an inline value set.
    Enum,
    /// Data value with one field per component; no components binds the value whole.
    Scalar(Vec<ValueComponent>),
    /// RM object bound whole, typed to its RM type.
    Passthrough(String),
    /// RM type unknown to the catalog.
    Unresolved,
    /// Singleton element whose value fields are inlined into the owner.
    ElementValue,
    /// Singleton container whose children are inlined into the owner.
    Flatten,
    Nested(EntityCategory),
}

fn is_coded(rm_type: &str) -> bool {
    matches!(rm_type, "DV_CODED_TEXT" | "CODE_PHRASE")
}

/// Decides how `node` is generated. `node` is already resolved when it
/// stands in for a reference; references are never inlined.
pub fn classify(
    node: &TemplateNode,
    catalog: &dyn RmCatalog,
    optimizer: OptimizerSetting,
    multiplicity: Multiplicity,
    is_reference: bool,
    is_root: bool,
) -> NodeStrategy {
    if is_coded(&node.rm_type) && !node.value_set.is_empty() {
        return NodeStrategy::Enum;
    }

    let Some(info) = catalog.lookup(&node.rm_type) else {
        return NodeStrategy::Unresolved;
    };

    let category = match info.category {
        RmCategory::DataValue => return NodeStrategy::Scalar(info.components.clone()),
        RmCategory::Object => return NodeStrategy::Passthrough(info.rm_type.clone()),
        RmCategory::Entity(category) => category,
    };

    if is_root || is_reference {
        return NodeStrategy::Nested(category);
    }
    if !node.has_constrained_attributes() {
        return NodeStrategy::Passthrough(info.rm_type.clone());
    }
    if multiplicity.is_collection() {
        return NodeStrategy::Nested(category);
    }

    match category {
        EntityCategory::Element => NodeStrategy::ElementValue,
        EntityCategory::Structure => NodeStrategy::Flatten,
        EntityCategory::Section if optimizer.inlines_sections() => NodeStrategy::Flatten,
        EntityCategory::Entry(_)
        | EntityCategory::Cluster
        | EntityCategory::Activity
        | EntityCategory::Event
            if optimizer.inlines_all() =>
        {
            NodeStrategy::Flatten
        }
        other => NodeStrategy::Nested(other),
    }
}

/// Children of one attribute that occupy the same template position.
#[derive(Debug, Clone, PartialEq)]
pub enum Alternatives<'a> {
    Single(&'a TemplateNode),
    /// Same RM type, told apart by name predicates.
    Named(Vec<&'a TemplateNode>),
    Choice(Vec<&'a TemplateNode>),
}

impl<'a> Alternatives<'a> {
    pub fn nodes(&self) -> Vec<&'a TemplateNode> {
        match self {
            Self::Single(node) => vec![*node],
            Self::Named(nodes) | Self::Choice(nodes) => nodes.clone(),
        }
    }
}

/// Partitions the children of `attribute` by the id they are addressed by
/// (a reference without an id of its own takes its target's). Id-less
/// children form one group; groups of one stay plain.
pub fn group_alternatives<'a>(
    attribute: &'a TemplateAttribute,
    index: &TemplateIndex<'a>,
) -> Vec<Alternatives<'a>> {
    let mut groups: IndexMap<Option<&'a str>, Vec<&'a TemplateNode>> = IndexMap::new();
    for child in &attribute.children {
        groups.entry(index.effective_id(child)).or_default().push(child);
    }

    groups
        .into_values()
        .map(|members| {
            if members.len() == 1 {
                Alternatives::Single(members[0])
            } else if are_named_siblings(&members) {
                Alternatives::Named(members)
            } else {
                Alternatives::Choice(members)
            }
        })
        .collect()
}

fn are_named_siblings(members: &[&TemplateNode]) -> bool {
    let rm_type = &members[0].rm_type;
    let mut names = HashSet::new();
    members
        .iter()
        .all(|m| &m.rm_type == rm_type && m.label().is_some_and(|name| names.insert(name)))
}
