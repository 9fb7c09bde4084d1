use indexmap::IndexMap;
use std::collections::HashMap;

use super::{OperationalTemplate, TemplateNode};
use crate::error::{ClassGenError, Result};
use crate::path::{Path, PathSegment};

/// Validated view of a template with every node addressable by its absolute path.
///
/// Paths are keyed without name predicates: `/content[openEHR-EHR-OBSERVATION.x.v1]/data[at0001]`.
/// When several nodes share a path (id-less siblings) the first in depth-first
/// order owns it.
#[derive(Debug)]
pub struct TemplateIndex<'a> {
    root: &'a TemplateNode,
    nodes: IndexMap<Path, &'a TemplateNode>,
    targets: HashMap<&'a str, &'a TemplateNode>,
}

impl<'a> TemplateIndex<'a> {
    pub fn build(template: &'a OperationalTemplate, max_depth: usize) -> Result<Self> {
        let root = &template.definition;
        if root.is_reference() {
            return Err(ClassGenError::malformed_template(
                root.display_id(),
                "template root must not be a reference",
            ));
        }

        let mut index = Self {
            root,
            nodes: IndexMap::new(),
            targets: HashMap::new(),
        };
        index.collect(root, Path::root(), 0, max_depth)?;
        index.link_references()?;
        Ok(index)
    }

    fn collect(
        &mut self,
        node: &'a TemplateNode,
        path: Path,
        depth: usize,
        max_depth: usize,
    ) -> Result<()> {
        if depth > max_depth {
            return Err(ClassGenError::malformed_template(
                node.display_id(),
                format!("template nesting exceeds the maximum depth of {max_depth}"),
            ));
        }
        check_node(node)?;
        self.nodes.entry(path.clone()).or_insert(node);

        for attribute in &node.attributes {
            for child in &attribute.children {
                let child_path = path.child(PathSegment::step(&attribute.name, child.node_id()));
                self.collect(child, child_path, depth + 1, max_depth)?;
            }
        }
        Ok(())
    }

    fn link_references(&mut self) -> Result<()> {
        let references: Vec<&'a TemplateNode> = all_nodes(self.root)
            .into_iter()
            .filter(|node| node.is_reference())
            .collect();

        for node in references {
            let Some(target_path) = node.target_path.as_deref() else {
                continue;
            };
            if self.targets.contains_key(target_path) {
                continue;
            }
            let target = self.lookup_target(node, target_path)?;
            if target.is_reference() {
                return Err(ClassGenError::malformed_template(
                    node.display_id(),
                    format!("reference target {target_path} is itself a reference"),
                ));
            }
            self.targets.insert(target_path, target);
        }
        Ok(())
    }

    fn lookup_target(&self, node: &TemplateNode, target_path: &str) -> Result<&'a TemplateNode> {
        let path: Path = target_path.parse().map_err(|_| {
            ClassGenError::malformed_template(
                node.display_id(),
                format!("unparsable reference target {target_path}"),
            )
        })?;
        if path.is_terminal() {
            return Err(ClassGenError::malformed_template(
                node.display_id(),
                format!("reference target {target_path} selects a value component"),
            ));
        }
        self.node_at(&path).ok_or_else(|| {
            ClassGenError::malformed_template(
                node.display_id(),
                format!("reference target {target_path} names no node"),
            )
        })
    }

    pub fn root(&self) -> &'a TemplateNode {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_at(&self, path: &Path) -> Option<&'a TemplateNode> {
        self.nodes.get(&path.without_names()).copied()
    }

    /// The node itself, or the node its `target_path` points at.
    pub fn resolve(&self, node: &'a TemplateNode) -> Result<&'a TemplateNode> {
        match node.target_path.as_deref() {
            None => Ok(node),
            Some(target_path) => match self.targets.get(target_path) {
                Some(target) => Ok(target),
                None => self.lookup_target(node, target_path),
            },
        }
    }

    /// Identifier `node` is addressed by: its own, else its reference target's.
    pub fn effective_id(&self, node: &'a TemplateNode) -> Option<&'a str> {
        node.node_id()
            .or_else(|| self.resolve(node).ok().and_then(|target| target.node_id()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.nodes.keys()
    }
}

fn check_node(node: &TemplateNode) -> Result<()> {
    if node.rm_type.trim().is_empty() {
        return Err(ClassGenError::malformed_template(
            node.display_id(),
            "empty RM type name",
        ));
    }
    if !node.occurrences.is_valid() {
        return Err(ClassGenError::malformed_template(
            node.display_id(),
            format!(
                "occurrences lower bound {} exceeds upper bound {}",
                node.occurrences.min,
                node.occurrences.max.unwrap_or_default()
            ),
        ));
    }
    if let Some(attribute) = node.attributes.iter().find(|a| a.name.trim().is_empty()) {
        return Err(ClassGenError::malformed_template(
            node.display_id(),
            format!("empty attribute name with {} children", attribute.children.len()),
        ));
    }
    Ok(())
}

// Id-less siblings share a path key, so walk the tree itself to find every reference.
fn all_nodes(root: &TemplateNode) -> Vec<&TemplateNode> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children());
    }
    out
}
