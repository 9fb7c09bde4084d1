//! Structural fingerprints of template subtrees.
//!
//! Two subtrees with the same signature compile to the same class. The node's
//! own label and occurrences are left out so that one archetype used at
//! several positions is generated once; references contribute their target
//! path instead of being followed, which keeps every signature finite.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::template::{Occurrences, TemplateNode};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructuralSignature(String);

impl StructuralSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex digits, for logging.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for StructuralSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes and caches node signatures for one compilation.
///
/// Entries are keyed by node address; nodes are borrowed for the signer's
/// lifetime, so addresses stay stable.
#[derive(Debug, Default)]
pub struct Signer<'a> {
    cache: HashMap<usize, StructuralSignature>,
    _nodes: PhantomData<&'a TemplateNode>,
}

impl<'a> Signer<'a> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            _nodes: PhantomData,
        }
    }

    pub fn node(&mut self, node: &'a TemplateNode) -> StructuralSignature {
        let key = node as *const TemplateNode as usize;
        if let Some(signature) = self.cache.get(&key) {
            return signature.clone();
        }

        let mut hasher = Sha256::new();
        field(&mut hasher, "rm", &node.rm_type);
        field(&mut hasher, "id", node.node_id().unwrap_or_default());
        for term in &node.value_set {
            field(&mut hasher, "term.value", &term.value);
            field(&mut hasher, "term.description", &term.description);
            field(&mut hasher, "term.terminology", &term.terminology_id);
            field(&mut hasher, "term.code", &term.code);
        }
        if let Some(target) = node.target_path.as_deref() {
            field(&mut hasher, "ref", target);
        }
        for attribute in &node.attributes {
            field(&mut hasher, "attr", &attribute.name);
            for child in &attribute.children {
                let child_signature = self.node(child);
                child_entry(&mut hasher, child.name.as_deref(), &child.occurrences, &child_signature);
            }
        }

        let signature = finish(hasher);
        self.cache.insert(key, signature.clone());
        signature
    }

    /// Signature of a choice position: its label plus every alternative.
    pub fn choice(&mut self, label: &str, alternatives: &[&'a TemplateNode]) -> StructuralSignature {
        let mut hasher = Sha256::new();
        field(&mut hasher, "choice", label);
        for &alternative in alternatives {
            let signature = self.node(alternative);
            child_entry(
                &mut hasher,
                alternative.name.as_deref(),
                &alternative.occurrences,
                &signature,
            );
        }
        finish(hasher)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn field(hasher: &mut Sha256, tag: &str, value: &str) {
    hasher.update(tag.as_bytes());
    hasher.update(b"=");
    hasher.update(value.len().to_le_bytes());
    hasher.update(value.as_bytes());
    hasher.update(b";");
}

fn child_entry(
    hasher: &mut Sha256,
    name: Option<&str>,
    occurrences: &Occurrences,
    signature: &StructuralSignature,
) {
    field(hasher, "child.name", name.unwrap_or_default());
    let bounds = match occurrences.max {
        Some(max) => format!("{}..{max}", occurrences.min),
        None => format!("{}..*", occurrences.min),
    };
    field(hasher, "child.occurrences", &bounds);
    field(hasher, "child.signature", signature.as_str());
}

fn finish(hasher: Sha256) -> StructuralSignature {
    StructuralSignature(format!("{:x}", hasher.finalize()))
}
