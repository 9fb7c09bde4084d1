//! Closed value-set types derived from coded-text constraints.

use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::model::{EnumConstant, EnumDefinition};
use crate::naming::{self, NameScope};
use crate::template::TermEntry;

/// Collects enum definitions for one compilation, one per distinct term set.
#[derive(Debug, Default)]
pub struct EnumExtractor {
    by_content: HashMap<BTreeSet<TermEntry>, String>,
    definitions: IndexMap<String, EnumDefinition>,
    reused: usize,
}

impl EnumExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the name of the enum holding `terms`, creating it under
    /// `base_name` (claimed in `scope`) the first time the term set is seen.
    pub fn extract(&mut self, base_name: &str, terms: &[TermEntry], scope: &mut NameScope) -> String {
        let key: BTreeSet<TermEntry> = terms.iter().cloned().collect();
        if let Some(existing) = self.by_content.get(&key) {
            debug!(enum_name = %existing, "Reusing enum for identical value set");
            self.reused += 1;
            return existing.clone();
        }

        let name = scope.claim(base_name);
        let definition = EnumDefinition {
            name: name.clone(),
            constants: build_constants(terms),
        };
        debug!(
            enum_name = %name,
            constants = definition.constants.len(),
            "Created enum"
        );
        self.by_content.insert(key, name.clone());
        self.definitions.insert(name.clone(), definition);
        name
    }

    pub fn definitions(&self) -> &IndexMap<String, EnumDefinition> {
        &self.definitions
    }

    pub fn into_definitions(self) -> IndexMap<String, EnumDefinition> {
        self.definitions
    }

    pub fn reused(&self) -> usize {
        self.reused
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn build_constants(terms: &[TermEntry]) -> Vec<EnumConstant> {
    let mut scope = NameScope::new();
    let mut seen = BTreeSet::new();
    terms
        .iter()
        .filter(|term| seen.insert(*term))
        .map(|term| {
            let source = if naming::words(&term.value).is_empty() {
                &term.code
            } else {
                &term.value
            };
            EnumConstant {
                name: scope.claim(&naming::resolve_constant_name(source)),
                value: term.value.clone(),
                description: term.description.clone(),
                terminology_id: term.terminology_id.clone(),
                code: term.code.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuff_sizes() -> Vec<TermEntry> {
        vec![
            TermEntry::new("Adult Thigh", "A cuff for adult thighs.", "local", "at1008"),
            TermEntry::new("Large Adult", "A cuff for large adults.", "local", "at1009"),
            TermEntry::new("Adult", "A cuff for adults.", "local", "at1010"),
        ]
    }

    #[test]
    fn test_extract_builds_constants_in_order() {
        let mut scope = NameScope::new();
        let mut extractor = EnumExtractor::new();
        let name = extractor.extract("CuffSizeDefiningcode", &cuff_sizes(), &mut scope);
        assert_eq!(name, "CuffSizeDefiningcode");

        let definition = &extractor.definitions()[&name];
        let names: Vec<_> = definition.constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ADULT_THIGH", "LARGE_ADULT", "ADULT"]);
        assert_eq!(definition.by_code("at1009").unwrap().value, "Large Adult");
    }

    #[test]
    fn test_identical_sets_are_shared_regardless_of_order() {
        let mut scope = NameScope::new();
        let mut extractor = EnumExtractor::new();
        let first = extractor.extract("CuffSizeDefiningcode", &cuff_sizes(), &mut scope);
        let mut reversed = cuff_sizes();
        reversed.reverse();
        let second = extractor.extract("OtherCuffDefiningcode", &reversed, &mut scope);
        assert_eq!(first, second);
        assert_eq!(extractor.len(), 1);
        assert_eq!(extractor.reused(), 1);
        assert!(!scope.contains("OtherCuffDefiningcode"));
    }

    #[test]
    fn test_name_collision_with_different_content() {
        let mut scope = NameScope::new();
        scope.claim("PositionDefiningcode");
        let mut extractor = EnumExtractor::new();
        let name = extractor.extract("PositionDefiningcode", &cuff_sizes(), &mut scope);
        assert_eq!(name, "PositionDefiningcode2");
    }

    #[test]
    fn test_constant_fallback_and_disambiguation() {
        let terms = vec![
            TermEntry::new("???", "", "local", "at0001"),
            TermEntry::new("Sitting", "", "local", "at0002"),
            TermEntry::new("sitting!", "", "local", "at0003"),
        ];
        let mut scope = NameScope::new();
        let mut extractor = EnumExtractor::new();
        let name = extractor.extract("Position", &terms, &mut scope);
        let names: Vec<_> = extractor.definitions()[&name]
            .constants
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["AT0001", "SITTING", "SITTING2"]);
    }
}
