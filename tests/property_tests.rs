mod common;

use common::*;
use openehr_classgen::*;
use proptest::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

proptest! {
    #[test]
    fn class_names_are_pascal_identifiers(raw in "\\PC{0,40}") {
        let pattern = Regex::new(r"^(?:[A-Z]|_[0-9])[A-Za-z0-9]*$").unwrap();
        let name = resolve_class_name(&raw);
        prop_assert!(pattern.is_match(&name), "{raw:?} -> {name:?}");
    }

    #[test]
    fn field_names_are_camel_identifiers(raw in "\\PC{0,40}") {
        let pattern = Regex::new(r"^(?:[a-z]|_[0-9])[A-Za-z0-9]*$").unwrap();
        let name = resolve_field_name(&raw);
        prop_assert!(pattern.is_match(&name), "{raw:?} -> {name:?}");
    }

    #[test]
    fn constant_names_are_upper_snake(raw in "\\PC{0,40}") {
        let pattern = Regex::new(r"^(?:[A-Z]|_[0-9])[A-Z0-9_]*$").unwrap();
        let name = resolve_constant_name(&raw);
        prop_assert!(pattern.is_match(&name), "{raw:?} -> {name:?}");
    }

    #[test]
    fn bracketed_qualifiers_never_reach_names(label in "[a-z ]{1,12}", qualifier in "[a-z0-9.]{1,12}") {
        prop_assert_eq!(
            resolve_class_name(&format!("{label}[{qualifier}]")),
            resolve_class_name(&label)
        );
    }

    #[test]
    fn name_scope_claims_are_unique(bases in prop::collection::vec("[A-C][a-c]{0,2}[0-9]?", 1..40)) {
        let mut scope = NameScope::new();
        let mut seen = HashSet::new();
        for base in &bases {
            let name = scope.claim(base);
            prop_assert!(name.starts_with(base.as_str()));
            prop_assert!(seen.insert(name));
        }
        prop_assert_eq!(scope.len(), bases.len());
    }

    #[test]
    fn multiplicity_follows_occurrences(min in 0u32..4, max in prop::option::of(0u32..6)) {
        let occurrences = Occurrences::new(min, max);
        let multiplicity = Multiplicity::from_occurrences(&occurrences);
        let repeating = max.is_none_or(|max| max > 1);
        prop_assert_eq!(multiplicity.is_collection(), repeating);
        prop_assert_eq!(
            TypeRef::Primitive(PrimitiveType::String).with_multiplicity(multiplicity).is_list(),
            repeating
        );
    }

    #[test]
    fn element_occurrences_drive_field_types(max in prop::option::of(1u32..4)) {
        let element = create_element("at0002", "Note", TemplateNode::new("DV_TEXT"))
            .with_occurrences(0, max);
        let cluster = TemplateNode::new("CLUSTER")
            .with_node_id("openEHR-EHR-CLUSTER.note.v1")
            .with_name("Notes")
            .with_occurrences(0, None)
            .with_attribute("items", vec![element]);
        let template = OperationalTemplate::new("t", create_composition("Encounter", vec![cluster]));
        let result = compile(&template, &GeneratorConfig::default()).unwrap();

        let class = result.class("NotesCluster").unwrap();
        for field in &class.fields {
            prop_assert_eq!(field.type_ref.is_list(), field.multiplicity.is_collection());
        }
        let repeating = max.is_none_or(|max| max > 1);
        prop_assert_eq!(class.field("note").is_some(), repeating);
        prop_assert_eq!(class.field("noteValue").is_some(), !repeating);
    }
}

#[test]
fn test_compilation_is_deterministic() {
    for template in [
        create_blood_pressure_template(),
        create_alternative_events_template(),
        create_recursive_template(),
    ] {
        let first = compile(&template, &GeneratorConfig::default()).unwrap();
        let second = compile(&template, &GeneratorConfig::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json(true).unwrap(), second.to_json(true).unwrap());
    }
}

#[test]
fn test_concurrent_compilations_agree() {
    let generator = Arc::new(ClassGenerator::new(
        GeneratorConfig::new().with_package_name("org.example"),
    ));
    let template = create_alternative_events_template();
    let expected = generator.generate(&template).unwrap().to_json(false).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                let template = &template;
                scope.spawn(move || generator.generate(template).unwrap().to_json(false).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
