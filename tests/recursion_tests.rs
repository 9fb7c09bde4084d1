mod common;

use common::*;
use openehr_classgen::*;

#[test]
fn test_self_reference_closes_on_the_enclosing_class() {
    let result = compile(&create_recursive_template(), &GeneratorConfig::default()).unwrap();

    let names: Vec<_> = result.classes.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["ReportComposition", "ChapterSection"]);

    let root = result.root().unwrap();
    let chapters = root.field("chapter").unwrap();
    assert_eq!(
        chapters.type_ref,
        TypeRef::list_of(TypeRef::Entity("ChapterSection".into()))
    );
    assert_eq!(chapters.path.to_string(), "/content[openEHR-EHR-SECTION.adhoc.v1]");

    let section = result.class("ChapterSection").unwrap();
    assert_eq!(
        section.field("titleValue").unwrap().path.to_string(),
        "/items[at0001]/value|value"
    );
    let nested = section.field("chapter").unwrap();
    assert_eq!(nested.type_ref, chapters.type_ref);
    assert_eq!(nested.path.to_string(), "/items[openEHR-EHR-SECTION.adhoc.v1]");

    assert_eq!(result.stats.closed_cycles, 1);
    assert_eq!(result.stats.reused_classes, 0);
}

#[test]
fn test_mutual_recursion_through_nested_cluster() {
    let child = TemplateNode::new("CLUSTER")
        .with_node_id("at0002")
        .with_name("Child")
        .with_occurrences(0, None)
        .with_attribute(
            "items",
            vec![TemplateNode::reference("CLUSTER", "/content[openEHR-EHR-CLUSTER.node.v1]")
                .with_occurrences(0, None)],
        );
    let node = TemplateNode::new("CLUSTER")
        .with_node_id("openEHR-EHR-CLUSTER.node.v1")
        .with_name("Node")
        .with_occurrences(0, None)
        .with_attribute(
            "items",
            vec![create_element("at0001", "Label", TemplateNode::new("DV_TEXT")), child],
        );
    let template = OperationalTemplate::new("tree", create_composition("Tree", vec![node]));

    let result = compile(&template, &GeneratorConfig::default()).unwrap();
    let names: Vec<_> = result.classes.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["TreeComposition", "NodeCluster", "ChildCluster"]);

    let child = result.class("ChildCluster").unwrap();
    let back = child.field("node").unwrap();
    assert_eq!(back.type_ref, TypeRef::list_of(TypeRef::Entity("NodeCluster".into())));
    assert_eq!(back.path.to_string(), "/items[openEHR-EHR-CLUSTER.node.v1]");
    assert_eq!(result.stats.closed_cycles, 1);
}

#[test]
fn test_choice_reentered_through_its_variant_closes_on_the_interface() {
    let sub = TemplateNode::new("CLUSTER")
        .with_node_id("at0002")
        .with_name("Sub")
        .with_occurrences(0, None)
        .with_attribute(
            "items",
            vec![create_element("at0003", "Text", TemplateNode::new("DV_TEXT"))],
        );
    let back = TemplateNode::reference("CLUSTER", "/content[openEHR-EHR-CLUSTER.node.v1]")
        .with_node_id("at0002")
        .with_occurrences(0, None);
    let node = TemplateNode::new("CLUSTER")
        .with_node_id("openEHR-EHR-CLUSTER.node.v1")
        .with_name("Node")
        .with_occurrences(0, None)
        .with_attribute(
            "items",
            vec![create_element("at0001", "Label", TemplateNode::new("DV_TEXT")), sub, back],
        );
    let template = OperationalTemplate::new("tree", create_composition("Tree", vec![node]));

    let result = compile(&template, &GeneratorConfig::default()).unwrap();
    let names: Vec<_> = result.classes.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["TreeComposition", "NodeCluster", "SubChoice", "SubCluster", "SubCluster2"]
    );

    let expected = TypeRef::list_of(TypeRef::Choice("SubChoice".into()));
    let outer = result.class("NodeCluster").unwrap().field("sub").unwrap();
    assert_eq!(outer.type_ref, expected);
    assert_eq!(outer.path.to_string(), "/items[at0002]");

    let interface = result.class("SubChoice").unwrap();
    assert_eq!(interface.variants(), ["SubCluster", "SubCluster2"]);
    assert_eq!(interface.rm_type, "CLUSTER");

    let plain = result.class("SubCluster").unwrap();
    assert_eq!(
        plain.field("textValue").unwrap().path.to_string(),
        "/items[at0003]/value|value"
    );
    let recursive = result.class("SubCluster2").unwrap();
    assert!(recursive.field("labelValue").is_some());
    let inner = recursive.field("sub").unwrap();
    assert_eq!(inner.type_ref, expected);
    assert_eq!(inner.path.to_string(), "/items[at0002]");

    assert_eq!(result.stats.closed_cycles, 1);
    assert_eq!(result.stats.choices, 1);
    assert_eq!(result.stats.variants, 2);
}

#[test]
fn test_singleton_reference_is_never_inlined() {
    let section = TemplateNode::new("SECTION")
        .with_node_id("openEHR-EHR-SECTION.adhoc.v1")
        .with_name("Chapter")
        .with_attribute(
            "items",
            vec![
                create_element("at0001", "Title", TemplateNode::new("DV_TEXT")),
                TemplateNode::reference("SECTION", "/content[openEHR-EHR-SECTION.adhoc.v1]"),
            ],
        );
    let template = OperationalTemplate::new("report", create_composition("Report", vec![section]));

    let config = GeneratorConfig::new().with_optimizer_setting(OptimizerSetting::Sections);
    let result = compile(&template, &config).unwrap();

    let root = result.root().unwrap();
    assert!(root.field("titleValue").is_some());
    let nested = root.field("chapter").unwrap();
    assert_eq!(nested.type_ref, TypeRef::Entity("ChapterSection".into()));
    assert_eq!(
        nested.path.to_string(),
        "/content[openEHR-EHR-SECTION.adhoc.v1]/items[openEHR-EHR-SECTION.adhoc.v1]"
    );

    let section = result.class("ChapterSection").unwrap();
    assert_eq!(
        section.field("chapter").unwrap().type_ref,
        TypeRef::Entity("ChapterSection".into())
    );
    assert_eq!(result.stats.closed_cycles, 1);
}

#[test]
fn test_dangling_reference_is_malformed() {
    let definition = create_composition(
        "Report",
        vec![TemplateNode::reference("SECTION", "/content[openEHR-EHR-SECTION.missing.v1]")],
    );
    let err = compile(&OperationalTemplate::new("t", definition), &GeneratorConfig::default())
        .unwrap_err();
    assert!(err.is_malformed_template());
}
