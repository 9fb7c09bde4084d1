use openehr_classgen::*;

#[allow(dead_code)]
pub fn create_element(node_id: &str, name: &str, value: TemplateNode) -> TemplateNode {
    TemplateNode::new("ELEMENT")
        .with_node_id(node_id)
        .with_name(name)
        .with_occurrences(0, Some(1))
        .with_attribute("value", vec![value])
}

#[allow(dead_code)]
pub fn create_item_tree(node_id: &str, items: Vec<TemplateNode>) -> TemplateNode {
    TemplateNode::new("ITEM_TREE")
        .with_node_id(node_id)
        .with_occurrences(1, Some(1))
        .with_attribute("items", items)
}

#[allow(dead_code)]
pub fn create_composition(name: &str, content: Vec<TemplateNode>) -> TemplateNode {
    TemplateNode::new("COMPOSITION")
        .with_node_id("openEHR-EHR-COMPOSITION.encounter.v1")
        .with_name(name)
        .with_occurrences(1, Some(1))
        .with_attribute("content", content)
}

#[allow(dead_code)]
pub fn create_value_set(terms: &[(&str, &str)]) -> Vec<TermEntry> {
    terms
        .iter()
        .map(|(code, value)| TermEntry::new(*value, format!("{value}."), "local", *code))
        .collect()
}

#[allow(dead_code)]
pub fn create_device_cluster() -> TemplateNode {
    TemplateNode::new("CLUSTER")
        .with_node_id("openEHR-EHR-CLUSTER.device.v1")
        .with_name("Device")
        .with_occurrences(0, None)
        .with_attribute(
            "items",
            vec![create_element("at0001", "Model", TemplateNode::new("DV_TEXT"))],
        )
}

/// Composition -> repeating observation -> quantity element plus repeating cluster.
#[allow(dead_code)]
pub fn create_blood_pressure_template() -> OperationalTemplate {
    let observation = TemplateNode::new("OBSERVATION")
        .with_node_id("openEHR-EHR-OBSERVATION.blood_pressure.v1")
        .with_name("Blood pressure")
        .with_occurrences(0, None)
        .with_attribute(
            "data",
            vec![create_item_tree(
                "at0001",
                vec![
                    create_element("at0004", "Systolic", TemplateNode::new("DV_QUANTITY")),
                    create_device_cluster(),
                ],
            )],
        );

    OperationalTemplate::new("blood_pressure.en.v1", create_composition("Encounter", vec![observation]))
        .with_concept("Blood pressure")
}

/// Observation whose events position admits a point event or an interval event.
#[allow(dead_code)]
pub fn create_alternative_events_template() -> OperationalTemplate {
    let event_data = || {
        create_item_tree(
            "at0003",
            vec![create_element("at0004", "Weight", TemplateNode::new("DV_QUANTITY"))],
        )
    };
    let point_event = TemplateNode::new("POINT_EVENT")
        .with_node_id("at0002")
        .with_name("Any event")
        .with_occurrences(0, None)
        .with_attribute("time", vec![TemplateNode::new("DV_DATE_TIME")])
        .with_attribute("data", vec![event_data()]);
    let interval_event = TemplateNode::new("INTERVAL_EVENT")
        .with_node_id("at0002")
        .with_name("Any event")
        .with_occurrences(0, Some(1))
        .with_attribute("time", vec![TemplateNode::new("DV_DATE_TIME")])
        .with_attribute("data", vec![event_data()])
        .with_attribute("width", vec![TemplateNode::new("DV_DURATION")])
        .with_attribute(
            "math_function",
            vec![TemplateNode::new("DV_CODED_TEXT").with_value_set(create_value_set(&[
                ("146", "mean"),
                ("145", "minimum"),
            ]))],
        );

    let observation = TemplateNode::new("OBSERVATION")
        .with_node_id("openEHR-EHR-OBSERVATION.body_weight.v2")
        .with_name("Body weight")
        .with_attribute(
            "data",
            vec![TemplateNode::new("HISTORY")
                .with_node_id("at0001")
                .with_attribute("origin", vec![TemplateNode::new("DV_DATE_TIME")])
                .with_attribute("events", vec![point_event, interval_event])],
        );

    OperationalTemplate::new("alternative_events", create_composition("Alternative events", vec![observation]))
}

/// Repeating section that contains a reference to itself.
#[allow(dead_code)]
pub fn create_recursive_template() -> OperationalTemplate {
    let section = TemplateNode::new("SECTION")
        .with_node_id("openEHR-EHR-SECTION.adhoc.v1")
        .with_name("Chapter")
        .with_occurrences(0, None)
        .with_attribute(
            "items",
            vec![
                create_element("at0001", "Title", TemplateNode::new("DV_TEXT")),
                TemplateNode::reference("SECTION", "/content[openEHR-EHR-SECTION.adhoc.v1]")
                    .with_occurrences(0, None),
            ],
        );

    OperationalTemplate::new("report", create_composition("Report", vec![section]))
}
