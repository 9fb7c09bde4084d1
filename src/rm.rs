//! Reference-model type catalog.
//!
//! The compiler only needs to know, per RM type name, which category it
//! belongs to and which addressable value components a data value exposes.
//! [`OpenEhrCatalog`] covers the openEHR RM 1.0.x types found in templates;
//! other catalogs can be plugged in through [`RmCatalog`].

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::model::{EntityCategory, EntryKind, PrimitiveType, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmCategory {
    /// Archetypeable structure that may become an entity of its own.
    Entity(EntityCategory),
    /// Leaf data value (`DV_*`, `CODE_PHRASE`).
    DataValue,
    /// Non-archetyped RM object bound whole (party proxy, participation, ...).
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Primitive(PrimitiveType),
    Rm(String),
}

impl ComponentKind {
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Self::Primitive(primitive) => TypeRef::Primitive(*primitive),
            Self::Rm(rm_type) => TypeRef::Rm(rm_type.clone()),
        }
    }
}

/// One addressable part of a data value, e.g. the `magnitude` of a `DV_QUANTITY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueComponent {
    pub attribute: String,
    pub kind: ComponentKind,
}

impl ValueComponent {
    pub fn primitive(attribute: &str, primitive: PrimitiveType) -> Self {
        Self {
            attribute: attribute.to_string(),
            kind: ComponentKind::Primitive(primitive),
        }
    }

    pub fn rm(attribute: &str, rm_type: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            kind: ComponentKind::Rm(rm_type.to_string()),
        }
    }

    /// Word appended to the field label: `defining_code` -> `definingcode`.
    pub fn field_suffix(&self) -> String {
        self.attribute.replace('_', "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmTypeInfo {
    pub rm_type: String,
    pub category: RmCategory,
    /// Empty for data values that are bound whole (intervals, ordinals, ...).
    pub components: Vec<ValueComponent>,
}

impl RmTypeInfo {
    pub fn new(rm_type: &str, category: RmCategory) -> Self {
        Self {
            rm_type: rm_type.to_string(),
            category,
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: ValueComponent) -> Self {
        self.components.push(component);
        self
    }

    pub fn is_data_value(&self) -> bool {
        self.category == RmCategory::DataValue
    }

    pub fn entity_category(&self) -> Option<EntityCategory> {
        match self.category {
            RmCategory::Entity(category) => Some(category),
            _ => None,
        }
    }
}

pub trait RmCatalog {
    fn lookup(&self, rm_type: &str) -> Option<&RmTypeInfo>;

    /// Most general structural type, used for nodes whose type is unknown.
    fn fallback_type(&self) -> &str {
        "LOCATABLE"
    }

    fn contains(&self, rm_type: &str) -> bool {
        self.lookup(rm_type).is_some()
    }
}

static OPENEHR_TYPES: Lazy<HashMap<String, RmTypeInfo>> = Lazy::new(|| {
    use EntityCategory as E;
    use PrimitiveType as P;
    use RmCategory::{DataValue, Entity, Object};

    let value = |rm_type: &str, primitive: P| {
        RmTypeInfo::new(rm_type, DataValue).with_component(ValueComponent::primitive("value", primitive))
    };

    let mut types = vec![
        RmTypeInfo::new("COMPOSITION", Entity(E::Composition)),
        RmTypeInfo::new("SECTION", Entity(E::Section)),
        RmTypeInfo::new("OBSERVATION", Entity(E::Entry(EntryKind::Observation))),
        RmTypeInfo::new("EVALUATION", Entity(E::Entry(EntryKind::Evaluation))),
        RmTypeInfo::new("INSTRUCTION", Entity(E::Entry(EntryKind::Instruction))),
        RmTypeInfo::new("ACTION", Entity(E::Entry(EntryKind::Action))),
        RmTypeInfo::new("ADMIN_ENTRY", Entity(E::Entry(EntryKind::AdminEntry))),
        RmTypeInfo::new("GENERIC_ENTRY", Entity(E::Entry(EntryKind::AdminEntry))),
        RmTypeInfo::new("ACTIVITY", Entity(E::Activity)),
        RmTypeInfo::new("EVENT", Entity(E::Event)),
        RmTypeInfo::new("POINT_EVENT", Entity(E::Event)),
        RmTypeInfo::new("INTERVAL_EVENT", Entity(E::Event)),
        RmTypeInfo::new("CLUSTER", Entity(E::Cluster)),
        RmTypeInfo::new("ELEMENT", Entity(E::Element)),
        RmTypeInfo::new("HISTORY", Entity(E::Structure)),
        RmTypeInfo::new("ITEM_TREE", Entity(E::Structure)),
        RmTypeInfo::new("ITEM_LIST", Entity(E::Structure)),
        RmTypeInfo::new("ITEM_SINGLE", Entity(E::Structure)),
        RmTypeInfo::new("ITEM_TABLE", Entity(E::Structure)),
        RmTypeInfo::new("EVENT_CONTEXT", Entity(E::Structure)),
        RmTypeInfo::new("ISM_TRANSITION", Entity(E::Structure)),
        RmTypeInfo::new("INSTRUCTION_DETAILS", Entity(E::Structure)),
        RmTypeInfo::new("DV_QUANTITY", DataValue)
            .with_component(ValueComponent::primitive("magnitude", P::Double))
            .with_component(ValueComponent::primitive("units", P::String)),
        RmTypeInfo::new("DV_COUNT", DataValue)
            .with_component(ValueComponent::primitive("magnitude", P::Long)),
        value("DV_TEXT", P::String),
        RmTypeInfo::new("DV_CODED_TEXT", DataValue)
            .with_component(ValueComponent::rm("defining_code", "CODE_PHRASE")),
        value("DV_DATE", P::Date),
        value("DV_TIME", P::Time),
        value("DV_DATE_TIME", P::DateTime),
        value("DV_DURATION", P::Duration),
        value("DV_BOOLEAN", P::Boolean),
        value("DV_URI", P::Uri),
        value("DV_EHR_URI", P::Uri),
        RmTypeInfo::new("CODE_PHRASE", DataValue),
        RmTypeInfo::new("DV_INTERVAL", DataValue),
        RmTypeInfo::new("DV_ORDINAL", DataValue),
        RmTypeInfo::new("DV_SCALE", DataValue),
        RmTypeInfo::new("DV_PROPORTION", DataValue),
        RmTypeInfo::new("DV_MULTIMEDIA", DataValue),
        RmTypeInfo::new("DV_PARSABLE", DataValue),
        RmTypeInfo::new("DV_IDENTIFIER", DataValue),
        RmTypeInfo::new("DV_STATE", DataValue),
    ];

    for object in [
        "PARTY_PROXY",
        "PARTY_SELF",
        "PARTY_IDENTIFIED",
        "PARTY_RELATED",
        "PARTICIPATION",
        "FEEDER_AUDIT",
        "LINK",
        "OBJECT_REF",
        "LOCATABLE_REF",
        "ARCHETYPED",
        "AUDIT_DETAILS",
        "TERMINOLOGY_ID",
    ] {
        types.push(RmTypeInfo::new(object, Object));
    }

    types.into_iter().map(|info| (info.rm_type.clone(), info)).collect()
});

/// Built-in catalog of openEHR RM types.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenEhrCatalog;

impl OpenEhrCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl RmCatalog for OpenEhrCatalog {
    fn lookup(&self, rm_type: &str) -> Option<&RmTypeInfo> {
        OPENEHR_TYPES.get(rm_type).or_else(|| {
            // Generic instances (`DV_INTERVAL<DV_QUANTITY>`) resolve by their base type.
            rm_type
                .split_once('<')
                .and_then(|(base, _)| OPENEHR_TYPES.get(base.trim()))
        })
    }
}
