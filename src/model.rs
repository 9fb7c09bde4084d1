//! The class model produced by one compilation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::path::Path;
use crate::template::Occurrences;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Observation,
    Evaluation,
    Instruction,
    Action,
    AdminEntry,
}

/// RM category of a generated entity, replacing the marker interfaces
/// (`CompositionEntity`, `EntryEntity`, ...) of annotation-based generators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "category", content = "entryKind", rename_all = "camelCase")]
pub enum EntityCategory {
    Composition,
    Section,
    Entry(EntryKind),
    Activity,
    Event,
    Cluster,
    Element,
    /// Containment-only structures (histories, item structures, contexts).
    Structure,
}

impl EntityCategory {
    /// Suffix appended to the label when naming a class of this category.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Composition => Some("COMPOSITION"),
            Self::Section => Some("SECTION"),
            Self::Entry(EntryKind::Observation) => Some("OBSERVATION"),
            Self::Entry(EntryKind::Evaluation) => Some("EVALUATION"),
            Self::Entry(EntryKind::Instruction) => Some("INSTRUCTION"),
            Self::Entry(EntryKind::Action) => Some("ACTION"),
            Self::Entry(EntryKind::AdminEntry) => Some("ADMIN_ENTRY"),
            Self::Activity => Some("ACTIVITY"),
            Self::Event => Some("EVENT"),
            Self::Cluster => Some("CLUSTER"),
            Self::Element => Some("ELEMENT"),
            Self::Structure => None,
        }
    }

    /// Abstract RM type every member of this category conforms to.
    pub fn base_type(&self) -> Option<&'static str> {
        match self {
            Self::Composition => Some("COMPOSITION"),
            Self::Section => Some("SECTION"),
            Self::Entry(_) => Some("ENTRY"),
            Self::Activity => Some("ACTIVITY"),
            Self::Event => Some("EVENT"),
            Self::Cluster => Some("CLUSTER"),
            Self::Element => Some("ELEMENT"),
            Self::Structure => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClassKind {
    #[serde(rename_all = "camelCase")]
    Entity {
        category: EntityCategory,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        archetype_id: Option<String>,
    },
    /// Closed set of mutually exclusive shapes for one template position.
    ChoiceInterface { variants: Vec<String> },
    ChoiceVariant { interface: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Long,
    Double,
    Boolean,
    Date,
    Time,
    DateTime,
    Duration,
    Uri,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::Duration => "Duration",
            Self::Uri => "URI",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "of", rename_all = "camelCase")]
pub enum TypeRef {
    Primitive(PrimitiveType),
    /// Whole RM object, by RM type name (`PARTY_PROXY`).
    Rm(String),
    Enum(String),
    Entity(String),
    Choice(String),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn list_of(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Element type of a list, or the type itself.
    pub fn item(&self) -> &TypeRef {
        match self {
            Self::List(inner) => inner.item(),
            other => other,
        }
    }

    /// Name of the generated class or enum this type points at, if any.
    pub fn referenced_name(&self) -> Option<&str> {
        match self.item() {
            Self::Enum(name) | Self::Entity(name) | Self::Choice(name) => Some(name),
            _ => None,
        }
    }

    pub fn with_multiplicity(self, multiplicity: Multiplicity) -> Self {
        match multiplicity {
            Multiplicity::Single => self,
            Multiplicity::Collection => Self::list_of(self),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => write!(f, "{primitive}"),
            Self::Rm(rm_type) => f.write_str(&rm_type_display_name(rm_type)),
            Self::Enum(name) | Self::Entity(name) | Self::Choice(name) => f.write_str(name),
            Self::List(inner) => write!(f, "List<{inner}>"),
        }
    }
}

/// `PARTY_PROXY` -> `PartyProxy`, `DV_CODED_TEXT` -> `DvCodedText`.
pub fn rm_type_display_name(rm_type: &str) -> String {
    rm_type
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let lower = part.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Multiplicity {
    Single,
    Collection,
}

impl Multiplicity {
    pub fn from_occurrences(occurrences: &Occurrences) -> Self {
        if occurrences.is_repeating() {
            Self::Collection
        } else {
            Self::Single
        }
    }

    pub fn is_collection(self) -> bool {
        self == Self::Collection
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub type_ref: TypeRef,
    pub path: Path,
    pub multiplicity: Multiplicity,
    pub rm_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: ClassKind,
    pub rm_type: String,
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ClassDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_at(&self, path: &Path) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| &field.path == path)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn category(&self) -> Option<EntityCategory> {
        match &self.kind {
            ClassKind::Entity { category, .. } => Some(*category),
            _ => None,
        }
    }

    pub fn variants(&self) -> &[String] {
        match &self.kind {
            ClassKind::ChoiceInterface { variants } => variants,
            _ => &[],
        }
    }

    pub fn is_choice_interface(&self) -> bool {
        matches!(self.kind, ClassKind::ChoiceInterface { .. })
    }

    pub fn is_choice_variant(&self) -> bool {
        matches!(self.kind, ClassKind::ChoiceVariant { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnumConstant {
    pub name: String,
    pub value: String,
    pub description: String,
    pub terminology_id: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnumDefinition {
    pub name: String,
    pub constants: Vec<EnumConstant>,
}

impl EnumDefinition {
    pub fn constant(&self, name: &str) -> Option<&EnumConstant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn by_code(&self, code: &str) -> Option<&EnumConstant> {
        self.constants.iter().find(|c| c.code == code)
    }
}

/// Non-fatal finding reported alongside a complete result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "warning", rename_all = "camelCase")]
pub enum CompileWarning {
    #[serde(rename_all = "camelCase")]
    UnresolvedType {
        node_id: Option<String>,
        rm_type: String,
        class_name: String,
        path: Path,
    },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedType {
                node_id,
                rm_type,
                class_name,
                path,
            } => write!(
                f,
                "unresolved RM type {rm_type} at {class_name}{path} (node {}); bound as opaque passthrough",
                node_id.as_deref().unwrap_or("-")
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompilationStats {
    pub entities: usize,
    pub choices: usize,
    pub variants: usize,
    pub enums: usize,
    pub reused_classes: usize,
    pub reused_enums: usize,
    pub closed_cycles: usize,
    pub fields: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    pub template_id: String,
    pub package_name: String,
    pub root_class: String,
    pub classes: IndexMap<String, ClassDefinition>,
    pub enums: IndexMap<String, EnumDefinition>,
    pub warnings: Vec<CompileWarning>,
    pub stats: CompilationStats,
}

impl CompilationResult {
    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(name)
    }

    pub fn enum_definition(&self, name: &str) -> Option<&EnumDefinition> {
        self.enums.get(name)
    }

    pub fn root(&self) -> Option<&ClassDefinition> {
        self.classes.get(&self.root_class)
    }

    /// `package.Name`, or the bare name when no package is configured.
    pub fn qualified_name(&self, name: &str) -> String {
        if self.package_name.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.package_name, name)
        }
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &ClassDefinition> {
        self.classes.values().filter(|c| c.is_choice_interface())
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn to_json(&self, pretty: bool) -> crate::error::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_display() {
        assert_eq!(TypeRef::Primitive(PrimitiveType::Double).to_string(), "Double");
        assert_eq!(TypeRef::Rm("PARTY_PROXY".into()).to_string(), "PartyProxy");
        assert_eq!(
            TypeRef::list_of(TypeRef::Entity("DeviceCluster".into())).to_string(),
            "List<DeviceCluster>"
        );
        assert_eq!(TypeRef::Primitive(PrimitiveType::Uri).to_string(), "URI");
    }

    #[test]
    fn test_type_ref_helpers() {
        let list = TypeRef::Choice("AnyEventChoice".into()).with_multiplicity(Multiplicity::Collection);
        assert!(list.is_list());
        assert_eq!(list.referenced_name(), Some("AnyEventChoice"));
        assert_eq!(TypeRef::Rm("CODE_PHRASE".into()).referenced_name(), None);
    }

    #[test]
    fn test_multiplicity_from_occurrences() {
        assert_eq!(
            Multiplicity::from_occurrences(&Occurrences::unbounded(1)),
            Multiplicity::Collection
        );
        assert_eq!(
            Multiplicity::from_occurrences(&Occurrences::mandatory()),
            Multiplicity::Single
        );
    }

    #[test]
    fn test_category_suffix() {
        assert_eq!(
            EntityCategory::Entry(EntryKind::AdminEntry).suffix(),
            Some("ADMIN_ENTRY")
        );
        assert_eq!(EntityCategory::Structure.suffix(), None);
    }

    #[test]
    fn test_category_base_type() {
        assert_eq!(EntityCategory::Event.base_type(), Some("EVENT"));
        assert_eq!(
            EntityCategory::Entry(EntryKind::Observation).base_type(),
            EntityCategory::Entry(EntryKind::Action).base_type()
        );
        assert_eq!(EntityCategory::Entry(EntryKind::Action).base_type(), Some("ENTRY"));
        assert_eq!(EntityCategory::Structure.base_type(), None);
    }

    #[test]
    fn test_qualified_name() {
        let mut result = CompilationResult {
            template_id: "t".into(),
            package_name: String::new(),
            root_class: "VitalSignsComposition".into(),
            classes: IndexMap::new(),
            enums: IndexMap::new(),
            warnings: Vec::new(),
            stats: CompilationStats::default(),
        };
        assert_eq!(result.qualified_name("Foo"), "Foo");
        result.package_name = "org.example".into();
        assert_eq!(result.qualified_name("Foo"), "org.example.Foo");
    }
}
