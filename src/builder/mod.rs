//! Entity model builder.
//!
//! Walks the template depth-first, children in declaration order, and turns
//! every node into fields of the class that owns it. Composite nodes that are
//! not inlined become classes of their own; those classes are memoised by
//! structural signature, which both deduplicates repeated archetypes and
//! closes cycles introduced by internal references.

pub mod context;

pub use context::CompilationContext;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::classify::{Alternatives, NodeStrategy, classify, group_alternatives};
use crate::config::GeneratorConfig;
use crate::error::{ClassGenError, Result};
use crate::model::{
    ClassDefinition, ClassKind, CompilationResult, CompileWarning, EntityCategory,
    FieldDefinition, Multiplicity, TypeRef,
};
use crate::naming::{NameScope, resolve_class_name, resolve_field_name};
use crate::path::{Path, PathSegment};
use crate::rm::{OpenEhrCatalog, RmCatalog};
use crate::template::{OperationalTemplate, TemplateIndex, TemplateNode};

/// Compiles operational templates into class models.
///
/// Holds no per-compilation state; one generator can serve concurrent
/// [`ClassGenerator::generate`] calls.
#[derive(Clone)]
pub struct ClassGenerator {
    config: GeneratorConfig,
    catalog: Arc<dyn RmCatalog + Send + Sync>,
}

impl std::fmt::Debug for ClassGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ClassGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl ClassGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            catalog: Arc::new(OpenEhrCatalog::new()),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn RmCatalog + Send + Sync>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn generate(&self, template: &OperationalTemplate) -> Result<CompilationResult> {
        self.config.validate()?;
        info!(
            template_id = %template.template_id,
            optimizer = ?self.config.optimizer_setting,
            "Compiling operational template"
        );

        let index = TemplateIndex::build(template, self.config.max_depth)?;
        let catalog: &dyn RmCatalog = self.catalog.as_ref();
        let ctx = CompilationContext::new(&self.config, catalog, index);
        let (result, elapsed) = EntityModelBuilder { ctx }.build(template)?;

        info!(
            template_id = %result.template_id,
            root = %result.root_class,
            classes = result.classes.len(),
            enums = result.enums.len(),
            warnings = result.warnings.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Compilation finished"
        );
        Ok(result)
    }
}

/// Where the walk currently is, relative to the class being filled.
#[derive(Debug, Clone)]
struct Position {
    path: Path,
    trail: String,
    /// Label of the singleton element whose value is being inlined.
    element_label: Option<String>,
    /// Identifier of that element, reported for errors on its value fields.
    element_id: Option<String>,
}

impl Position {
    fn root(trail: &str) -> Self {
        Self {
            path: Path::root(),
            trail: trail.to_string(),
            element_label: None,
            element_id: None,
        }
    }

    /// Field label and trail for a child reached over `attribute`.
    fn labels(&self, own: &str, attribute: &str) -> (String, String) {
        match &self.element_label {
            Some(element) if attribute == "value" => (element.clone(), self.trail.clone()),
            Some(element) => (format!("{element} {own}"), format!("{}/{own}", self.trail)),
            None => (own.to_string(), format!("{}/{own}", self.trail)),
        }
    }
}

/// One template node at one position, about to become fields.
struct Site<'a> {
    source: &'a TemplateNode,
    resolved: &'a TemplateNode,
    label: String,
    path: Path,
    trail: String,
    multiplicity: Multiplicity,
    element_id: Option<String>,
}

impl Site<'_> {
    /// Node reported when a field of this site is rejected. Data values carry
    /// no id of their own and report their element's.
    fn display_id(&self) -> &str {
        self.source
            .node_id()
            .or(self.resolved.node_id())
            .or(self.element_id.as_deref())
            .unwrap_or(self.resolved.rm_type.as_str())
    }

    fn field(&self, raw_name: impl Into<String>, type_ref: TypeRef, path: Path) -> FieldDefinition {
        FieldDefinition {
            name: raw_name.into(),
            type_ref: type_ref.with_multiplicity(self.multiplicity),
            path,
            multiplicity: self.multiplicity,
            rm_type: self.resolved.rm_type.clone(),
            description: Some(self.trail.clone()),
        }
    }
}

/// Fields of one class under construction.
struct FieldCollector {
    class_name: String,
    names: NameScope,
    paths: HashSet<Path>,
    fields: Vec<FieldDefinition>,
}

impl FieldCollector {
    fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            names: NameScope::new(),
            paths: HashSet::new(),
            fields: Vec::new(),
        }
    }

    /// Adds `field`, whose `name` still holds the raw label.
    fn push(&mut self, node_id: &str, mut field: FieldDefinition) -> Result<()> {
        if !self.paths.insert(field.path.clone()) {
            return Err(ClassGenError::malformed_template(
                node_id,
                format!("two fields of {} share the path {}", self.class_name, field.path),
            ));
        }
        field.name = self.names.claim(&resolve_field_name(&field.name));
        self.fields.push(field);
        Ok(())
    }
}

struct EntityModelBuilder<'a> {
    ctx: CompilationContext<'a>,
}

impl<'a> EntityModelBuilder<'a> {
    fn build(
        mut self,
        template: &'a OperationalTemplate,
    ) -> Result<(CompilationResult, std::time::Duration)> {
        let root = self.ctx.index.root();
        let label = root
            .label()
            .or(template.concept.as_deref())
            .unwrap_or(&template.template_id)
            .to_string();

        let strategy = classify(
            root,
            self.ctx.catalog,
            self.ctx.config.optimizer_setting,
            Multiplicity::Single,
            false,
            true,
        );
        let NodeStrategy::Nested(category) = strategy else {
            return Err(ClassGenError::malformed_template(
                root.display_id(),
                format!("template root {} is not an archetyped structure", root.rm_type),
            ));
        };

        let root_class = self.build_class(root, category, &label, &label)?;
        let elapsed = self.ctx.elapsed();
        Ok((self.ctx.finish(&template.template_id, root_class), elapsed))
    }

    fn build_class(
        &mut self,
        node: &'a TemplateNode,
        category: EntityCategory,
        label: &str,
        trail: &str,
    ) -> Result<String> {
        let signature = self.ctx.signer.node(node);
        if let Some(name) = self.ctx.memoised(&signature) {
            return Ok(name);
        }

        let suffix = category.suffix().unwrap_or(&node.rm_type);
        let name = self
            .ctx
            .names
            .claim(&resolve_class_name(&format!("{label}_{suffix}")));
        self.ctx.begin_class(
            signature,
            ClassDefinition {
                name: name.clone(),
                kind: ClassKind::Entity {
                    category,
                    archetype_id: node.archetype_id().map(str::to_string),
                },
                rm_type: node.rm_type.clone(),
                fields: Vec::new(),
                description: Some(trail.to_string()),
            },
        );

        let mut fields = FieldCollector::new(&name);
        self.collect_attributes(node, &Position::root(trail), &mut fields)?;
        self.ctx.end_class(&name, fields.fields);
        Ok(name)
    }

    fn collect_attributes(
        &mut self,
        node: &'a TemplateNode,
        position: &Position,
        fields: &mut FieldCollector,
    ) -> Result<()> {
        for attribute in &node.attributes {
            for group in group_alternatives(attribute, &self.ctx.index) {
                match group {
                    Alternatives::Single(child) => {
                        self.collect_child(&attribute.name, child, false, position, fields)?
                    }
                    Alternatives::Named(children) => {
                        for child in children {
                            self.collect_child(&attribute.name, child, true, position, fields)?;
                        }
                    }
                    Alternatives::Choice(children) => {
                        self.collect_choice(&attribute.name, &children, position, fields)?
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_child(
        &mut self,
        attribute: &str,
        child: &'a TemplateNode,
        named: bool,
        position: &Position,
        fields: &mut FieldCollector,
    ) -> Result<()> {
        let resolved = self.ctx.index.resolve(child)?;
        let own = child.label().or(resolved.label()).unwrap_or(attribute);
        let (label, trail) = position.labels(own, attribute);
        let node_id = self.ctx.index.effective_id(child);
        let step = match child.label() {
            Some(name) if named => PathSegment::named_step(attribute, node_id, name),
            _ => PathSegment::step(attribute, node_id),
        };
        let multiplicity = Multiplicity::from_occurrences(&child.occurrences);

        let strategy = classify(
            resolved,
            self.ctx.catalog,
            self.ctx.config.optimizer_setting,
            multiplicity,
            child.is_reference(),
            false,
        );
        let site = Site {
            source: child,
            resolved,
            label,
            path: position.path.child(step),
            trail,
            multiplicity,
            element_id: position.element_id.clone(),
        };
        self.emit(site, strategy, fields)
    }

    fn emit(&mut self, site: Site<'a>, strategy: NodeStrategy, fields: &mut FieldCollector) -> Result<()> {
        let label = site.label.as_str();
        match strategy {
            NodeStrategy::Enum => {
                let (raw, path) = if site.resolved.rm_type == "DV_CODED_TEXT" {
                    (format!("{label}_definingcode"), site.path.with_value("defining_code"))
                } else {
                    (label.to_string(), site.path.clone())
                };
                let enum_name = self.ctx.enums.extract(
                    &resolve_class_name(&raw),
                    &site.resolved.value_set,
                    &mut self.ctx.names,
                );
                fields.push(site.display_id(), site.field(raw, TypeRef::Enum(enum_name), path))
            }
            NodeStrategy::Scalar(components) if components.is_empty() => {
                let type_ref = TypeRef::Rm(site.resolved.rm_type.clone());
                fields.push(site.display_id(), site.field(label, type_ref, site.path.clone()))
            }
            NodeStrategy::Scalar(components) => {
                for component in &components {
                    let field = site.field(
                        format!("{label}_{}", component.field_suffix()),
                        component.kind.type_ref(),
                        site.path.with_value(&component.attribute),
                    );
                    fields.push(site.display_id(), field)?;
                }
                Ok(())
            }
            NodeStrategy::Passthrough(rm_type) => {
                fields.push(site.display_id(), site.field(label, TypeRef::Rm(rm_type), site.path.clone()))
            }
            NodeStrategy::Unresolved => {
                self.ctx.add_warning(CompileWarning::UnresolvedType {
                    node_id: site.source.node_id().map(str::to_string),
                    rm_type: site.resolved.rm_type.clone(),
                    class_name: fields.class_name.clone(),
                    path: site.path.clone(),
                });
                let type_ref = TypeRef::Rm(self.ctx.catalog.fallback_type().to_string());
                fields.push(site.display_id(), site.field(label, type_ref, site.path.clone()))
            }
            NodeStrategy::ElementValue => {
                let inner = Position {
                    path: site.path.clone(),
                    trail: site.trail.clone(),
                    element_label: Some(site.label.clone()),
                    element_id: Some(site.display_id().to_string()),
                };
                self.collect_attributes(site.resolved, &inner, fields)
            }
            NodeStrategy::Flatten => {
                let inner = Position {
                    path: site.path.clone(),
                    trail: site.trail.clone(),
                    element_label: None,
                    element_id: None,
                };
                self.collect_attributes(site.resolved, &inner, fields)
            }
            NodeStrategy::Nested(category) => {
                let class_name = self.build_class(site.resolved, category, label, &site.trail)?;
                fields.push(
                    site.display_id(),
                    site.field(label, TypeRef::Entity(class_name), site.path.clone()),
                )
            }
        }
    }

    fn collect_choice(
        &mut self,
        attribute: &str,
        alternatives: &[&'a TemplateNode],
        position: &Position,
        fields: &mut FieldCollector,
    ) -> Result<()> {
        let first = alternatives[0];
        let resolved_first = self.ctx.index.resolve(first)?;
        let own = first.label().or(resolved_first.label()).unwrap_or(attribute);
        let (label, trail) = position.labels(own, attribute);

        let multiplicity = if alternatives.iter().any(|a| a.occurrences.is_repeating()) {
            Multiplicity::Collection
        } else {
            Multiplicity::Single
        };
        let ids: Vec<Option<&'a str>> = alternatives
            .iter()
            .map(|&alternative| self.ctx.index.effective_id(alternative))
            .collect();
        let shared_id = ids[0].filter(|id| ids.iter().all(|other| *other == Some(*id)));
        let path = position.path.child(PathSegment::step(attribute, shared_id));
        let reported_id = ids[0]
            .or(position.element_id.as_deref())
            .unwrap_or(first.rm_type.as_str())
            .to_string();

        let interface = self.build_choice(&label, alternatives, &trail)?;
        let rm_type = self
            .ctx
            .class(&interface)
            .map(|class| class.rm_type.clone())
            .unwrap_or_else(|| self.ctx.catalog.fallback_type().to_string());

        fields.push(
            &reported_id,
            FieldDefinition {
                name: label,
                type_ref: TypeRef::Choice(interface).with_multiplicity(multiplicity),
                path,
                multiplicity,
                rm_type,
                description: Some(trail),
            },
        )
    }

    fn build_choice(
        &mut self,
        label: &str,
        alternatives: &[&'a TemplateNode],
        trail: &str,
    ) -> Result<String> {
        let signature = self.ctx.signer.choice(label, alternatives);
        if let Some(name) = self.ctx.memoised(&signature) {
            return Ok(name);
        }

        let resolved = alternatives
            .iter()
            .map(|&alternative| self.ctx.index.resolve(alternative))
            .collect::<Result<Vec<_>>>()?;
        let rm_type = self.choice_rm_type(&resolved);
        let name = self
            .ctx
            .names
            .claim(&resolve_class_name(&format!("{label}_CHOICE")));
        self.ctx.begin_class(
            signature,
            ClassDefinition {
                name: name.clone(),
                kind: ClassKind::ChoiceInterface {
                    variants: Vec::new(),
                },
                rm_type,
                fields: Vec::new(),
                description: Some(trail.to_string()),
            },
        );

        let mut variants = Vec::with_capacity(alternatives.len());
        let mut variant_fields = Vec::with_capacity(alternatives.len());
        for (&alternative, &target) in alternatives.iter().zip(&resolved) {
            let (variant, fields) = self.build_variant(&name, label, alternative, target, trail)?;
            variants.push(variant);
            variant_fields.push(fields);
        }

        self.ctx.set_variants(&name, variants);
        self.ctx.end_class(&name, shared_fields(&variant_fields));
        Ok(name)
    }

    /// Builds one variant class, rooted at the alternative node itself.
    fn build_variant(
        &mut self,
        interface: &str,
        label: &str,
        alternative: &'a TemplateNode,
        target: &'a TemplateNode,
        trail: &str,
    ) -> Result<(String, Vec<FieldDefinition>)> {
        let name = self
            .ctx
            .names
            .claim(&resolve_class_name(&format!("{label}_{}", target.rm_type)));
        self.ctx.add_class(ClassDefinition {
            name: name.clone(),
            kind: ClassKind::ChoiceVariant {
                interface: interface.to_string(),
            },
            rm_type: target.rm_type.clone(),
            fields: Vec::new(),
            description: Some(trail.to_string()),
        });

        let strategy = classify(
            target,
            self.ctx.catalog,
            self.ctx.config.optimizer_setting,
            Multiplicity::Single,
            alternative.is_reference(),
            false,
        );
        let mut fields = FieldCollector::new(&name);
        let mut position = Position::root(trail);
        match strategy {
            NodeStrategy::ElementValue => {
                position.element_label = Some(label.to_string());
                position.element_id = self.ctx.index.effective_id(alternative).map(str::to_string);
                self.collect_attributes(target, &position, &mut fields)?;
            }
            NodeStrategy::Flatten | NodeStrategy::Nested(_) => {
                self.collect_attributes(target, &position, &mut fields)?;
            }
            other => {
                let site = Site {
                    source: alternative,
                    resolved: target,
                    label: label.to_string(),
                    path: Path::root(),
                    trail: trail.to_string(),
                    multiplicity: Multiplicity::Single,
                    element_id: None,
                };
                self.emit(site, other, &mut fields)?;
            }
        }

        self.ctx.set_fields(&name, fields.fields.clone());
        Ok((name, fields.fields))
    }

    fn choice_rm_type(&self, alternatives: &[&TemplateNode]) -> String {
        let first = &alternatives[0].rm_type;
        if alternatives.iter().all(|a| &a.rm_type == first) {
            return first.clone();
        }
        let all_data_values = alternatives.iter().all(|a| {
            self.ctx
                .catalog
                .lookup(&a.rm_type)
                .is_some_and(|info| info.is_data_value())
        });
        if all_data_values {
            return "DATA_VALUE".to_string();
        }
        let base_types: Vec<Option<&str>> = alternatives
            .iter()
            .map(|a| {
                self.ctx
                    .catalog
                    .lookup(&a.rm_type)
                    .and_then(|info| info.entity_category())
                    .and_then(|category| category.base_type())
            })
            .collect();
        match base_types[0] {
            Some(base) if base_types.iter().all(|other| *other == Some(base)) => base.to_string(),
            _ => self.ctx.catalog.fallback_type().to_string(),
        }
    }
}

/// Fields every variant declares identically; these form the interface.
fn shared_fields(variants: &[Vec<FieldDefinition>]) -> Vec<FieldDefinition> {
    let Some((first, rest)) = variants.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .filter(|field| {
            rest.iter().all(|other| {
                other.iter().any(|candidate| {
                    candidate.name == field.name
                        && candidate.type_ref == field.type_ref
                        && candidate.path == field.path
                })
            })
        })
        .cloned()
        .collect()
}
