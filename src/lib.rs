//! # openEHR Class Generator
//!
//! Compiles openEHR operational templates into a typed class model: entity
//! definitions whose fields bind a canonical name to a data type and to the
//! symbolic path of the value inside a conforming composition.
//!
//! ## Features
//!
//! - **Canonical naming**: stable, collision-free class, field and enum names from free-text labels
//! - **Choices**: polymorphic template positions become closed interface/variant sets
//! - **Reuse**: structurally identical subtrees share one class; recursive templates terminate
//! - **Enums**: coded-text value sets become enum definitions, deduplicated by content
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use openehr_classgen::*;
//!
//! # fn example() -> Result<()> {
//! let template = OperationalTemplate::from_path("blood_pressure.json")?;
//! let config = GeneratorConfig::new().with_package_name("org.example.bp");
//! let result = compile(&template, &config)?;
//!
//! for class in result.classes.values() {
//!     for field in &class.fields {
//!         println!("{}.{}: {} @ {}", class.name, field.name, field.type_ref, field.path);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod classify;
pub mod config;
pub mod enums;
pub mod error;
pub mod model;
pub mod naming;
pub mod path;
pub mod rm;
pub mod signature;
pub mod template;

pub use builder::ClassGenerator;
pub use config::{GeneratorConfig, OptimizerSetting};
pub use error::{ClassGenError, Result};
pub use model::*;
pub use naming::{NameScope, resolve_class_name, resolve_constant_name, resolve_field_name};
pub use path::{Path, PathSegment};
pub use rm::{OpenEhrCatalog, RmCatalog, RmCategory, RmTypeInfo, ValueComponent};
pub use template::{
    Occurrences, OperationalTemplate, TemplateAttribute, TemplateIndex, TemplateNode, TermEntry,
};

/// Compiles `template` with the built-in openEHR catalog.
pub fn compile(template: &OperationalTemplate, config: &GeneratorConfig) -> Result<CompilationResult> {
    ClassGenerator::new(config.clone()).generate(template)
}
