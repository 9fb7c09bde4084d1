use indexmap::IndexMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::GeneratorConfig;
use crate::enums::EnumExtractor;
use crate::model::{
    ClassDefinition, ClassKind, CompilationResult, CompilationStats, CompileWarning,
    FieldDefinition,
};
use crate::naming::NameScope;
use crate::rm::RmCatalog;
use crate::signature::{Signer, StructuralSignature};
use crate::template::TemplateIndex;

/// Working state of one compilation. Nothing in here outlives the call.
pub struct CompilationContext<'a> {
    pub config: &'a GeneratorConfig,
    pub catalog: &'a dyn RmCatalog,
    pub index: TemplateIndex<'a>,
    /// Shared by class, interface, variant and enum names.
    pub names: NameScope,
    pub signer: Signer<'a>,
    pub enums: EnumExtractor,
    memo: HashMap<StructuralSignature, String>,
    in_progress: Vec<StructuralSignature>,
    classes: IndexMap<String, ClassDefinition>,
    warnings: Vec<CompileWarning>,
    stats: CompilationStats,
    start_time: Instant,
}

impl<'a> CompilationContext<'a> {
    pub fn new(
        config: &'a GeneratorConfig,
        catalog: &'a dyn RmCatalog,
        index: TemplateIndex<'a>,
    ) -> Self {
        Self {
            config,
            catalog,
            index,
            names: NameScope::new(),
            signer: Signer::new(),
            enums: EnumExtractor::new(),
            memo: HashMap::new(),
            in_progress: Vec::new(),
            classes: IndexMap::new(),
            warnings: Vec::new(),
            stats: CompilationStats::default(),
            start_time: Instant::now(),
        }
    }

    /// Name bound to `signature`, if a class for it exists or is being built.
    pub fn memoised(&mut self, signature: &StructuralSignature) -> Option<String> {
        let name = self.memo.get(signature)?.clone();
        if self.in_progress.contains(signature) {
            self.stats.closed_cycles += 1;
            debug!(class = %name, signature = signature.short(), "Closing cycle on in-progress class");
        } else {
            self.stats.reused_classes += 1;
            debug!(class = %name, signature = signature.short(), "Reusing class for identical subtree");
        }
        Some(name)
    }

    /// Registers a memoised class and marks it in progress until [`Self::end_class`].
    pub fn begin_class(&mut self, signature: StructuralSignature, class: ClassDefinition) {
        debug!(
            class = %class.name,
            rm_type = %class.rm_type,
            signature = signature.short(),
            depth = self.in_progress.len(),
            "Creating class"
        );
        self.memo.insert(signature.clone(), class.name.clone());
        self.in_progress.push(signature);
        self.add_class(class);
    }

    pub fn end_class(&mut self, name: &str, fields: Vec<FieldDefinition>) {
        self.in_progress.pop();
        self.set_fields(name, fields);
    }

    /// Registers a class that is not memoised by itself (choice variants).
    pub fn add_class(&mut self, class: ClassDefinition) {
        match class.kind {
            ClassKind::Entity { .. } => self.stats.entities += 1,
            ClassKind::ChoiceInterface { .. } => self.stats.choices += 1,
            ClassKind::ChoiceVariant { .. } => self.stats.variants += 1,
        }
        self.classes.insert(class.name.clone(), class);
    }

    pub fn set_fields(&mut self, name: &str, fields: Vec<FieldDefinition>) {
        if let Some(class) = self.classes.get_mut(name) {
            class.fields = fields;
        }
    }

    pub fn set_variants(&mut self, interface: &str, variants: Vec<String>) {
        if let Some(class) = self.classes.get_mut(interface) {
            class.kind = ClassKind::ChoiceInterface { variants };
        }
    }

    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(name)
    }

    pub fn add_warning(&mut self, warning: CompileWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn finish(self, template_id: &str, root_class: String) -> CompilationResult {
        let mut stats = self.stats;
        stats.enums = self.enums.len();
        stats.reused_enums = self.enums.reused();
        stats.fields = self.classes.values().map(|class| class.fields.len()).sum();

        CompilationResult {
            template_id: template_id.to_string(),
            package_name: self.config.package_name.clone(),
            root_class,
            classes: self.classes,
            enums: self.enums.into_definitions(),
            warnings: self.warnings,
            stats,
        }
    }
}
