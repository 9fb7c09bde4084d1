use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ClassGenError, Result};

/// How aggressively singleton composite nodes are inlined into their parent
/// instead of getting a class of their own.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerSetting {
    /// Only containment-only structures (histories, item structures, ...) are inlined.
    #[default]
    None,
    /// Singleton sections are inlined as well.
    Sections,
    /// Every singleton composite except the root is inlined.
    All,
}

impl OptimizerSetting {
    pub fn inlines_sections(self) -> bool {
        matches!(self, Self::Sections | Self::All)
    }

    pub fn inlines_all(self) -> bool {
        matches!(self, Self::All)
    }
}

impl std::str::FromStr for OptimizerSetting {
    type Err = ClassGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "sections" | "section" => Ok(Self::Sections),
            "all" => Ok(Self::All),
            _ => Err(ClassGenError::invalid_config(format!(
                "Unknown optimizer setting: {s}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Namespace used to qualify generated names; never parsed.
    pub package_name: String,
    pub optimizer_setting: OptimizerSetting,
    /// Deepest template nesting accepted before the template is rejected.
    pub max_depth: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            package_name: String::new(),
            optimizer_setting: OptimizerSetting::None,
            max_depth: 256,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    pub fn with_optimizer_setting(mut self, optimizer_setting: OptimizerSetting) -> Self {
        self.optimizer_setting = optimizer_setting;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ClassGenError::invalid_config(
                "max_depth must be greater than zero",
            ));
        }
        Ok(())
    }
}
