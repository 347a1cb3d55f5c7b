use crate::names::NameGenerators;
use serde::{Deserialize, Serialize};

/// Name generation strategy selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameGeneratorKind {
    #[default]
    Sequential,
    Unicode,
    Random,
}

impl NameGeneratorKind {
    pub fn generators(self) -> NameGenerators {
        match self {
            NameGeneratorKind::Sequential => NameGenerators::sequential(),
            NameGeneratorKind::Unicode => NameGenerators::unicode(),
            NameGeneratorKind::Random => NameGenerators::random(),
        }
    }
}

/// Options of a map generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Generated type names drop the original package.
    pub remove_package_names: bool,
    /// Same-named fields with different descriptors are separate targets.
    pub field_descriptor_overloading: bool,
    /// Methods differing only in their return type are separate targets.
    pub method_return_type_overloading: bool,
    pub name_generator: NameGeneratorKind,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            remove_package_names: true,
            field_descriptor_overloading: true,
            method_return_type_overloading: true,
            name_generator: NameGeneratorKind::Sequential,
        }
    }
}
