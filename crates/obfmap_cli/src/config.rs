use crate::Cli;
use anyhow::{Context, Result};
use obfmap_generator::{GeneratorConfig, NameGeneratorKind};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Contents of a `--config` file.
///
/// ```toml
/// classpath = "java:/opt/jdk8:lib/dependency.jar"
///
/// [generator]
/// remove_package_names = false
/// name_generator = "unicode"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub classpath: Option<String>,
    pub generator: GeneratorConfig,
}

impl ToolConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Layers command line switches over the file values. Switches only ever
    /// turn defaults off or pick a generator, so absent switches keep the
    /// file's choice.
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if cli.classpath.is_some() {
            self.classpath = cli.classpath.clone();
        }
        let generator = &mut self.generator;
        if cli.preserve_package_structure {
            generator.remove_package_names = false;
        }
        if cli.disable_field_overloading {
            generator.field_descriptor_overloading = false;
        }
        if cli.disable_return_type_overloading {
            generator.method_return_type_overloading = false;
        }
        if cli.use_uuid_name_generator {
            generator.name_generator = NameGeneratorKind::Random;
        } else if cli.use_unicode_name_generator {
            generator.name_generator = NameGeneratorKind::Unicode;
        }
        self
    }
}
