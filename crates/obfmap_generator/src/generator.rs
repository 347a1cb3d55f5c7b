use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use crate::names::{NameCursors, NameGenerators};
use obfmap_analyzer::{Analyzer, AnalyzerError, ClassReport};
use obfmap_classfile::{ClassStructure, DynamicCallSite, FieldDecl, MethodDecl};
use obfmap_map::{method_parameters, Category, MappingTable, Symbol};
use std::collections::HashMap;

/// Builds collision-free mapping tables for compiled classes.
#[derive(Debug, Clone)]
pub struct MapGenerator {
    config: GeneratorConfig,
    generators: NameGenerators,
}

impl Default for MapGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl MapGenerator {
    /// Generator using the name strategy selected by `config`.
    pub fn new(config: GeneratorConfig) -> Self {
        let generators = config.name_generator.generators();
        Self { config, generators }
    }

    /// Generator with explicitly assigned per-category name generators. The
    /// `name_generator` setting of `config` is ignored.
    pub fn with_generators(config: GeneratorConfig, generators: NameGenerators) -> Self {
        Self { config, generators }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn generators(&self) -> &NameGenerators {
        &self.generators
    }

    /// Starts a run over an empty table. Without an analyzer no method is
    /// treated as an override.
    pub fn session<'a>(&'a self, analyzer: Option<&'a Analyzer>) -> Session<'a> {
        Session {
            generator: self,
            analyzer,
            table: MappingTable::new(),
            cursors: NameCursors::new(),
            reports: HashMap::new(),
        }
    }

    /// Convenience wrapper running one session over `classes`.
    pub fn generate<'c>(
        &self,
        classes: impl IntoIterator<Item = &'c ClassStructure>,
        analyzer: Option<&Analyzer>,
    ) -> Result<MappingTable, GenerateError> {
        let mut session = self.session(analyzer);
        for class in classes {
            session.visit_class(class)?;
        }
        Ok(session.finish())
    }
}

/// State of one generation run: the table being built, the last generated
/// name per category and the class reports fetched so far.
///
/// Classes are visited one at a time; every visit sees the names allocated
/// by all earlier ones.
#[derive(Debug)]
pub struct Session<'a> {
    generator: &'a MapGenerator,
    analyzer: Option<&'a Analyzer>,
    table: MappingTable,
    cursors: NameCursors,
    // None records a class the analyzer does not hold
    reports: HashMap<String, Option<ClassReport>>,
}

impl<'a> Session<'a> {
    /// Continues from an existing table. Entries already present are kept
    /// and their replacements are avoided.
    pub fn with_table(mut self, table: MappingTable) -> Self {
        self.table = table;
        self
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn cursors(&self) -> &NameCursors {
        &self.cursors
    }

    pub fn finish(self) -> MappingTable {
        self.table
    }

    /// Allocates names for the type, nested types, fields, methods and
    /// dynamic call sites of `class`, in that order.
    pub fn visit_class(&mut self, class: &ClassStructure) -> Result<(), GenerateError> {
        tracing::trace!(
            class = %class.name,
            super_name = class.super_name.as_deref().unwrap_or("-"),
            interfaces = ?class.interfaces,
            "generating mappings for type"
        );

        self.visit_type(&class.name)?;
        for nested in &class.nested_types {
            self.visit_type(nested)?;
        }
        for field in &class.fields {
            self.visit_field(&class.name, field)?;
        }
        for method in &class.methods {
            self.visit_method(class, method)?;
        }
        for call in &class.dynamic_calls {
            self.visit_dynamic_call(call)?;
        }
        Ok(())
    }

    fn visit_type(&mut self, name: &str) -> Result<(), GenerateError> {
        let original = Symbol::type_name(name);
        if let Some(existing) = self.table.lookup(&original) {
            tracing::trace!(name, mapped = existing.name(), "type already mapped");
            return Ok(());
        }

        let prefix = if self.generator.config.remove_package_names {
            ""
        } else {
            package_prefix(name)
        };
        let replacement = self.allocate(Category::Type, |generated| {
            Symbol::type_name(format!("{prefix}{generated}"))
        });
        tracing::trace!(name, mapped = replacement.name(), "mapped type");
        self.table.add(original, replacement)?;
        Ok(())
    }

    fn visit_field(&mut self, owner: &str, field: &FieldDecl) -> Result<(), GenerateError> {
        let original = Symbol::field(owner, &field.name, &field.descriptor);
        if let Some(existing) = self.table.lookup(&original) {
            tracing::trace!(owner, field = %field.name, mapped = existing.name(), "field already mapped");
            return Ok(());
        }

        let overloading = self.generator.config.field_descriptor_overloading;
        let replacement = self.allocate(Category::Field, |generated| {
            if overloading {
                Symbol::field(owner, generated, &field.descriptor)
            } else {
                Symbol::field_any_descriptor(owner, generated)
            }
        });
        tracing::trace!(owner, field = %field.name, descriptor = %field.descriptor, mapped = replacement.name(), "mapped field");
        self.table.add(original, replacement)?;
        Ok(())
    }

    fn visit_method(&mut self, class: &ClassStructure, method: &MethodDecl) -> Result<(), GenerateError> {
        let owner = class.name.as_str();
        if method.is_initializer() {
            tracing::trace!(owner, method = %method.name, "initializers keep their name");
            return Ok(());
        }
        if self.is_inherited(class, method) {
            return Ok(());
        }

        let original = Symbol::method(owner, &method.name, &method.descriptor);
        if let Some(existing) = self.table.lookup(&original) {
            tracing::trace!(owner, method = %method.name, mapped = existing.name(), "method already mapped");
            return Ok(());
        }

        let descriptor = if self.generator.config.method_return_type_overloading {
            method.descriptor.as_str()
        } else {
            method_parameters(&method.descriptor)
        };
        let replacement = self.allocate(Category::Method, |generated| {
            Symbol::method(owner, generated, descriptor)
        });
        tracing::trace!(owner, method = %method.name, descriptor = %method.descriptor, mapped = replacement.name(), "mapped method");
        self.table.add(original, replacement)?;
        Ok(())
    }

    fn visit_dynamic_call(&mut self, call: &DynamicCallSite) -> Result<(), GenerateError> {
        let original = Symbol::dynamic_call(&call.name, &call.descriptor);
        if let Some(existing) = self.table.lookup(&original) {
            tracing::trace!(name = %call.name, mapped = existing.name(), "dynamic call already mapped");
            return Ok(());
        }

        let replacement = self.allocate(Category::DynamicCall, |generated| {
            Symbol::dynamic_call(generated, &call.descriptor)
        });
        tracing::trace!(name = %call.name, descriptor = %call.descriptor, mapped = replacement.name(), "mapped dynamic call");
        self.table.add(original, replacement)?;
        Ok(())
    }

    /// Draws names for `category` until `candidate` builds a replacement no
    /// entry of the table uses yet.
    fn allocate(&mut self, category: Category, candidate: impl Fn(&str) -> Symbol) -> Symbol {
        loop {
            let generated = self.cursors.advance(category, &self.generator.generators);
            let symbol = candidate(&generated);
            if !self.table.exists(&symbol) {
                return symbol;
            }
            tracing::trace!(candidate = %generated, %category, "generated name collides, retrying");
        }
    }

    /// Whether the direct super class or one of the interfaces of `class`
    /// reports a method with the same signature. Failing lookups count as
    /// inherited so the method keeps its name.
    fn is_inherited(&mut self, class: &ClassStructure, method: &MethodDecl) -> bool {
        if self.analyzer.is_none() {
            return false;
        }

        let probe = Symbol::method_signature(&method.name, &method.descriptor);
        for parent in class.super_name.iter().chain(&class.interfaces) {
            match self.report(parent) {
                Ok(Some(report)) if report.is_known_method(&probe) => {
                    tracing::trace!(
                        owner = %class.name,
                        method = %method.name,
                        descriptor = %method.descriptor,
                        parent = %parent,
                        "method overrides an inherited method, skipping"
                    );
                    return true;
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(
                        %error,
                        owner = %class.name,
                        method = %method.name,
                        "could not generate class report; the method will not be renamed"
                    );
                    return true;
                }
            }
        }
        false
    }

    fn report(&mut self, class: &str) -> Result<Option<&ClassReport>, AnalyzerError> {
        let Some(analyzer) = self.analyzer else {
            return Ok(None);
        };
        if !self.reports.contains_key(class) {
            let report = if analyzer.class_exists(class) {
                Some(analyzer.report(class)?)
            } else {
                None
            };
            self.reports.insert(class.to_string(), report);
        }
        Ok(self.reports.get(class).and_then(Option::as_ref))
    }
}

/// Package of an internal name including the trailing `/`, or `""` for the
/// default package.
fn package_prefix(name: &str) -> &str {
    match name.rfind('/') {
        Some(index) => &name[..=index],
        None => "",
    }
}
