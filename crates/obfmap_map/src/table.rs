use crate::category::{Category, CategoryRegistry};
use crate::descriptor::remap_signature;
use crate::error::MapError;
use crate::symbol::Symbol;
use std::collections::HashMap;

/// Categorized store of `original → replacement` symbols.
///
/// Keys are always fully specified symbols, so the structural `Hash`/`Eq` used by
/// the backing maps is consistent. Wildcard symbols only ever appear as
/// replacements or as probes for [`MappingTable::exists`].
#[derive(Debug, Clone)]
pub struct MappingTable {
    entries: HashMap<Category, HashMap<Symbol, Symbol>>,
    registry: CategoryRegistry,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::with_registry(CategoryRegistry::default())
    }

    pub fn with_registry(registry: CategoryRegistry) -> Self {
        Self {
            entries: HashMap::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Inserts or overwrites a mapping. Both symbols must share a category and
    /// the original must be fully specified.
    pub fn add(&mut self, original: Symbol, replacement: Symbol) -> Result<(), MapError> {
        let original_category = original.category();
        let replacement_category = replacement.category();
        if original_category != replacement_category {
            return Err(MapError::CategoryMismatch {
                original,
                original_category,
                replacement,
                replacement_category,
            });
        }
        if !original.is_fully_specified() {
            return Err(MapError::WildcardKey { symbol: original });
        }

        self.entries
            .entry(original_category)
            .or_default()
            .insert(original, replacement);
        Ok(())
    }

    /// Replacement for `original`, if mapped. Wildcard probes never hit.
    pub fn lookup(&self, original: &Symbol) -> Option<&Symbol> {
        self.entries
            .get(&original.category())
            .and_then(|entries| entries.get(original))
    }

    pub fn contains(&self, original: &Symbol) -> bool {
        self.lookup(original).is_some()
    }

    /// Whether `candidate` already appears as the replacement of any entry,
    /// comparing with wildcard semantics.
    pub fn exists(&self, candidate: &Symbol) -> bool {
        self.entries
            .get(&candidate.category())
            .map(|entries| entries.values().any(|replacement| replacement.matches(candidate)))
            .unwrap_or(false)
    }

    /// Entries of one category.
    pub fn category(&self, category: Category) -> impl Iterator<Item = (&Symbol, &Symbol)> {
        self.entries
            .get(&category)
            .into_iter()
            .flat_map(|entries| entries.iter())
    }

    pub fn category_len(&self, category: Category) -> usize {
        self.entries.get(&category).map(HashMap::len).unwrap_or(0)
    }

    /// Every entry across all categories.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Symbol)> {
        self.entries.values().flat_map(|entries| entries.iter())
    }

    /// Every entry ordered by category, then by original symbol.
    pub fn sorted_entries(&self) -> Vec<(&Symbol, &Symbol)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|(left, _), (right, _)| left.cmp(right));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the entries of `other` (optionally one category) into this table,
    /// overwriting existing originals.
    pub fn merge(&mut self, other: &MappingTable, category: Option<Category>) -> Result<(), MapError> {
        let entries: Vec<(Symbol, Symbol)> = match category {
            Some(category) => other
                .category(category)
                .map(|(original, replacement)| (original.clone(), replacement.clone()))
                .collect(),
            None => other
                .iter()
                .map(|(original, replacement)| (original.clone(), replacement.clone()))
                .collect(),
        };
        for (original, replacement) in entries {
            self.add(original, replacement)?;
        }
        Ok(())
    }

    /// Clears everything, or a single category.
    pub fn reset(&mut self, category: Option<Category>) {
        match category {
            Some(category) => {
                self.entries.remove(&category);
            }
            None => self.entries.clear(),
        }
    }

    pub fn map_type_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.lookup(&Symbol::type_name(name))
            .map(Symbol::name)
            .unwrap_or(name)
    }

    pub fn map_field_name<'a>(&'a self, owner: &str, name: &'a str, descriptor: &str) -> &'a str {
        self.lookup(&Symbol::field(owner, name, descriptor))
            .map(Symbol::name)
            .unwrap_or(name)
    }

    pub fn map_method_name<'a>(&'a self, owner: &str, name: &'a str, descriptor: &str) -> &'a str {
        self.lookup(&Symbol::method(owner, name, descriptor))
            .map(Symbol::name)
            .unwrap_or(name)
    }

    pub fn map_dynamic_call_name<'a>(&'a self, name: &'a str, descriptor: &str) -> &'a str {
        self.lookup(&Symbol::dynamic_call(name, descriptor))
            .map(Symbol::name)
            .unwrap_or(name)
    }

    /// Rewrites the class names inside a descriptor or generic signature.
    pub fn map_descriptor(&self, descriptor: &str) -> String {
        remap_signature(descriptor, |class| self.map_type_name(class).to_string())
    }

    /// Maps the operand of a `CONSTANT_Class`, which is either an internal
    /// class name or an array descriptor.
    pub fn map_class_reference(&self, name: &str) -> String {
        if name.starts_with('[') {
            self.map_descriptor(name)
        } else {
            self.map_type_name(name).to_string()
        }
    }

    /// Table that maps every renamed symbol back to its original form.
    pub fn reversed(&self) -> Result<MappingTable, MapError> {
        let mut reversed = MappingTable::with_registry(self.registry.clone());
        for (original, _) in self.sorted_entries() {
            reversed.add(original.inverse(self), original.clone())?;
        }
        Ok(reversed)
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new()
    }
}
