use obfmap_classfile::{parse_class, ClassParseError, ClassStructure};
use obfmap_map::Symbol;

/// Overridable method signatures declared by one class.
///
/// Every non-final method is recorded as an owner-less [`Symbol::Method`], so
/// a lookup matches on name and descriptor alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassReport {
    class_name: String,
    known_methods: Vec<Symbol>,
}

impl ClassReport {
    pub fn from_structure(structure: &ClassStructure) -> Self {
        let known_methods = structure
            .methods
            .iter()
            .filter(|method| !method.is_final())
            .map(|method| Symbol::method_signature(&method.name, &method.descriptor))
            .collect();
        Self {
            class_name: structure.name.clone(),
            known_methods,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ClassParseError> {
        parse_class(bytes).map(|structure| Self::from_structure(&structure))
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn known_methods(&self) -> &[Symbol] {
        &self.known_methods
    }

    /// True when `method` matches a recorded signature. The owner of `method`
    /// is ignored because recorded signatures carry none.
    pub fn is_known_method(&self, method: &Symbol) -> bool {
        self.known_methods.iter().any(|known| known.matches(method))
    }
}
