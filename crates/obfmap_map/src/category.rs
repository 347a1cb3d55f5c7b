use crate::error::MapError;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Partition of the mapping table. Declaration order is the order entries are
/// written to a map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Type,
    Field,
    Method,
    DynamicCall,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Type,
        Category::Field,
        Category::Method,
        Category::DynamicCall,
    ];

    /// Code written to map files by the default registry.
    pub fn default_code(self) -> &'static str {
        match self {
            Category::Type => "TYP",
            Category::Field => "FLD",
            Category::Method => "MTD",
            Category::DynamicCall => "IDM",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Type => "type",
            Category::Field => "field",
            Category::Method => "method",
            Category::DynamicCall => "dynamic call",
        };
        f.write_str(label)
    }
}

/// Bijective table between map-file codes and categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    by_code: HashMap<String, Category>,
    by_category: HashMap<Category, String>,
}

impl CategoryRegistry {
    /// Registry without any codes.
    pub fn empty() -> Self {
        Self {
            by_code: HashMap::new(),
            by_category: HashMap::new(),
        }
    }

    /// Binds `code` to `category`, dropping any previous binding of either side.
    pub fn register(&mut self, code: impl Into<String>, category: Category) -> Result<(), MapError> {
        let code = code.into();
        if code.is_empty() || code.chars().any(char::is_whitespace) || code.starts_with("//") {
            return Err(MapError::InvalidCode { code });
        }

        if let Some(previous) = self.by_category.remove(&category) {
            self.by_code.remove(&previous);
        }
        if let Some(previous) = self.by_code.remove(&code) {
            self.by_category.remove(&previous);
        }

        self.by_code.insert(code.clone(), category);
        self.by_category.insert(category, code);
        Ok(())
    }

    pub fn category_of(&self, code: &str) -> Result<Category, MapError> {
        self.by_code
            .get(code)
            .copied()
            .ok_or_else(|| MapError::UnknownInstructionCode {
                code: code.to_string(),
            })
    }

    pub fn code_of(&self, category: Category) -> Result<&str, MapError> {
        self.by_category
            .get(&category)
            .map(String::as_str)
            .ok_or(MapError::UnknownCategory { category })
    }

    /// Resolves a `(code, serialized symbol)` pair read from a map file.
    pub fn parse(&self, code: &str, serialized: &str) -> Result<Symbol, MapError> {
        let category = self.category_of(code)?;
        Symbol::parse(category, serialized)
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        let mut by_code = HashMap::new();
        let mut by_category = HashMap::new();
        for category in Category::ALL {
            by_code.insert(category.default_code().to_string(), category);
            by_category.insert(category, category.default_code().to_string());
        }
        Self {
            by_code,
            by_category,
        }
    }
}
