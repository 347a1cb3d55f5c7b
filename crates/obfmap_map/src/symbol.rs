use crate::category::Category;
use crate::error::MapError;
use crate::table::MappingTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serialized placeholder for an absent owner or descriptor.
pub const WILDCARD: &str = "*";

/// A renamable program element.
///
/// Derived equality, ordering and hashing are structural: an absent owner or
/// descriptor only equals another absent one. That is the contract storage keys
/// rely on. Wildcard comparison, where an absent field matches anything, is only
/// available through [`Symbol::matches`] and is meant for scan-based probes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Type(TypeSymbol),
    Field(FieldSymbol),
    Method(MethodSymbol),
    DynamicCall(DynamicCallSymbol),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeSymbol {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldSymbol {
    pub owner: Option<String>,
    pub name: String,
    pub descriptor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodSymbol {
    pub owner: Option<String>,
    pub name: String,
    pub descriptor: Option<String>,
}

/// Target of an invokedynamic call site. Call sites have no owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DynamicCallSymbol {
    pub name: String,
    pub descriptor: Option<String>,
}

impl Symbol {
    pub fn type_name(name: impl Into<String>) -> Self {
        Symbol::Type(TypeSymbol { name: name.into() })
    }

    pub fn field(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Symbol::Field(FieldSymbol {
            owner: Some(owner.into()),
            name: name.into(),
            descriptor: Some(descriptor.into()),
        })
    }

    pub fn method(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Symbol::Method(MethodSymbol {
            owner: Some(owner.into()),
            name: name.into(),
            descriptor: Some(descriptor.into()),
        })
    }

    pub fn dynamic_call(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Symbol::DynamicCall(DynamicCallSymbol {
            name: name.into(),
            descriptor: Some(descriptor.into()),
        })
    }

    /// Method probe with no owner, matching the same signature on any type.
    pub fn method_signature(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Symbol::Method(MethodSymbol {
            owner: None,
            name: name.into(),
            descriptor: Some(descriptor.into()),
        })
    }

    /// Field whose descriptor is left open.
    pub fn field_any_descriptor(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Symbol::Field(FieldSymbol {
            owner: Some(owner.into()),
            name: name.into(),
            descriptor: None,
        })
    }

    pub fn category(&self) -> Category {
        match self {
            Symbol::Type(_) => Category::Type,
            Symbol::Field(_) => Category::Field,
            Symbol::Method(_) => Category::Method,
            Symbol::DynamicCall(_) => Category::DynamicCall,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Type(symbol) => &symbol.name,
            Symbol::Field(symbol) => &symbol.name,
            Symbol::Method(symbol) => &symbol.name,
            Symbol::DynamicCall(symbol) => &symbol.name,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Symbol::Field(symbol) => symbol.owner.as_deref(),
            Symbol::Method(symbol) => symbol.owner.as_deref(),
            Symbol::Type(_) | Symbol::DynamicCall(_) => None,
        }
    }

    pub fn descriptor(&self) -> Option<&str> {
        match self {
            Symbol::Field(symbol) => symbol.descriptor.as_deref(),
            Symbol::Method(symbol) => symbol.descriptor.as_deref(),
            Symbol::DynamicCall(symbol) => symbol.descriptor.as_deref(),
            Symbol::Type(_) => None,
        }
    }

    /// True when no component is a wildcard. Only such symbols may key a table.
    pub fn is_fully_specified(&self) -> bool {
        match self {
            Symbol::Type(_) => true,
            Symbol::Field(symbol) => symbol.owner.is_some() && symbol.descriptor.is_some(),
            Symbol::Method(symbol) => symbol.owner.is_some() && symbol.descriptor.is_some(),
            Symbol::DynamicCall(symbol) => symbol.descriptor.is_some(),
        }
    }

    /// Wildcard-aware equality: an absent owner or descriptor on either side
    /// matches any value. Symbols of different categories never match.
    pub fn matches(&self, other: &Symbol) -> bool {
        match (self, other) {
            (Symbol::Type(a), Symbol::Type(b)) => a.name == b.name,
            (Symbol::Field(a), Symbol::Field(b)) => {
                a.name == b.name
                    && component_matches(&a.owner, &b.owner)
                    && component_matches(&a.descriptor, &b.descriptor)
            }
            (Symbol::Method(a), Symbol::Method(b)) => {
                a.name == b.name
                    && component_matches(&a.owner, &b.owner)
                    && component_matches(&a.descriptor, &b.descriptor)
            }
            (Symbol::DynamicCall(a), Symbol::DynamicCall(b)) => {
                a.name == b.name && component_matches(&a.descriptor, &b.descriptor)
            }
            _ => false,
        }
    }

    /// Stable textual form: `name`, `owner#name:descriptor` or `name:descriptor`.
    pub fn serialize(&self) -> String {
        match self {
            Symbol::Type(symbol) => symbol.name.clone(),
            Symbol::Field(FieldSymbol {
                owner,
                name,
                descriptor,
            })
            | Symbol::Method(MethodSymbol {
                owner,
                name,
                descriptor,
            }) => format!(
                "{}#{}:{}",
                owner.as_deref().unwrap_or(WILDCARD),
                name,
                descriptor.as_deref().unwrap_or(WILDCARD)
            ),
            Symbol::DynamicCall(symbol) => format!(
                "{}:{}",
                symbol.name,
                symbol.descriptor.as_deref().unwrap_or(WILDCARD)
            ),
        }
    }

    /// Parses the output of [`Symbol::serialize`] for the given category.
    pub fn parse(category: Category, input: &str) -> Result<Self, MapError> {
        let format_error = |reason: &'static str| MapError::Format {
            category,
            input: input.to_string(),
            reason,
        };

        if input.is_empty() {
            return Err(format_error("empty symbol"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(format_error("symbol contains whitespace"));
        }

        match category {
            Category::Type => Ok(Symbol::type_name(input)),
            Category::Field | Category::Method => {
                // Internal names never contain '#' and descriptors never contain ':',
                // so member names may carry either.
                let (owner, rest) = input
                    .split_once('#')
                    .ok_or_else(|| format_error("expected a '#' owner separator"))?;
                let (name, descriptor) = rest
                    .rsplit_once(':')
                    .ok_or_else(|| format_error("expected a ':' descriptor separator"))?;
                if owner.is_empty() || name.is_empty() || descriptor.is_empty() {
                    return Err(format_error("owner, name and descriptor must be present"));
                }
                let owner = optional_component(owner);
                let name = name.to_string();
                let descriptor = optional_component(descriptor);
                Ok(if category == Category::Field {
                    Symbol::Field(FieldSymbol {
                        owner,
                        name,
                        descriptor,
                    })
                } else {
                    Symbol::Method(MethodSymbol {
                        owner,
                        name,
                        descriptor,
                    })
                })
            }
            Category::DynamicCall => {
                let (name, descriptor) = input
                    .rsplit_once(':')
                    .ok_or_else(|| format_error("expected a ':' descriptor separator"))?;
                if name.is_empty() || descriptor.is_empty() {
                    return Err(format_error("name and descriptor must be present"));
                }
                Ok(Symbol::DynamicCall(DynamicCallSymbol {
                    name: name.to_string(),
                    descriptor: optional_component(descriptor),
                }))
            }
        }
    }

    /// Re-resolves every component of this symbol through `table`, producing the
    /// form the symbol takes once the table has been applied.
    pub fn inverse(&self, table: &MappingTable) -> Symbol {
        match self {
            Symbol::Type(symbol) => Symbol::type_name(table.map_type_name(&symbol.name)),
            Symbol::Field(symbol) => {
                let name = match (&symbol.owner, &symbol.descriptor) {
                    (Some(owner), Some(descriptor)) => {
                        table.map_field_name(owner, &symbol.name, descriptor)
                    }
                    _ => symbol.name.as_str(),
                };
                Symbol::Field(FieldSymbol {
                    owner: symbol
                        .owner
                        .as_deref()
                        .map(|owner| table.map_type_name(owner).to_string()),
                    name: name.to_string(),
                    descriptor: symbol
                        .descriptor
                        .as_deref()
                        .map(|descriptor| table.map_descriptor(descriptor)),
                })
            }
            Symbol::Method(symbol) => {
                let name = match (&symbol.owner, &symbol.descriptor) {
                    (Some(owner), Some(descriptor)) => {
                        table.map_method_name(owner, &symbol.name, descriptor)
                    }
                    _ => symbol.name.as_str(),
                };
                Symbol::Method(MethodSymbol {
                    owner: symbol
                        .owner
                        .as_deref()
                        .map(|owner| table.map_type_name(owner).to_string()),
                    name: name.to_string(),
                    descriptor: symbol
                        .descriptor
                        .as_deref()
                        .map(|descriptor| table.map_descriptor(descriptor)),
                })
            }
            Symbol::DynamicCall(symbol) => {
                let name = match &symbol.descriptor {
                    Some(descriptor) => table.map_dynamic_call_name(&symbol.name, descriptor),
                    None => symbol.name.as_str(),
                };
                Symbol::DynamicCall(DynamicCallSymbol {
                    name: name.to_string(),
                    descriptor: symbol
                        .descriptor
                        .as_deref()
                        .map(|descriptor| table.map_descriptor(descriptor)),
                })
            }
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn component_matches(left: &Option<String>, right: &Option<String>) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => left == right,
        _ => true,
    }
}

fn optional_component(value: &str) -> Option<String> {
    if value == WILDCARD {
        None
    } else {
        Some(value.to_string())
    }
}
