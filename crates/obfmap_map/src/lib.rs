// obfmap_map - symbol mapping tables and the map file format

mod category;
mod descriptor;
mod error;
mod format;
mod symbol;
mod table;

pub use category::{Category, CategoryRegistry};
pub use descriptor::{method_parameters, remap_signature};
pub use error::MapError;
pub use format::{COMMENT_PREFIX, MAP_FORMAT_VERSION};
pub use symbol::{DynamicCallSymbol, FieldSymbol, MethodSymbol, Symbol, TypeSymbol, WILDCARD};
pub use table::MappingTable;
