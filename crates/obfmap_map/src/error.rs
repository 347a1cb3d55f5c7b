use crate::category::Category;
use crate::symbol::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("malformed {category} symbol '{input}': {reason}")]
    Format {
        category: Category,
        input: String,
        reason: &'static str,
    },
    #[error("category mismatch: {original} ({original_category}) cannot map to {replacement} ({replacement_category})")]
    CategoryMismatch {
        original: Symbol,
        original_category: Category,
        replacement: Symbol,
        replacement_category: Category,
    },
    #[error("wildcard symbol {symbol} cannot be used as a mapping key")]
    WildcardKey { symbol: Symbol },
    #[error("unknown instruction code '{code}'")]
    UnknownInstructionCode { code: String },
    #[error("no instruction code registered for {category} symbols")]
    UnknownCategory { category: Category },
    #[error("invalid instruction code '{code}'")]
    InvalidCode { code: String },
    #[error("mapping on line {line} does not contain exactly 4 elements")]
    MalformedLine { line: usize },
    #[error("invalid mapping on line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<MapError>,
    },
    #[error("map I/O error: {0}")]
    Io(#[from] std::io::Error),
}
