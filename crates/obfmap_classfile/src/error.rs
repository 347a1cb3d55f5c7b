use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("invalid modified UTF-8 string in constant pool")]
    InvalidUtf8,
    #[error("malformed {name} attribute")]
    InvalidAttribute { name: String },
    #[error("constant pool exceeds {max} entries")]
    PoolOverflow { max: usize },
    #[error("constant pool string of {length} bytes exceeds {max} bytes")]
    StringTooLong { length: usize, max: usize },
}
