use obfmap_classfile::ClassParseError;
use obfmap_map::MapError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("IO error while reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ZIP error while reading {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("failed to traverse {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Class parse error in {path}: {source}")]
    ClassFile {
        path: PathBuf,
        #[source]
        source: ClassParseError,
    },
    #[error("invalid name alphabet: {reason}")]
    InvalidAlphabet { reason: &'static str },
}
