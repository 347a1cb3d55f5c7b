use obfmap_classfile::ClassParseError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Debug, Error)]
pub enum AnalyzerError {
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
    #[error("Class parse error in {path}: {source}")]
    ClassFile {
        path: PathBuf,
        #[source]
        source: ClassParseError,
    },
    #[error("class {class} was not found on the classpath")]
    NotFound { class: String },
    #[error("Java home {path} is invalid: {reason}")]
    InvalidJavaHome { path: PathBuf, reason: &'static str },
}
