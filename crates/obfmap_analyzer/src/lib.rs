// obfmap_analyzer - classpath analysis for override detection

mod analyzer;
mod error;
mod report;
mod runtime;
mod source;

pub use analyzer::Analyzer;
pub use error::AnalyzerError;
pub use report::ClassReport;
pub use runtime::{detect_java_home, platform_runtime};
pub use source::{
    ArchiveSource, ClassSource, ClasspathSource, CompositeSource, DirectorySource, Priority,
};
