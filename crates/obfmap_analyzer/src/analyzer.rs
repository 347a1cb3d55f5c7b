use crate::error::AnalyzerError;
use crate::report::ClassReport;
use crate::runtime::{detect_java_home, platform_runtime};
use crate::source::{insert_ranked, ArchiveSource, ClassSource, ClasspathSource};
use std::path::{Path, PathBuf};

const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };
const RUNTIME_MARKER: &str = "java";
const RUNTIME_PREFIX: &str = "java:";

/// Ordered chain of classpath sources answering whether a class exists and
/// which methods it declares.
#[derive(Debug, Default)]
pub struct Analyzer {
    sources: Vec<ClasspathSource>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source and keeps the chain sorted by priority. Sources of equal
    /// priority are consulted in insertion order.
    pub fn add_source(&mut self, source: ClasspathSource) {
        tracing::debug!(source = %source, priority = source.priority().rank(), "adding classpath source");
        insert_ranked(&mut self.sources, source);
    }

    pub fn sources(&self) -> &[ClasspathSource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// True if any source holds `class`.
    pub fn class_exists(&self, class: &str) -> bool {
        self.sources.iter().any(|source| source.class_exists(class))
    }

    /// Report from the first source, in priority order, that holds `class`.
    pub fn report(&self, class: &str) -> Result<ClassReport, AnalyzerError> {
        match self.sources.iter().find(|source| source.class_exists(class)) {
            Some(source) => source.report(class),
            None => Err(AnalyzerError::NotFound {
                class: class.to_string(),
            }),
        }
    }

    /// Removes every source.
    pub fn reset(&mut self) {
        self.sources.clear();
    }

    /// Builds a chain from a path-separator delimited list of archives and
    /// directories. A `java:<home>` element adds the runtime installed at
    /// `<home>`; a bare `java:` adds the detected runtime.
    pub fn from_classpath(classpath: &str) -> Result<Self, AnalyzerError> {
        let mut analyzer = Self::new();
        for element in parse_classpath(classpath) {
            match element {
                ClasspathElement::Runtime(home) => {
                    let home = match home.or_else(detect_java_home) {
                        Some(home) => home,
                        None => {
                            tracing::warn!("no Java runtime detected for `java:` classpath element");
                            continue;
                        }
                    };
                    let runtime = platform_runtime(&home)?;
                    analyzer.add_source(ClasspathSource::Composite(runtime));
                }
                ClasspathElement::Path(path) => {
                    analyzer.add_source(ClasspathSource::open(&path)?);
                }
            }
        }
        Ok(analyzer)
    }

    /// Builds a chain from the `Class-Path` attribute in the manifest of
    /// `archive`. Elements resolve against the archive's directory. Returns
    /// `None` when the manifest or the attribute is missing.
    pub fn from_manifest(archive: &Path) -> Result<Option<Self>, AnalyzerError> {
        tracing::debug!(archive = %archive.display(), "searching for class-path information");
        let source = ArchiveSource::open(archive)?;
        let Some(elements) = source.manifest_class_path()? else {
            return Ok(None);
        };

        let base = archive.parent().unwrap_or_else(|| Path::new(""));
        let mut analyzer = Self::new();
        for element in elements {
            let path = base.join(&element);
            tracing::debug!(element = %element, "adding manifest class-path element");
            analyzer.add_source(ClasspathSource::open(&path)?);
        }
        Ok(Some(analyzer))
    }

    /// Analyzer seeded with the detected platform runtime. When no runtime
    /// can be found the chain stays empty.
    pub fn with_platform_runtime() -> Self {
        let mut analyzer = Self::new();
        analyzer.add_platform_runtime();
        analyzer
    }

    /// Adds the detected platform runtime, logging instead of failing when
    /// none is usable.
    pub fn add_platform_runtime(&mut self) {
        let Some(home) = detect_java_home() else {
            tracing::warn!("could not locate a Java runtime; inherited runtime methods will not be detected");
            return;
        };
        match platform_runtime(&home) {
            Ok(runtime) => self.add_source(ClasspathSource::Composite(runtime)),
            Err(error) => tracing::warn!(%error, "could not load the Java standard library"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClasspathElement {
    Runtime(Option<PathBuf>),
    Path(PathBuf),
}

/// Splits a classpath string. With `:` as separator a runtime element reads
/// `java:/path/to/home`, so a bare `java` element takes the following element
/// as its home.
pub(crate) fn parse_classpath(classpath: &str) -> Vec<ClasspathElement> {
    let mut elements = Vec::new();
    let mut parts = classpath.split(PATH_SEPARATOR).map(str::trim);
    while let Some(part) = parts.next() {
        if part.is_empty() {
            continue;
        }
        let runtime_home = if PATH_SEPARATOR == ':' && part == RUNTIME_MARKER {
            Some(parts.next().unwrap_or_default())
        } else {
            part.strip_prefix(RUNTIME_PREFIX)
        };
        elements.push(match runtime_home {
            Some(home) => ClasspathElement::Runtime((!home.is_empty()).then(|| PathBuf::from(home))),
            None => ClasspathElement::Path(PathBuf::from(part)),
        });
    }
    elements
}
