use crate::error::AnalyzerError;
use crate::report::ClassReport;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use zip::result::ZipError;
use zip::ZipArchive;

const CLASS_SUFFIX: &str = ".class";
const JMOD_CLASSES_PREFIX: &str = "classes/";
const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Lookup order of a source. Lower ranks are consulted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Highest = -2,
    High = -1,
    #[default]
    Normal = 0,
    Low = 1,
    Lowest = 2,
}

impl Priority {
    pub fn rank(self) -> i8 {
        self as i8
    }
}

/// Capability every classpath source provides.
pub trait ClassSource {
    fn priority(&self) -> Priority;

    /// Whether the source holds `class` (an internal name such as
    /// `java/lang/Object`).
    fn class_exists(&self, class: &str) -> bool;

    fn report(&self, class: &str) -> Result<ClassReport, AnalyzerError>;
}

/// One entry of an analyzer chain.
#[derive(Debug)]
pub enum ClasspathSource {
    Archive(ArchiveSource),
    Directory(DirectorySource),
    Composite(CompositeSource),
}

impl ClasspathSource {
    /// Opens `path` as a directory or an archive, depending on what it is.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        if path.is_dir() {
            Ok(ClasspathSource::Directory(DirectorySource::new(path)))
        } else {
            ArchiveSource::open(path).map(ClasspathSource::Archive)
        }
    }

    pub fn with_priority(self, priority: Priority) -> Self {
        match self {
            ClasspathSource::Archive(source) => {
                ClasspathSource::Archive(source.with_priority(priority))
            }
            ClasspathSource::Directory(source) => {
                ClasspathSource::Directory(source.with_priority(priority))
            }
            ClasspathSource::Composite(source) => {
                ClasspathSource::Composite(source.with_priority(priority))
            }
        }
    }
}

impl ClassSource for ClasspathSource {
    fn priority(&self) -> Priority {
        match self {
            ClasspathSource::Archive(source) => source.priority(),
            ClasspathSource::Directory(source) => source.priority(),
            ClasspathSource::Composite(source) => source.priority(),
        }
    }

    fn class_exists(&self, class: &str) -> bool {
        match self {
            ClasspathSource::Archive(source) => source.class_exists(class),
            ClasspathSource::Directory(source) => source.class_exists(class),
            ClasspathSource::Composite(source) => source.class_exists(class),
        }
    }

    fn report(&self, class: &str) -> Result<ClassReport, AnalyzerError> {
        match self {
            ClasspathSource::Archive(source) => source.report(class),
            ClasspathSource::Directory(source) => source.report(class),
            ClasspathSource::Composite(source) => source.report(class),
        }
    }
}

impl fmt::Display for ClasspathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClasspathSource::Archive(source) => write!(f, "archive {}", source.path.display()),
            ClasspathSource::Directory(source) => {
                write!(f, "directory {}", source.root.display())
            }
            ClasspathSource::Composite(source) => write!(f, "{}", source.label),
        }
    }
}

/// A jar, zip or jmod file. Entry names are indexed when the archive is
/// opened; class bytes are read on demand.
pub struct ArchiveSource {
    path: PathBuf,
    prefix: &'static str,
    priority: Priority,
    entries: HashSet<String>,
    archive: Mutex<ZipArchive<BufReader<File>>>,
}

impl fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveSource")
            .field("path", &self.path)
            .field("prefix", &self.prefix)
            .field("priority", &self.priority)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ArchiveSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| AnalyzerError::Io {
            path: path.clone(),
            source,
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| AnalyzerError::Zip {
            path: path.clone(),
            source,
        })?;

        // jmod files keep class files under classes/
        let prefix = if is_jmod(&path) { JMOD_CLASSES_PREFIX } else { "" };
        let entries = archive
            .file_names()
            .filter(|name| name.starts_with(prefix) && name.ends_with(CLASS_SUFFIX))
            .map(str::to_string)
            .collect::<HashSet<_>>();
        tracing::debug!(path = %path.display(), classes = entries.len(), "opened classpath archive");

        Ok(Self {
            path,
            prefix,
            priority: Priority::Normal,
            entries,
            archive: Mutex::new(archive),
        })
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of class entries in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_name(&self, class: &str) -> String {
        format!("{}{}{}", self.prefix, class, CLASS_SUFFIX)
    }

    fn read_entry(&self, name: &str) -> Result<Option<Vec<u8>>, AnalyzerError> {
        let mut archive = self.archive.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => {
                return Err(AnalyzerError::Zip {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buffer)
            .map_err(|source| AnalyzerError::Io {
                path: self.path.join(name),
                source,
            })?;
        Ok(Some(buffer))
    }

    /// Space-separated `Class-Path` attribute of the archive manifest.
    pub fn manifest_class_path(&self) -> Result<Option<Vec<String>>, AnalyzerError> {
        let Some(bytes) = self.read_entry(MANIFEST_ENTRY)? else {
            return Ok(None);
        };
        let text = String::from_utf8_lossy(&bytes);
        Ok(manifest_attribute(&text, "Class-Path").map(|value| {
            value
                .split(' ')
                .filter(|element| !element.is_empty())
                .map(str::to_string)
                .collect()
        }))
    }
}

impl ClassSource for ArchiveSource {
    fn priority(&self) -> Priority {
        self.priority
    }

    fn class_exists(&self, class: &str) -> bool {
        self.entries.contains(&self.entry_name(class))
    }

    fn report(&self, class: &str) -> Result<ClassReport, AnalyzerError> {
        tracing::trace!(class, archive = %self.path.display(), "generating class report");
        let name = self.entry_name(class);
        let bytes = self.read_entry(&name)?.ok_or_else(|| AnalyzerError::NotFound {
            class: class.to_string(),
        })?;
        ClassReport::from_bytes(&bytes).map_err(|source| AnalyzerError::ClassFile {
            path: self.path.join(&name),
            source,
        })
    }
}

/// An exploded class directory, with one `.class` file per type laid out by
/// package.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    priority: Priority,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            priority: Priority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn class_path(&self, class: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in format!("{class}{CLASS_SUFFIX}").split('/') {
            path.push(segment);
        }
        path
    }
}

impl ClassSource for DirectorySource {
    fn priority(&self) -> Priority {
        self.priority
    }

    fn class_exists(&self, class: &str) -> bool {
        self.class_path(class).is_file()
    }

    fn report(&self, class: &str) -> Result<ClassReport, AnalyzerError> {
        tracing::trace!(class, directory = %self.root.display(), "generating class report");
        let path = self.class_path(class);
        let bytes = fs::read(&path).map_err(|source| AnalyzerError::Io {
            path: path.clone(),
            source,
        })?;
        ClassReport::from_bytes(&bytes).map_err(|source| AnalyzerError::ClassFile { path, source })
    }
}

/// A ranked sub-chain consulted as a single source.
#[derive(Debug)]
pub struct CompositeSource {
    label: String,
    priority: Priority,
    sources: Vec<ClasspathSource>,
}

impl CompositeSource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            priority: Priority::Normal,
            sources: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn push(&mut self, source: ClasspathSource) {
        insert_ranked(&mut self.sources, source);
    }

    pub fn sources(&self) -> &[ClasspathSource] {
        &self.sources
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl ClassSource for CompositeSource {
    fn priority(&self) -> Priority {
        self.priority
    }

    fn class_exists(&self, class: &str) -> bool {
        self.sources.iter().any(|source| source.class_exists(class))
    }

    fn report(&self, class: &str) -> Result<ClassReport, AnalyzerError> {
        match self.sources.iter().find(|source| source.class_exists(class)) {
            Some(source) => source.report(class),
            None => Err(AnalyzerError::NotFound {
                class: class.to_string(),
            }),
        }
    }
}

/// Appends and re-sorts by rank; equal ranks keep insertion order.
pub(crate) fn insert_ranked(sources: &mut Vec<ClasspathSource>, source: ClasspathSource) {
    sources.push(source);
    sources.sort_by_key(|source| source.priority());
}

fn is_jmod(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("jmod"))
        .unwrap_or(false)
}

/// Value of a main-section manifest attribute. Continuation lines (starting
/// with a single space) are joined before matching.
pub(crate) fn manifest_attribute(manifest: &str, name: &str) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in manifest.lines() {
        if line.is_empty() {
            // end of the main section
            break;
        }
        match (line.strip_prefix(' '), lines.last_mut()) {
            (Some(continuation), Some(last)) => last.push_str(continuation),
            _ => lines.push(line.to_string()),
        }
    }

    lines.into_iter().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}
