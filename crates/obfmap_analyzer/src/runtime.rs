//! Classpath sources for an installed Java runtime.

use crate::error::AnalyzerError;
use crate::source::{ArchiveSource, ClasspathSource, CompositeSource, Priority};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Main class archive of a pre-module runtime.
const RUNTIME_ARCHIVE: &str = "rt.jar";

/// Archives shipped next to `rt.jar` by some runtime versions and vendors.
const OPTIONAL_ARCHIVES: [&str; 10] = [
    "charsets.jar",
    "deploy.jar",
    "javaws.jar",
    "jce.jar",
    "jfr.jar",
    "jfxswt.jar",
    "jsse.jar",
    "management-agent.jar",
    "plugin.jar",
    "resources.jar",
];

const BASE_MODULE: &str = "java.base.jmod";

/// Builds the source chain of the runtime installed at `home`.
///
/// Pre-module runtimes contribute `lib/rt.jar` (or `jre/lib/rt.jar`) at high
/// priority plus whichever optional archives exist. Modular runtimes
/// contribute every `jmods/*.jmod`, with `java.base` at high priority.
pub fn platform_runtime(home: &Path) -> Result<CompositeSource, AnalyzerError> {
    if !home.is_dir() {
        return Err(AnalyzerError::InvalidJavaHome {
            path: home.to_path_buf(),
            reason: "no such directory",
        });
    }

    let mut runtime = CompositeSource::new(format!("platform runtime {}", home.display()));

    if let Some(library) = legacy_library_dir(home) {
        tracing::debug!(library = %library.display(), "loading legacy runtime archives");
        for name in OPTIONAL_ARCHIVES {
            let path = library.join(name);
            if !path.is_file() {
                continue;
            }
            match ArchiveSource::open(&path) {
                Ok(source) => runtime.push(ClasspathSource::Archive(source)),
                Err(error) => tracing::debug!(%error, "skipping optional runtime archive"),
            }
        }
        let primary = ArchiveSource::open(library.join(RUNTIME_ARCHIVE))?;
        runtime.push(ClasspathSource::Archive(primary.with_priority(Priority::High)));
        return Ok(runtime);
    }

    let jmods = home.join("jmods");
    if jmods.is_dir() {
        tracing::debug!(jmods = %jmods.display(), "loading runtime modules");
        for path in module_archives(&jmods)? {
            let priority = if path.file_name() == Some(OsStr::new(BASE_MODULE)) {
                Priority::High
            } else {
                Priority::Normal
            };
            let source = ArchiveSource::open(&path)?;
            runtime.push(ClasspathSource::Archive(source.with_priority(priority)));
        }
        return Ok(runtime);
    }

    Err(AnalyzerError::InvalidJavaHome {
        path: home.to_path_buf(),
        reason: "neither lib/rt.jar nor a jmods directory was found",
    })
}

fn legacy_library_dir(home: &Path) -> Option<PathBuf> {
    [home.join("lib"), home.join("jre").join("lib")]
        .into_iter()
        .find(|library| library.join(RUNTIME_ARCHIVE).is_file())
}

fn module_archives(jmods: &Path) -> Result<Vec<PathBuf>, AnalyzerError> {
    let entries = fs::read_dir(jmods).map_err(|source| AnalyzerError::Io {
        path: jmods.to_path_buf(),
        source,
    })?;

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AnalyzerError::Io {
            path: jmods.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(OsStr::to_str) == Some("jmod") {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

/// `JAVA_HOME` if it names an existing directory, else the installation
/// that owns the `java` executable on `PATH`.
pub fn detect_java_home() -> Option<PathBuf> {
    if let Ok(path) = env::var("JAVA_HOME") {
        let candidate = PathBuf::from(path);
        if candidate.is_dir() {
            return Some(candidate);
        }
    }

    if let Ok(java_path) = which::which("java") {
        let java_path = fs::canonicalize(&java_path).unwrap_or(java_path);
        if let Some(bin_dir) = java_path.parent() {
            if let Some(home) = bin_dir.parent() {
                return Some(home.to_path_buf());
            }
        }
    }

    None
}
