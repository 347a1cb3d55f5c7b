//! Feeding class files, class directories and archives into a session.

use crate::error::GenerateError;
use crate::generator::Session;
use obfmap_classfile::{parse_class, ClassStructure};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;
use zip::ZipArchive;

const CLASS_EXTENSION: &str = "class";

/// Shape of a generation or rewrite input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    ClassFile,
    Directory,
    Archive,
}

impl InputKind {
    /// Directories are exploded class trees, `*.class` files single classes,
    /// anything else an archive.
    pub fn of(path: &Path) -> Self {
        if path.is_dir() {
            InputKind::Directory
        } else if is_class_file(path) {
            InputKind::ClassFile
        } else {
            InputKind::Archive
        }
    }
}

pub fn is_class_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(CLASS_EXTENSION))
}

/// Every `.class` file below `root`, in file name order per directory.
pub fn class_files(root: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| GenerateError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_class_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn read_class_file(path: &Path) -> Result<ClassStructure, GenerateError> {
    let bytes = fs::read(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_class(&bytes).map_err(|source| GenerateError::ClassFile {
        path: path.to_path_buf(),
        source,
    })
}

impl Session<'_> {
    /// Visits whatever `path` holds. Returns the number of classes visited.
    pub fn visit_path(&mut self, path: &Path) -> Result<usize, GenerateError> {
        match InputKind::of(path) {
            InputKind::ClassFile => {
                self.visit_class_file(path)?;
                Ok(1)
            }
            InputKind::Directory => self.visit_directory(path),
            InputKind::Archive => self.visit_archive(path),
        }
    }

    pub fn visit_class_file(&mut self, path: &Path) -> Result<(), GenerateError> {
        let structure = read_class_file(path)?;
        self.visit_class(&structure)
    }

    /// Visits every class file below `root` in sorted order.
    pub fn visit_directory(&mut self, root: &Path) -> Result<usize, GenerateError> {
        let files = class_files(root)?;
        for file in &files {
            self.visit_class_file(file)?;
        }
        tracing::debug!(root = %root.display(), classes = files.len(), "generated mappings for directory");
        Ok(files.len())
    }

    /// Visits every `.class` entry of the archive in entry order.
    pub fn visit_archive(&mut self, path: &Path) -> Result<usize, GenerateError> {
        let started = Instant::now();
        let file = File::open(path).map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|source| GenerateError::Zip {
            path: path.to_path_buf(),
            source,
        })?;

        let mut visited = 0;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|source| GenerateError::Zip {
                path: path.to_path_buf(),
                source,
            })?;
            if entry.is_dir() || !entry.name().ends_with(".class") {
                continue;
            }

            let entry_path = path.join(entry.name());
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes).map_err(|source| GenerateError::Io {
                path: entry_path.clone(),
                source,
            })?;
            drop(entry);

            let structure = parse_class(&bytes).map_err(|source| GenerateError::ClassFile {
                path: entry_path,
                source,
            })?;
            self.visit_class(&structure)?;
            visited += 1;
        }

        tracing::debug!(
            archive = %path.display(),
            classes = visited,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated mappings for archive"
        );
        Ok(visited)
    }
}
