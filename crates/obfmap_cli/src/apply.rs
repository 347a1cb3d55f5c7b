//! Writing rewritten classes for a finished mapping table.

use anyhow::{Context, Result};
use obfmap_classfile::{parse_class, rewrite_class_with, ClassHierarchy};
use obfmap_generator::{is_class_file, InputKind};
use obfmap_map::MappingTable;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const CLASS_SUFFIX: &str = ".class";

/// Counts of an apply run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub classes: usize,
    pub resources: usize,
}

/// Rewrites `input` into `output`. A class file becomes the file `output`
/// (or `<mapped type name>.class` inside `output` when that is an existing
/// directory); a directory or archive becomes a directory or archive at
/// `output`.
pub fn apply_map(input: &Path, output: &Path, table: &MappingTable) -> Result<ApplySummary> {
    match InputKind::of(input) {
        InputKind::ClassFile => {
            let bytes = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
            let structure = parse_class(&bytes).with_context(|| format!("failed to parse {}", input.display()))?;
            let hierarchy = ClassHierarchy::from_structures([&structure]);
            let rewritten =
                rewrite(&bytes, table, &hierarchy).with_context(|| format!("failed to rewrite {}", input.display()))?;
            let target = if output.is_dir() {
                output.join(class_entry_name(table.map_type_name(&structure.name)))
            } else {
                output.to_path_buf()
            };
            write_file(&target, &rewritten)?;
            Ok(ApplySummary {
                classes: 1,
                resources: 0,
            })
        }
        InputKind::Directory => apply_directory(input, output, table),
        InputKind::Archive => apply_archive(input, output, table),
    }
}

/// Class files land at `<mapped type name>.class` below `output`; other files
/// keep their relative path.
pub fn apply_directory(input: &Path, output: &Path, table: &MappingTable) -> Result<ApplySummary> {
    let hierarchy = directory_hierarchy(input)?;
    let mut summary = ApplySummary::default();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to traverse {}", input.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        if is_class_file(path) {
            let structure = parse_class(&bytes).with_context(|| format!("failed to parse {}", path.display()))?;
            let rewritten =
                rewrite(&bytes, table, &hierarchy).with_context(|| format!("failed to rewrite {}", path.display()))?;
            let target = output.join(class_entry_name(table.map_type_name(&structure.name)));
            write_file(&target, &rewritten)?;
            summary.classes += 1;
        } else {
            let relative = path.strip_prefix(input).unwrap_or(path);
            write_file(&output.join(relative), &bytes)?;
            summary.resources += 1;
        }
    }
    Ok(summary)
}

/// Class entries are rewritten and stored under their mapped type name, every
/// other entry is copied unchanged.
pub fn apply_archive(input: &Path, output: &Path, table: &MappingTable) -> Result<ApplySummary> {
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("failed to read archive {}", input.display()))?;
    let hierarchy = archive_hierarchy(&mut archive, input)?;

    create_parent(output)?;
    let target = File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(target));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut summary = ApplySummary::default();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read entry {index} of {}", input.display()))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .with_context(|| format!("failed to write directory entry {name}"))?;
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read entry {name}"))?;

        match name.strip_suffix(CLASS_SUFFIX) {
            Some(class_name) => {
                let rewritten = rewrite(&bytes, table, &hierarchy).with_context(|| format!("failed to rewrite {name}"))?;
                let mapped = class_entry_name(table.map_type_name(class_name));
                tracing::trace!(entry = %name, mapped = %mapped, "rewrote class entry");
                writer
                    .start_file(mapped.as_str(), options)
                    .with_context(|| format!("failed to write entry {mapped}"))?;
                writer.write_all(&rewritten)?;
                summary.classes += 1;
            }
            None => {
                writer
                    .start_file(name.as_str(), options)
                    .with_context(|| format!("failed to write entry {name}"))?;
                writer.write_all(&bytes)?;
                summary.resources += 1;
            }
        }
    }

    writer
        .finish()
        .with_context(|| format!("failed to finish archive {}", output.display()))?
        .flush()?;
    Ok(summary)
}

fn rewrite(bytes: &[u8], table: &MappingTable, hierarchy: &ClassHierarchy) -> Result<Vec<u8>> {
    Ok(rewrite_class_with(bytes, table, hierarchy)?)
}

/// Supertypes of every class below `input`, read before anything is written.
fn directory_hierarchy(input: &Path) -> Result<ClassHierarchy> {
    let mut hierarchy = ClassHierarchy::new();
    for entry in WalkDir::new(input) {
        let entry = entry.with_context(|| format!("failed to traverse {}", input.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && is_class_file(path) {
            let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let structure = parse_class(&bytes).with_context(|| format!("failed to parse {}", path.display()))?;
            hierarchy.insert(&structure);
        }
    }
    tracing::debug!(classes = hierarchy.len(), "collected class hierarchy");
    Ok(hierarchy)
}

fn archive_hierarchy<R: Read + Seek>(archive: &mut ZipArchive<R>, input: &Path) -> Result<ClassHierarchy> {
    let mut hierarchy = ClassHierarchy::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read entry {index} of {}", input.display()))?;
        if entry.is_dir() || !entry.name().ends_with(CLASS_SUFFIX) {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read entry {name}"))?;
        let structure = parse_class(&bytes).with_context(|| format!("failed to parse {name}"))?;
        hierarchy.insert(&structure);
    }
    tracing::debug!(classes = hierarchy.len(), "collected class hierarchy");
    Ok(hierarchy)
}

fn class_entry_name(type_name: &str) -> String {
    format!("{type_name}{CLASS_SUFFIX}")
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    create_parent(path)?;
    let mut file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("failed to write {}", path.display()))
}
