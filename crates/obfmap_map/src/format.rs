//! Textual map file format.
//!
//! One entry per line: `<code> <original> <code> <replacement>`. Lines starting
//! with `//` and blank lines are ignored when reading.

use crate::category::CategoryRegistry;
use crate::error::MapError;
use crate::table::MappingTable;
use chrono::Utc;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub const COMMENT_PREFIX: &str = "//";
pub const MAP_FORMAT_VERSION: &str = "1";

impl MappingTable {
    /// Writes the banner followed by every entry in category order.
    pub fn serialize<W: Write>(&self, sink: W) -> Result<(), MapError> {
        let mut writer = BufWriter::new(sink);
        write_banner(&mut writer)?;

        for (original, replacement) in self.sorted_entries() {
            let original_code = self.registry().code_of(original.category())?;
            let replacement_code = self.registry().code_of(replacement.category())?;
            writeln!(
                writer,
                "{} {} {} {}",
                original_code,
                original.serialize(),
                replacement_code,
                replacement.serialize()
            )?;
        }

        writeln!(writer, "{COMMENT_PREFIX} EOF")?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a map using the default category registry.
    pub fn deserialize<R: BufRead>(source: R) -> Result<Self, MapError> {
        Self::deserialize_with(CategoryRegistry::default(), source)
    }

    pub fn deserialize_with<R: BufRead>(
        registry: CategoryRegistry,
        source: R,
    ) -> Result<Self, MapError> {
        let mut table = MappingTable::with_registry(registry);
        table.read_entries(source)?;
        Ok(table)
    }

    /// Adds every entry of `source` to this table.
    pub fn read_entries<R: BufRead>(&mut self, source: R) -> Result<(), MapError> {
        for (index, line) in source.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let elements: Vec<&str> = trimmed.split_whitespace().collect();
            let [original_code, original, replacement_code, replacement] = elements[..] else {
                return Err(MapError::MalformedLine { line: line_number });
            };

            let at_line = |source: MapError| MapError::Line {
                line: line_number,
                source: Box::new(source),
            };
            let original = self
                .registry()
                .parse(original_code, original)
                .map_err(at_line)?;
            let replacement = self
                .registry()
                .parse(replacement_code, replacement)
                .map_err(at_line)?;
            self.add(original, replacement).map_err(at_line)?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, MapError> {
        let file = File::open(path)?;
        let table = Self::deserialize(BufReader::new(file))?;
        debug!(path = %path.display(), entries = table.len(), "loaded map");
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<(), MapError> {
        let file = File::create(path)?;
        self.serialize(file)?;
        debug!(path = %path.display(), entries = self.len(), "saved map");
        Ok(())
    }
}

fn write_banner<W: Write>(writer: &mut W) -> Result<(), MapError> {
    let lines = [
        Some("obfmap symbol map".to_string()),
        None,
        Some(format!(
            "Generated on: {}",
            Utc::now().format("%Y-%m-%dT%H:%MZ")
        )),
        Some(format!("Generator: {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))),
        Some(format!("Map Version: {MAP_FORMAT_VERSION}")),
        None,
    ];

    let width = lines
        .iter()
        .flatten()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    for line in &lines {
        match line {
            Some(text) => {
                let padding = (width - text.chars().count()) / 2;
                writeln!(writer, "{COMMENT_PREFIX} {:padding$}{text}", "")?;
            }
            None => writeln!(writer, "{COMMENT_PREFIX} {}", "-".repeat(width))?,
        }
    }
    Ok(())
}
