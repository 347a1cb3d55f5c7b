use crate::apply::{apply_map, ApplySummary};
use crate::config::ToolConfig;
use crate::Cli;
use anyhow::{Context, Result};
use obfmap_analyzer::Analyzer;
use obfmap_generator::{GeneratorConfig, MapGenerator};
use obfmap_map::MappingTable;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What the tool reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `--jar`: an archive whose manifest may describe the classpath.
    Archive(PathBuf),
    /// `--file`: a class file or a class directory.
    Classes(PathBuf),
}

impl Input {
    pub fn path(&self) -> &Path {
        match self {
            Input::Archive(path) | Input::Classes(path) => path,
        }
    }
}

/// Fully resolved run options.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub input: Input,
    pub out: Option<PathBuf>,
    pub map: Option<PathBuf>,
    pub map_out: Option<PathBuf>,
    pub classpath: Option<String>,
    pub generator: GeneratorConfig,
}

impl Invocation {
    /// Resolves the parsed arguments, reading `--config` when given.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => ToolConfig::load(path)?,
            None => ToolConfig::default(),
        };
        let config = file_config.with_cli_overrides(cli);

        let input = match (&cli.jar, &cli.file) {
            (Some(jar), _) => Input::Archive(jar.clone()),
            (None, Some(file)) => Input::Classes(file.clone()),
            (None, None) => anyhow::bail!("no input has been specified"),
        };

        Ok(Self {
            input,
            out: cli.out.clone(),
            map: cli.map.clone(),
            map_out: cli.map_out.clone(),
            classpath: config.classpath,
            generator: config.generator,
        })
    }
}

/// Result of a run, for reporting.
#[derive(Debug)]
pub struct RunOutcome {
    pub table: MappingTable,
    pub generated: bool,
    pub applied: Option<ApplySummary>,
}

/// Loads or generates the map, saves it and applies it, as requested.
pub fn run(invocation: &Invocation) -> Result<RunOutcome> {
    let input = invocation.input.path();
    if !input.exists() {
        anyhow::bail!("input '{}' not found", input.display());
    }

    let (table, generated) = match &invocation.map {
        Some(map) => (load_map(map)?, false),
        None => (generate_map(invocation)?, true),
    };

    if let Some(map_out) = &invocation.map_out {
        tracing::info!(path = %map_out.display(), "saving map");
        table
            .save(map_out)
            .with_context(|| format!("failed to save map to {}", map_out.display()))?;
        tracing::info!("map was saved successfully");
    }

    let applied = match &invocation.out {
        Some(out) => {
            tracing::info!(output = %out.display(), "applying map");
            let summary = apply_map(input, out, &table)?;
            tracing::info!(classes = summary.classes, resources = summary.resources, "finished patching");
            Some(summary)
        }
        None => None,
    };

    Ok(RunOutcome {
        table,
        generated,
        applied,
    })
}

fn load_map(path: &Path) -> Result<MappingTable> {
    tracing::info!(path = %path.display(), "loading map");
    let started = Instant::now();
    let table = MappingTable::load(path).with_context(|| format!("failed to load map {}", path.display()))?;
    tracing::info!(
        entries = table.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "map parsing finished"
    );
    Ok(table)
}

fn generate_map(invocation: &Invocation) -> Result<MappingTable> {
    tracing::info!("generating a new obfuscation map");
    let analyzer = build_analyzer(invocation)?;
    let generator = MapGenerator::new(invocation.generator.clone());
    let mut session = generator.session(Some(&analyzer));

    let input = invocation.input.path();
    let classes = session
        .visit_path(input)
        .with_context(|| format!("failed to generate a map for {}", input.display()))?;
    let table = session.finish();
    tracing::info!(classes, entries = table.len(), "map generation finished");
    Ok(table)
}

/// Classpath chain for override detection.
///
/// An explicit classpath wins. An archive input falls back to its manifest
/// `Class-Path` plus the detected runtime, any other input to the detected
/// runtime alone.
pub fn build_analyzer(invocation: &Invocation) -> Result<Analyzer> {
    if let Some(classpath) = invocation.classpath.as_deref().filter(|cp| !cp.trim().is_empty()) {
        let analyzer = Analyzer::from_classpath(classpath)
            .with_context(|| format!("failed to load classpath '{classpath}'"))?;
        return Ok(analyzer);
    }

    if let Input::Archive(archive) = &invocation.input {
        let manifest = Analyzer::from_manifest(archive)
            .with_context(|| format!("failed to load the manifest class path of {}", archive.display()))?;
        if let Some(mut analyzer) = manifest {
            analyzer.add_platform_runtime();
            return Ok(analyzer);
        }
    }

    Ok(Analyzer::with_platform_runtime())
}
