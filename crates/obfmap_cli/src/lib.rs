// obfmap_cli - command line surface (library interface for testing)
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

pub mod apply;
pub mod config;
pub mod logging;
pub mod pipeline;

#[derive(Parser, Debug)]
#[command(name = "obfmap")]
#[command(version, about = "Renames the types and members of compiled JVM classes")]
#[command(group(ArgGroup::new("input").required(true).args(["jar", "file"])))]
#[command(group(ArgGroup::new("action").required(true).multiple(true).args(["out", "map_out"])))]
pub struct Cli {
    /// Loads a jar as input
    #[arg(short = 'j', long, value_name = "JAR FILE")]
    pub jar: Option<PathBuf>,
    /// Loads a class file or directory as input
    #[arg(short = 'f', long, value_name = "CLASS FILE")]
    pub file: Option<PathBuf>,
    /// Output file or directory for the rewritten classes
    #[arg(short = 'o', long, value_name = "FILE OR DIRECTORY")]
    pub out: Option<PathBuf>,
    /// Applies an existing map instead of generating one
    #[arg(short = 'm', long, value_name = "MAP FILE")]
    pub map: Option<PathBuf>,
    /// Saves the map to a file
    #[arg(short = 'w', long = "map-out", value_name = "MAP FILE")]
    pub map_out: Option<PathBuf>,
    /// Jars and directories making up the Java classpath; prefix a Java home with "java:"
    #[arg(long, visible_alias = "cp", value_name = "CLASSPATH")]
    pub classpath: Option<String>,
    /// Keeps package names in generated type names
    #[arg(long)]
    pub preserve_package_structure: bool,
    /// Treats same-named fields as one target regardless of their type
    #[arg(long)]
    pub disable_field_overloading: bool,
    /// Treats methods differing only in return type as one target
    #[arg(long)]
    pub disable_return_type_overloading: bool,
    /// Generates random UUID names
    #[arg(long, conflicts_with = "use_unicode_name_generator")]
    pub use_uuid_name_generator: bool,
    /// Generates member names from CJK ideographs
    #[arg(long)]
    pub use_unicode_name_generator: bool,
    /// TOML file with generator defaults
    #[arg(long, value_name = "TOML FILE")]
    pub config: Option<PathBuf>,
    /// Enables debug logging
    #[arg(long)]
    pub debug: bool,
    /// Enables trace logging
    #[arg(long)]
    pub trace: bool,
}

pub fn get_version() -> String {
    format!("obfmap {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests;
