// obfmap_generator - collision-free mapping generation

mod config;
mod error;
mod generator;
mod input;
mod names;

pub use config::{GeneratorConfig, NameGeneratorKind};
pub use error::GenerateError;
pub use generator::{MapGenerator, Session};
pub use input::{class_files, is_class_file, read_class_file, InputKind};
pub use names::{
    NameCursors, NameGenerator, NameGenerators, RandomNameGenerator, SequentialNameGenerator,
    MEMBER_ALPHABET, TYPE_ALPHABET,
};

#[cfg(test)]
mod tests;
