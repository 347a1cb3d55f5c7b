use super::*;
use crate::config::ToolConfig;
use crate::pipeline::{Input, Invocation};
use clap::error::ErrorKind;
use clap::Parser;
use obfmap_generator::{GeneratorConfig, NameGeneratorKind};
use test_case::test_case;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("obfmap").chain(args.iter().copied()))
}

#[test]
fn test_cli_parsing() {
    let cli = parse(&["--jar", "app.jar", "-o", "out.jar", "--cp", "lib", "--trace"]).unwrap();
    assert_eq!(cli.jar.as_deref(), Some(std::path::Path::new("app.jar")));
    assert_eq!(cli.out.as_deref(), Some(std::path::Path::new("out.jar")));
    assert_eq!(cli.classpath.as_deref(), Some("lib"));
    assert!(cli.trace);

    let cli = parse(&["-f", "classes", "-w", "map.txt", "-m", "old.txt"]).unwrap();
    assert!(cli.file.is_some());
    assert!(cli.map.is_some());
    assert!(cli.map_out.is_some());
}

#[test_case(&["-o", "out"], ErrorKind::MissingRequiredArgument ; "no input")]
#[test_case(&["-j", "a.jar", "-f", "classes", "-o", "out"], ErrorKind::ArgumentConflict ; "two inputs")]
#[test_case(&["-f", "classes"], ErrorKind::MissingRequiredArgument ; "no action")]
#[test_case(&["-f", "classes", "-o", "out", "--use-uuid-name-generator", "--use-unicode-name-generator"], ErrorKind::ArgumentConflict ; "two name generators")]
fn usage_errors_are_reported(args: &[&str], kind: ErrorKind) {
    let error = parse(args).unwrap_err();
    assert_eq!(error.kind(), kind);
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn switches_override_config_file_values() {
    let file = ToolConfig::parse(
        r#"
classpath = "lib"

[generator]
name_generator = "unicode"
field_descriptor_overloading = true
"#,
    )
    .unwrap();
    assert_eq!(file.generator.name_generator, NameGeneratorKind::Unicode);
    assert!(file.generator.remove_package_names);

    let cli = parse(&[
        "-f",
        "classes",
        "-o",
        "out",
        "--use-uuid-name-generator",
        "--disable-field-overloading",
        "--preserve-package-structure",
    ])
    .unwrap();
    let merged = file.with_cli_overrides(&cli);
    assert_eq!(merged.classpath.as_deref(), Some("lib"));
    assert_eq!(
        merged.generator,
        GeneratorConfig {
            remove_package_names: false,
            field_descriptor_overloading: false,
            method_return_type_overloading: true,
            name_generator: NameGeneratorKind::Random,
        }
    );
}

#[test]
fn unknown_config_keys_are_rejected() {
    assert!(ToolConfig::parse("clas_path = \"lib\"").is_err());
    assert!(ToolConfig::parse("[generator]\nname_generator = \"fancy\"").is_err());
}

#[test]
fn invocations_resolve_input_kind() {
    let cli = parse(&["-j", "app.jar", "-w", "map.txt", "--disable-return-type-overloading"]).unwrap();
    let invocation = Invocation::from_cli(&cli).unwrap();
    assert_eq!(invocation.input, Input::Archive("app.jar".into()));
    assert!(!invocation.generator.method_return_type_overloading);
    assert!(invocation.classpath.is_none());

    let cli = parse(&["-f", "Main.class", "-o", "out"]).unwrap();
    let invocation = Invocation::from_cli(&cli).unwrap();
    assert_eq!(invocation.input, Input::Classes("Main.class".into()));
}

#[test_case(false, false, "info")]
#[test_case(true, false, "debug")]
#[test_case(false, true, "trace")]
#[test_case(true, true, "trace")]
fn logging_levels_follow_switches(debug: bool, trace: bool, expected: &str) {
    assert_eq!(logging::default_directive(debug, trace), expected);
}

#[test]
fn version_names_the_tool() {
    assert!(get_version().starts_with("obfmap "));
}
