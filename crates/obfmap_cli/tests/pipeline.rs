use obfmap_classfile::{parse_class, ClassFile, ClassFileBuilder, ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
use obfmap_cli::pipeline::{build_analyzer, run, Input, Invocation};
use obfmap_generator::GeneratorConfig;
use obfmap_map::{Category, MappingTable};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const MAIN: &str = "com/example/Main";
const HELPER: &str = "com/example/Main$Helper";

fn main_class() -> Vec<u8> {
    ClassFileBuilder::new(MAIN)
        .field(ACC_PRIVATE, "counter", "I")
        .method(ACC_PUBLIC, "<init>", "()V")
        .method(ACC_PUBLIC, "tick", "()V")
        .method_ref(HELPER, "help", "(I)V")
        .inner_class(HELPER, Some(MAIN), Some("Helper"), ACC_PUBLIC | ACC_STATIC)
        .build()
        .expect("build main")
}

fn helper_class() -> Vec<u8> {
    ClassFileBuilder::new(HELPER)
        .method(ACC_PUBLIC | ACC_STATIC, "help", "(I)V")
        .inner_class(HELPER, Some(MAIN), Some("Helper"), ACC_PUBLIC | ACC_STATIC)
        .build()
        .expect("build helper")
}

fn invocation(input: Input, classpath: &Path) -> Invocation {
    Invocation {
        input,
        out: None,
        map: None,
        map_out: None,
        classpath: Some(classpath.display().to_string()),
        generator: GeneratorConfig::default(),
    }
}

fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let mut writer = ZipWriter::new(File::create(path).expect("create jar"));
    for (name, bytes) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(bytes).expect("write entry");
    }
    writer.finish().expect("finish jar");
}

fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).expect("open jar")).expect("read jar");
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).expect("entry");
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).expect("read entry");
        entries.push((entry.name().to_string(), bytes));
    }
    entries
}

#[test]
fn directory_input_generates_saves_and_applies() {
    let dir = tempfile::tempdir().expect("temp dir");
    let classes = dir.path().join("classes");
    fs::create_dir_all(classes.join("com/example")).expect("create classes");
    fs::write(classes.join("com/example/Main.class"), main_class()).expect("write main");
    fs::write(classes.join("com/example/Main$Helper.class"), helper_class()).expect("write helper");
    fs::write(classes.join("com/example/messages.properties"), "greeting=hi").expect("write resource");

    let mut invocation = invocation(Input::Classes(classes.clone()), &dir.path().join("empty"));
    fs::create_dir_all(dir.path().join("empty")).expect("create empty classpath");
    let out = dir.path().join("out");
    let map = dir.path().join("map.txt");
    invocation.out = Some(out.clone());
    invocation.map_out = Some(map.clone());

    let outcome = run(&invocation).expect("run");
    assert!(outcome.generated);
    assert_eq!(outcome.table.category_len(Category::Type), 2);
    let applied = outcome.applied.expect("applied");
    assert_eq!(applied.classes, 2);
    assert_eq!(applied.resources, 1);

    let saved = MappingTable::load(&map).expect("load saved map");
    assert_eq!(saved.len(), outcome.table.len());

    let main_name = outcome.table.map_type_name(MAIN).to_string();
    let rewritten = fs::read(out.join(format!("{main_name}.class"))).expect("rewritten main");
    let structure = parse_class(&rewritten).expect("parse rewritten main");
    assert_eq!(structure.name, main_name);
    assert_eq!(structure.nested_types, [outcome.table.map_type_name(HELPER)]);
    assert!(structure.methods.iter().any(|method| method.name == "<init>"));
    assert!(structure.methods.iter().all(|method| method.name != "tick"));
    assert!(out.join("com/example/messages.properties").is_file());
}

#[test]
fn archive_entries_are_renamed_and_resources_copied() {
    let dir = tempfile::tempdir().expect("temp dir");
    let jar = dir.path().join("app.jar");
    write_jar(
        &jar,
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
            ("com/example/Main.class", main_class()),
            ("com/example/Main$Helper.class", helper_class()),
        ],
    );
    fs::create_dir_all(dir.path().join("empty")).expect("create empty classpath");

    let mut invocation = invocation(Input::Archive(jar), &dir.path().join("empty"));
    let out = dir.path().join("dist/obfuscated.jar");
    invocation.out = Some(out.clone());

    let outcome = run(&invocation).expect("run");
    let entries = read_jar(&out);
    let names: Vec<_> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["META-INF/MANIFEST.MF", "A.class", "B.class"]);
    assert_eq!(entries[0].1, b"Manifest-Version: 1.0\n");

    let helper = parse_class(&entries[2].1).expect("parse helper");
    assert_eq!(helper.name, outcome.table.map_type_name(HELPER));
    assert_eq!(helper.methods[0].name, outcome.table.map_method_name(HELPER, "help", "(I)V"));
}

#[test]
fn existing_maps_are_applied_without_generating() {
    let dir = tempfile::tempdir().expect("temp dir");
    let class = dir.path().join("Main.class");
    fs::write(&class, main_class()).expect("write class");
    let map = dir.path().join("map.txt");
    fs::write(&map, "TYP com/example/Main TYP Renamed\n").expect("write map");

    let mut invocation = invocation(Input::Classes(class), dir.path());
    invocation.map = Some(map);
    invocation.out = Some(dir.path().join("Renamed.class"));

    let outcome = run(&invocation).expect("run");
    assert!(!outcome.generated);
    assert_eq!(outcome.table.len(), 1);
    let structure = parse_class(&fs::read(dir.path().join("Renamed.class")).expect("output"))
        .expect("parse output");
    assert_eq!(structure.name, "Renamed");
    assert!(structure.methods.iter().any(|method| method.name == "tick"));
}

#[test]
fn missing_inputs_fail_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut invocation = invocation(Input::Classes(dir.path().join("missing")), dir.path());
    invocation.map_out = Some(dir.path().join("map.txt"));
    let error = run(&invocation).expect_err("missing input");
    assert!(format!("{error:#}").contains("not found"));
}

#[test]
fn manifest_class_path_feeds_the_analyzer() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lib = dir.path().join("lib");
    fs::create_dir_all(&lib).expect("create lib");
    write_jar(&lib.join("base.jar"), &[("com/example/Base.class", main_class())]);
    let jar = dir.path().join("app.jar");
    write_jar(
        &jar,
        &[(
            "META-INF/MANIFEST.MF",
            b"Manifest-Version: 1.0\nClass-Path: lib/base.jar\n".to_vec(),
        )],
    );

    let mut invocation = invocation(Input::Archive(jar), dir.path());
    invocation.classpath = None;
    let analyzer = build_analyzer(&invocation).expect("analyzer");
    assert!(analyzer.class_exists("com/example/Base"));
}

#[test]
fn explicit_classpath_takes_precedence() {
    let dir = tempfile::tempdir().expect("temp dir");
    let classes: PathBuf = dir.path().join("classes");
    fs::create_dir_all(classes.join("com/example")).expect("create classes");
    fs::write(classes.join("com/example/Main.class"), main_class()).expect("write main");

    let invocation = invocation(Input::Classes(dir.path().join("Main.class")), &classes);
    let analyzer = build_analyzer(&invocation).expect("analyzer");
    assert_eq!(analyzer.sources().len(), 1);
    assert!(analyzer.class_exists(MAIN));
}

#[test]
fn calls_through_a_subclass_follow_the_renamed_inherited_method() {
    let dir = tempfile::tempdir().expect("temp dir");
    let jar = dir.path().join("app.jar");
    let base = ClassFileBuilder::new("com/example/Base")
        .method(ACC_PUBLIC, "helper", "()V")
        .build()
        .expect("build base");
    let child = ClassFileBuilder::new("com/example/Child")
        .super_class(Some("com/example/Base"))
        .build()
        .expect("build child");
    let caller = ClassFileBuilder::new("com/example/Caller")
        .method_ref("com/example/Child", "helper", "()V")
        .build()
        .expect("build caller");
    write_jar(
        &jar,
        &[
            ("com/example/Base.class", base),
            ("com/example/Child.class", child),
            ("com/example/Caller.class", caller),
        ],
    );
    fs::create_dir_all(dir.path().join("empty")).expect("create empty classpath");

    let mut invocation = invocation(Input::Archive(jar), &dir.path().join("empty"));
    let out = dir.path().join("out.jar");
    invocation.out = Some(out.clone());
    let outcome = run(&invocation).expect("run");

    let renamed = outcome
        .table
        .map_method_name("com/example/Base", "helper", "()V")
        .to_string();
    assert_ne!(renamed, "helper");
    let child_name = outcome.table.map_type_name("com/example/Child").to_string();

    let entries = read_jar(&out);
    let caller_name = format!("{}.class", outcome.table.map_type_name("com/example/Caller"));
    let (_, bytes) = entries
        .iter()
        .find(|(name, _)| *name == caller_name)
        .expect("rewritten caller");
    let references = ClassFile::parse(bytes)
        .expect("parse caller")
        .member_references()
        .expect("references");
    assert!(references
        .iter()
        .any(|reference| reference.owner == child_name && reference.name == renamed));
}
