use obfmap_analyzer::{Analyzer, ClasspathSource, DirectorySource};
use obfmap_classfile::{
    parse_class, ClassFileBuilder, ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE, ACC_PRIVATE, ACC_PUBLIC,
    ACC_STATIC, ACC_SYNTHETIC,
};
use obfmap_generator::{class_files, InputKind, MapGenerator};
use obfmap_map::{Category, Symbol};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const TEST: &str = "com/example/Test";

fn write_class(root: &Path, name: &str, bytes: &[u8]) {
    let path = root.join(format!("{name}.class"));
    fs::create_dir_all(path.parent().expect("class parent")).expect("create package dirs");
    fs::write(path, bytes).expect("write class");
}

/// Minimal runtime with the two supertypes the fixture inherits from.
fn runtime(root: &Path) -> Analyzer {
    write_class(
        root,
        "java/lang/Object",
        &ClassFileBuilder::new("java/lang/Object")
            .super_class(None)
            .method(ACC_PUBLIC, "<init>", "()V")
            .method(ACC_PUBLIC, "equals", "(Ljava/lang/Object;)Z")
            .method(ACC_PUBLIC, "hashCode", "()I")
            .method(ACC_PUBLIC | ACC_FINAL, "getClass", "()Ljava/lang/Class;")
            .build()
            .expect("build Object"),
    );
    write_class(
        root,
        "java/lang/Comparable",
        &ClassFileBuilder::new("java/lang/Comparable")
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .method(ACC_PUBLIC | ACC_ABSTRACT, "compareTo", "(Ljava/lang/Object;)I")
            .build()
            .expect("build Comparable"),
    );

    let mut analyzer = Analyzer::new();
    analyzer.add_source(ClasspathSource::Directory(DirectorySource::new(root)));
    analyzer
}

fn fixture() -> Vec<u8> {
    ClassFileBuilder::new(TEST)
        .interface("java/lang/Comparable")
        .field(ACC_PRIVATE, "field1", "I")
        .field(ACC_PRIVATE, "field2", "J")
        .field(ACC_PRIVATE, "field3", "Ljava/lang/String;")
        .field(ACC_PRIVATE, "field4", "[B")
        .field(ACC_PRIVATE | ACC_STATIC, "field5", "Lcom/example/Test;")
        .field(ACC_PUBLIC, "field6", "Z")
        .field(ACC_PUBLIC | ACC_FINAL, "field7", "D")
        .method(ACC_PUBLIC, "<init>", "()V")
        .method(ACC_PUBLIC, "method1", "()V")
        .method(ACC_PUBLIC, "method2", "(I)I")
        .method(ACC_PUBLIC, "method3", "(Ljava/lang/String;)V")
        .method(ACC_PRIVATE, "method4", "()Lcom/example/Test;")
        .method(ACC_PUBLIC | ACC_STATIC, "method5", "([Ljava/lang/String;)V")
        .method(ACC_PUBLIC | ACC_FINAL, "method6", "(JJ)J")
        .method(ACC_PUBLIC, "compareTo", "(Lcom/example/Test;)I")
        .method(ACC_PUBLIC | ACC_SYNTHETIC, "compareTo", "(Ljava/lang/Object;)I")
        .method(ACC_PUBLIC, "equals", "(Ljava/lang/Object;)Z")
        .invoke_dynamic("run", "()Ljava/lang/Runnable;")
        .inner_class("com/example/Test$Inner", Some(TEST), Some("Inner"), ACC_PUBLIC)
        .inner_class(
            "com/example/Test$Nested",
            Some(TEST),
            Some("Nested"),
            ACC_PUBLIC | ACC_STATIC,
        )
        .inner_class("com/example/Test$1", None, None, 0)
        .inner_class("com/example/Test$2", None, None, 0)
        .inner_class("java/util/Map$Entry", Some("java/util/Map"), Some("Entry"), ACC_PUBLIC)
        .build()
        .expect("build fixture")
}

#[test]
fn fixture_class_yields_expected_mapping_counts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let analyzer = runtime(dir.path());
    let class = parse_class(&fixture()).expect("parse fixture");

    let table = MapGenerator::default()
        .generate([&class], Some(&analyzer))
        .expect("generate");

    assert_eq!(table.category_len(Category::Field), 7);
    assert_eq!(table.category_len(Category::Method), 7);
    assert_eq!(table.category_len(Category::Type), 5);
    assert_eq!(table.category_len(Category::DynamicCall), 1);

    // overrides of Object and Comparable keep their names
    assert_eq!(table.map_method_name(TEST, "equals", "(Ljava/lang/Object;)Z"), "equals");
    assert_eq!(table.map_method_name(TEST, "compareTo", "(Ljava/lang/Object;)I"), "compareTo");
    assert_ne!(table.map_method_name(TEST, "compareTo", "(Lcom/example/Test;)I"), "compareTo");
    assert_eq!(table.map_type_name("java/util/Map$Entry"), "java/util/Map$Entry");
}

#[test]
fn fixture_without_analyzer_renames_overrides_too() {
    let class = parse_class(&fixture()).expect("parse fixture");
    let table = MapGenerator::default()
        .generate([&class], None)
        .expect("generate");
    assert_eq!(table.category_len(Category::Method), 9);
}

#[test]
fn overriding_methods_are_not_mapped() {
    let dir = tempfile::tempdir().expect("temp dir");
    let classpath = dir.path().join("classpath");
    write_class(
        &classpath,
        "com/example/Base",
        &ClassFileBuilder::new("com/example/Base")
            .method(ACC_PUBLIC, "run", "()V")
            .method(ACC_PUBLIC | ACC_FINAL, "stop", "()V")
            .build()
            .expect("build base"),
    );
    let mut analyzer = Analyzer::new();
    analyzer.add_source(ClasspathSource::Directory(DirectorySource::new(&classpath)));

    let child = parse_class(
        &ClassFileBuilder::new("com/example/Child")
            .super_class(Some("com/example/Base"))
            .method(ACC_PUBLIC, "run", "()V")
            .method(ACC_PUBLIC, "run", "(I)V")
            .method(ACC_PUBLIC, "stop", "()V")
            .build()
            .expect("build child"),
    )
    .expect("parse child");

    let table = MapGenerator::default()
        .generate([&child], Some(&analyzer))
        .expect("generate");

    assert!(!table.contains(&Symbol::method("com/example/Child", "run", "()V")));
    assert!(table.contains(&Symbol::method("com/example/Child", "run", "(I)V")));
    // final methods cannot be overridden, so they are not reported
    assert!(table.contains(&Symbol::method("com/example/Child", "stop", "()V")));
}

#[test]
fn unreadable_parents_leave_methods_unrenamed() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_class(dir.path(), "com/example/Broken", b"not a class");
    let mut analyzer = Analyzer::new();
    analyzer.add_source(ClasspathSource::Directory(DirectorySource::new(dir.path())));

    let child = parse_class(
        &ClassFileBuilder::new("com/example/Child")
            .super_class(Some("com/example/Broken"))
            .field(ACC_PRIVATE, "count", "I")
            .method(ACC_PUBLIC, "run", "()V")
            .build()
            .expect("build child"),
    )
    .expect("parse child");

    let table = MapGenerator::default()
        .generate([&child], Some(&analyzer))
        .expect("generation continues");

    assert_eq!(table.category_len(Category::Method), 0);
    assert_eq!(table.category_len(Category::Field), 1);
    assert_eq!(table.category_len(Category::Type), 1);
}

#[test]
fn sessions_share_names_across_classes() {
    let first = parse_class(
        &ClassFileBuilder::new("First")
            .method(ACC_PUBLIC, "run", "()V")
            .build()
            .expect("build first"),
    )
    .expect("parse first");
    let second = parse_class(
        &ClassFileBuilder::new("Second")
            .method(ACC_PUBLIC, "run", "()V")
            .build()
            .expect("build second"),
    )
    .expect("parse second");

    let generator = MapGenerator::default();
    let mut session = generator.session(None);
    session.visit_class(&first).expect("first");
    session.visit_class(&second).expect("second");
    let table = session.finish();

    assert_eq!(table.map_type_name("First"), "A");
    assert_eq!(table.map_type_name("Second"), "B");
    let methods: HashSet<_> = table
        .category(Category::Method)
        .map(|(_, replacement)| replacement.name().to_string())
        .collect();
    assert_eq!(methods.len(), 2);
}

#[test]
fn directories_are_visited_in_sorted_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["b/Second", "a/First", "c/Third"] {
        let bytes = ClassFileBuilder::new(name).build().expect("build class");
        write_class(dir.path(), name, &bytes);
    }
    fs::write(dir.path().join("a/readme.txt"), "ignored").expect("write text");

    let files = class_files(dir.path()).expect("class files");
    assert_eq!(files.len(), 3);
    assert_eq!(InputKind::of(dir.path()), InputKind::Directory);
    assert_eq!(InputKind::of(&files[0]), InputKind::ClassFile);

    let generator = MapGenerator::default();
    let mut session = generator.session(None);
    assert_eq!(session.visit_path(dir.path()).expect("visit"), 3);
    let table = session.finish();
    assert_eq!(table.map_type_name("a/First"), "A");
    assert_eq!(table.map_type_name("b/Second"), "B");
    assert_eq!(table.map_type_name("c/Third"), "C");
}

#[test]
fn archives_are_visited_in_entry_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let jar = dir.path().join("app.jar");
    let mut writer = ZipWriter::new(File::create(&jar).expect("create jar"));
    writer
        .start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
        .expect("start manifest");
    writer
        .write_all(b"Manifest-Version: 1.0\n")
        .expect("write manifest");
    for name in ["z/Last", "a/First"] {
        writer
            .start_file(format!("{name}.class"), SimpleFileOptions::default())
            .expect("start entry");
        writer
            .write_all(&ClassFileBuilder::new(name).build().expect("build class"))
            .expect("write entry");
    }
    writer.finish().expect("finish jar");

    assert_eq!(InputKind::of(&jar), InputKind::Archive);
    let generator = MapGenerator::default();
    let mut session = generator.session(None);
    assert_eq!(session.visit_path(&jar).expect("visit"), 2);
    assert_eq!(session.table().map_type_name("z/Last"), "A");
    assert_eq!(session.table().map_type_name("a/First"), "B");
}
