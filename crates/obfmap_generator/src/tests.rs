use super::*;
use obfmap_classfile::{parse_class, ClassFileBuilder, ClassStructure, ACC_FINAL, ACC_PUBLIC};
use obfmap_map::{Category, MappingTable, Symbol};
use std::collections::HashSet;
use std::sync::Arc;
use test_case::test_case;

fn structure(builder: ClassFileBuilder) -> ClassStructure {
    parse_class(&builder.build().unwrap()).unwrap()
}

fn replacements(table: &MappingTable, category: Category) -> Vec<String> {
    table
        .category(category)
        .map(|(_, replacement)| replacement.name().to_string())
        .collect()
}

#[test_case(None, "A" ; "first name")]
#[test_case(Some(""), "A" ; "empty previous")]
#[test_case(Some("A"), "B" ; "single step")]
#[test_case(Some("Z"), "AA" ; "grows after last symbol")]
#[test_case(Some("AZ"), "BA" ; "carries into second position")]
#[test_case(Some("BZ"), "CA" ; "carries from later symbol")]
#[test_case(Some("AAZ"), "ABA" ; "carries into middle")]
#[test_case(Some("AZZ"), "BAA" ; "carries twice")]
#[test_case(Some("ZZ"), "AAA" ; "grows after full overflow")]
#[test_case(Some("a"), "A" ; "foreign symbol restarts")]
fn sequential_type_names(previous: Option<&str>, expected: &str) {
    assert_eq!(SequentialNameGenerator::types().generate(previous), expected);
}

#[test]
fn member_names_run_through_digits() {
    let members = SequentialNameGenerator::members();
    assert_eq!(members.generate(None), "a");
    assert_eq!(members.generate(Some("z")), "0");
    assert_eq!(members.generate(Some("9")), "aa");
    assert_eq!(members.generate(Some("a9")), "ba");
}

#[test]
fn sequential_names_never_repeat() {
    let generator = SequentialNameGenerator::new("xy").unwrap();
    let mut previous: Option<String> = None;
    let mut seen = HashSet::new();
    for _ in 0..200 {
        let next = generator.generate(previous.as_deref());
        assert!(seen.insert(next.clone()), "{next} generated twice");
        previous = Some(next);
    }
    assert_eq!(generator.generate(Some("yy")), "xxx");
}

#[test_case("" ; "empty")]
#[test_case("abca" ; "duplicates")]
#[test_case("ab c" ; "whitespace")]
#[test_case("ab/" ; "package separator")]
#[test_case("a;b" ; "descriptor terminator")]
#[test_case("<ab>" ; "angle brackets")]
#[test_case("ab#" ; "owner separator")]
#[test_case("a:b" ; "descriptor separator")]
#[test_case("*ab" ; "wildcard")]
fn invalid_alphabets_are_rejected(alphabet: &str) {
    assert!(matches!(
        SequentialNameGenerator::new(alphabet),
        Err(GenerateError::InvalidAlphabet { .. })
    ));
}

#[test]
fn unicode_alphabet_is_usable_in_names() {
    let generator = SequentialNameGenerator::unicode();
    assert_eq!(generator.alphabet().len(), 4096);
    assert_eq!(generator.generate(None), "\u{4E00}");
    assert!(generator
        .alphabet()
        .iter()
        .all(|ch| ch.is_alphabetic() && !ch.is_whitespace()));
    let distinct: HashSet<_> = generator.alphabet().iter().collect();
    assert_eq!(distinct.len(), 4096);
}

#[test]
fn random_names_follow_case_conventions() {
    let types = RandomNameGenerator::types();
    let members = RandomNameGenerator::members();
    for _ in 0..128 {
        let name = types.generate(None);
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()), "{name}");

        let name = members.generate(Some("previous"));
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()), "{name}");
    }
}

#[test]
fn cursors_track_each_category_separately() {
    let generators = NameGenerators::sequential();
    let mut cursors = NameCursors::new();
    assert_eq!(cursors.advance(Category::Type, &generators), "A");
    assert_eq!(cursors.advance(Category::Type, &generators), "B");
    assert_eq!(cursors.advance(Category::Field, &generators), "a");
    assert_eq!(cursors.last(Category::Type), Some("B"));
    assert_eq!(cursors.last(Category::Method), None);

    cursors.reset();
    assert_eq!(cursors.last(Category::Type), None);
}

#[test]
fn category_generators_can_be_reassigned() {
    let generators = NameGenerators::sequential()
        .with(Category::Method, Arc::new(SequentialNameGenerator::types()));
    assert_eq!(generators.for_category(Category::Method).generate(None), "A");
    assert_eq!(generators.for_category(Category::Field).generate(None), "a");
}

#[test]
fn generated_names_use_their_category_alphabet() {
    let class = structure(
        ClassFileBuilder::new("com/example/Sample")
            .field(ACC_PUBLIC, "first", "I")
            .field(ACC_PUBLIC, "second", "J")
            .method(ACC_PUBLIC, "run", "()V")
            .method(ACC_PUBLIC, "stop", "()V")
            .invoke_dynamic("apply", "()Ljava/util/function/Function;"),
    );
    let table = MapGenerator::default().generate([&class], None).unwrap();

    let type_alphabet: HashSet<char> = TYPE_ALPHABET.chars().collect();
    let member_alphabet: HashSet<char> = MEMBER_ALPHABET.chars().collect();
    for name in replacements(&table, Category::Type) {
        assert!(name.chars().all(|ch| type_alphabet.contains(&ch)), "type {name}");
    }
    for category in [Category::Field, Category::Method, Category::DynamicCall] {
        let names = replacements(&table, category);
        assert!(!names.is_empty());
        for name in names {
            assert!(name.chars().all(|ch| member_alphabet.contains(&ch)), "{category} {name}");
        }
    }
}

#[test]
fn package_names_are_kept_on_request() {
    let class = structure(ClassFileBuilder::new("com/example/Sample"));
    let config = GeneratorConfig {
        remove_package_names: false,
        ..GeneratorConfig::default()
    };

    let table = MapGenerator::new(config).generate([&class], None).unwrap();
    assert_eq!(table.map_type_name("com/example/Sample"), "com/example/A");

    let table = MapGenerator::default().generate([&class], None).unwrap();
    assert_eq!(table.map_type_name("com/example/Sample"), "A");
}

#[test]
fn initializers_keep_their_names() {
    let class = structure(
        ClassFileBuilder::new("Sample")
            .method(ACC_PUBLIC, "<init>", "()V")
            .method(ACC_PUBLIC, "<clinit>", "()V")
            .method(ACC_PUBLIC, "run", "()V"),
    );
    let table = MapGenerator::default().generate([&class], None).unwrap();
    assert_eq!(table.category_len(Category::Method), 1);
    assert_eq!(table.map_method_name("Sample", "<init>", "()V"), "<init>");
    assert_eq!(table.map_method_name("Sample", "run", "()V"), "a");
}

#[test]
fn existing_mappings_are_left_alone() {
    let class = structure(
        ClassFileBuilder::new("Sample")
            .field(ACC_PUBLIC, "count", "I")
            .method(ACC_PUBLIC, "run", "()V"),
    );
    let mut seeded = MappingTable::new();
    seeded
        .add(Symbol::type_name("Sample"), Symbol::type_name("Kept"))
        .unwrap();
    seeded
        .add(Symbol::field("Sample", "count", "I"), Symbol::field("Sample", "a", "I"))
        .unwrap();

    let generator = MapGenerator::default();
    let mut session = generator.session(None).with_table(seeded);
    session.visit_class(&class).unwrap();
    session.visit_class(&class).unwrap();

    let table = session.finish();
    assert_eq!(table.len(), 3);
    assert_eq!(table.map_type_name("Sample"), "Kept");
    assert_eq!(table.map_field_name("Sample", "count", "I"), "a");
    assert_eq!(table.map_method_name("Sample", "run", "()V"), "a");
}

#[test]
fn seeded_replacements_are_not_reused() {
    let class = structure(ClassFileBuilder::new("Sample").field(ACC_PUBLIC, "count", "I"));
    let mut seeded = MappingTable::new();
    seeded
        .add(Symbol::type_name("Other"), Symbol::type_name("A"))
        .unwrap();
    seeded
        .add(Symbol::field("Sample", "first", "I"), Symbol::field("Sample", "a", "I"))
        .unwrap();

    let generator = MapGenerator::default();
    let mut session = generator.session(None).with_table(seeded);
    session.visit_class(&class).unwrap();

    assert_eq!(session.table().map_type_name("Sample"), "B");
    assert_eq!(session.table().map_field_name("Sample", "count", "I"), "b");
    assert_eq!(session.cursors().last(Category::Field), Some("b"));
}

#[test]
fn fields_without_descriptor_overloading_collide_on_name() {
    let class = structure(ClassFileBuilder::new("Sample").field(ACC_PUBLIC, "count", "I"));
    let mut seeded = MappingTable::new();
    seeded
        .add(Symbol::field("Sample", "other", "J"), Symbol::field("Sample", "a", "J"))
        .unwrap();

    let config = GeneratorConfig {
        field_descriptor_overloading: false,
        ..GeneratorConfig::default()
    };
    let generator = MapGenerator::new(config);
    let mut session = generator.session(None).with_table(seeded.clone());
    session.visit_class(&class).unwrap();
    assert_eq!(session.table().map_field_name("Sample", "count", "I"), "b");

    // with overloading the different descriptor makes `a` available again
    let generator = MapGenerator::default();
    let mut session = generator.session(None).with_table(seeded);
    session.visit_class(&class).unwrap();
    assert_eq!(session.table().map_field_name("Sample", "count", "I"), "a");
}

#[test]
fn methods_without_return_type_overloading_collide_on_parameters() {
    let class = structure(ClassFileBuilder::new("Sample").method(ACC_PUBLIC, "size", "()I"));
    let mut seeded = MappingTable::new();
    seeded
        .add(Symbol::method("Sample", "length", "()J"), Symbol::method("Sample", "a", "()J"))
        .unwrap();

    let config = GeneratorConfig {
        method_return_type_overloading: false,
        ..GeneratorConfig::default()
    };
    let generator = MapGenerator::new(config);
    let mut session = generator.session(None).with_table(seeded.clone());
    session.visit_class(&class).unwrap();
    // a seeded replacement with a full descriptor differs from the truncated key
    assert_eq!(session.table().map_method_name("Sample", "size", "()I"), "a");
    let stored = session
        .table()
        .lookup(&Symbol::method("Sample", "size", "()I"))
        .unwrap();
    assert_eq!(stored.descriptor(), Some("()"));

    let mut truncated = MappingTable::new();
    truncated
        .add(Symbol::method("Sample", "length", "()J"), Symbol::method("Sample", "a", "()"))
        .unwrap();
    let mut session = generator.session(None).with_table(truncated);
    session.visit_class(&class).unwrap();
    assert_eq!(session.table().map_method_name("Sample", "size", "()I"), "b");
}

#[test]
fn dynamic_calls_are_keyed_without_owner() {
    let first = structure(
        ClassFileBuilder::new("First").invoke_dynamic("run", "()Ljava/lang/Runnable;"),
    );
    let second = structure(
        ClassFileBuilder::new("Second")
            .invoke_dynamic("run", "()Ljava/lang/Runnable;")
            .invoke_dynamic("apply", "()Ljava/util/function/Function;"),
    );
    let table = MapGenerator::default()
        .generate([&first, &second], None)
        .unwrap();

    assert_eq!(table.category_len(Category::DynamicCall), 2);
    assert_eq!(table.map_dynamic_call_name("run", "()Ljava/lang/Runnable;"), "a");
    assert_eq!(
        table.map_dynamic_call_name("apply", "()Ljava/util/function/Function;"),
        "b"
    );
}

#[test]
fn replacements_are_unique_per_category() {
    let first = structure(
        ClassFileBuilder::new("com/example/First")
            .field(ACC_PUBLIC, "value", "I")
            .field(ACC_PUBLIC, "value", "J")
            .method(ACC_PUBLIC, "get", "()I")
            .method(ACC_PUBLIC, "get", "()J")
            .method(ACC_PUBLIC | ACC_FINAL, "get", "(I)I"),
    );
    let second = structure(
        ClassFileBuilder::new("org/example/First")
            .field(ACC_PUBLIC, "value", "I")
            .method(ACC_PUBLIC, "get", "()I"),
    );
    let config = GeneratorConfig {
        field_descriptor_overloading: false,
        method_return_type_overloading: false,
        ..GeneratorConfig::default()
    };
    let table = MapGenerator::new(config)
        .generate([&first, &second], None)
        .unwrap();

    for category in Category::ALL {
        let names = replacements(&table, category);
        let distinct: HashSet<_> = names.iter().collect();
        assert_eq!(distinct.len(), names.len(), "{category}: {names:?}");
    }
    assert_eq!(table.category_len(Category::Type), 2);
    assert_eq!(table.category_len(Category::Field), 3);
    assert_eq!(table.category_len(Category::Method), 4);
}

#[test]
fn sessions_without_analyzer_rename_every_method() {
    let class = structure(
        ClassFileBuilder::new("Sample")
            .interface("java/lang/Runnable")
            .method(ACC_PUBLIC, "run", "()V")
            .method(ACC_PUBLIC, "equals", "(Ljava/lang/Object;)Z"),
    );
    let generator = MapGenerator::default();
    let mut session: Session<'_> = generator.session(None);
    session.visit_class(&class).unwrap();
    assert_eq!(session.table().category_len(Category::Method), 2);
}

#[test]
fn generator_config_defaults() {
    let config = GeneratorConfig::default();
    assert!(config.remove_package_names);
    assert!(config.field_descriptor_overloading);
    assert!(config.method_return_type_overloading);
    assert_eq!(config.name_generator, NameGeneratorKind::Sequential);
    assert_eq!(
        NameGeneratorKind::Unicode
            .generators()
            .for_category(Category::Field)
            .generate(None),
        "\u{4E00}"
    );
    assert_eq!(
        NameGeneratorKind::Unicode
            .generators()
            .for_category(Category::Type)
            .generate(None),
        "A"
    );
}
