use engine::emitter::Emitter;
use engine::unit::parse_string_literal;
use engine::{Engine, InMemoryLoader};
use quill::RootNode;
use quill::parser::Parser;

fn engine() -> Engine {
    Engine::new(InMemoryLoader::new())
}

fn parse(filename: &str, source: &str) -> RootNode {
    Parser::new(filename, source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn without_timestamp(unit: &str) -> String {
    unit.lines()
        .filter(|line| !line.contains("Compiled on:"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn write_prefixes_current_indentation() {
    let engine = engine();
    let mut emitter = Emitter::new(&engine);
    emitter.indent().indent().indent();
    emitter.write("x");
    assert_eq!(emitter.indentation(), 3);
    assert_eq!(emitter.source(), "            x");
}

#[test]
fn raw_ignores_indentation() {
    let engine = engine();
    let mut emitter = Emitter::new(&engine);
    emitter.indent().write("a").raw("b").newline().outdent().write("c");
    assert_eq!(emitter.source(), "    ab\nc");
}

#[test]
fn newlines_writes_count() {
    let engine = engine();
    let mut emitter = Emitter::new(&engine);
    emitter.newlines(3);
    assert_eq!(emitter.source(), "\n\n\n");
}

#[test]
#[should_panic(expected = "below zero")]
fn outdent_below_zero_panics() {
    let engine = engine();
    let mut emitter = Emitter::new(&engine);
    emitter.indent().outdent().outdent();
}

#[test]
fn literal_decodes_back_to_input() {
    let engine = engine();
    let original = "a\"b\\c\nd\te";
    let mut emitter = Emitter::new(&engine);
    emitter.literal(original);
    assert_eq!(emitter.source(), r#""a\"b\\c\nd\te""#);
    assert_eq!(parse_string_literal(emitter.source()).as_deref(), Some(original));
}

#[test]
fn literal_normalizes_line_breaks() {
    let engine = engine();
    let mut emitter = Emitter::new(&engine);
    emitter.literal("a\rb\u{000C}c'd");
    assert_eq!(parse_string_literal(emitter.source()).as_deref(), Some("a\nb\nc'd"));
}

#[test]
fn compiling_twice_differs_only_in_timestamp() {
    let engine = engine();
    let root = parse(
        "page.html",
        "{% block title %}T{% endblock %}{% macro m(a) %}{{ a }}{% endmacro %}{{ 1 + x }}",
    );
    let first = engine.emit_unit(&root);
    let second = engine.emit_unit(&root);
    assert_eq!(without_timestamp(&first), without_timestamp(&second));
    assert!(first.contains("Compiled on:"));
}

#[test]
fn unit_layout_for_child_template() {
    let engine = engine();
    let root = parse(
        "child.html",
        "{% extends \"base.html\" %}{% block title %}B{% endblock %}",
    );
    let unit = engine.emit_unit(&root);

    assert!(unit.starts_with("/*\n * Filename: child.html\n * Parent filename: base.html\n"));
    assert!(unit.contains("unit Template_child_2e_html extends Template {"));
    assert!(unit.contains("    constructor(source, engine, parent) {\n        super(source, engine, parent);\n    }"));
    assert!(unit.contains(
        "    build_content(writer, context) {\n        push_inheritance_chain;\n        delegate_parent;\n    }"
    ));
    assert!(unit.contains("        block \"title\" {\n            write_text \"B\";\n        }"));
    assert!(unit.trim_end().ends_with('}'));
}

#[test]
fn standalone_template_compiles_its_body() {
    let engine = engine();
    let root = parse("plain.html", "Hi {{ name }}!");
    let unit = engine.emit_unit(&root);
    assert!(unit.contains(" * Parent filename: none"));
    assert!(unit.contains("write_text \"Hi \";\n        load \"name\";\n        print;"));
    assert!(!unit.contains("delegate_parent"));
}

#[test]
fn expressions_compile_to_stack_code() {
    let engine = engine();
    let root = parse("expr.html", "{{ -(1 + 2L) * 3.5 }}{{ greet(\"x\", 2.5f) }}{% set y = none %}");
    let unit = engine.emit_unit(&root);
    let expected = [
        "push_int 1;",
        "push_long 2;",
        "add;",
        "unary_minus;",
        "push_double 3.5;",
        "multiply;",
        "print;",
        "push_string \"x\";",
        "push_float 2.5;",
        "call_macro \"greet\" 2;",
        "print;",
        "push_none;",
        "store \"y\";",
    ];
    let instructions: Vec<&str> = unit
        .lines()
        .map(str::trim)
        .filter(|line| expected.contains(line))
        .collect();
    assert_eq!(instructions, expected);
}

#[test]
fn macros_emit_every_overload_in_order() {
    let engine = engine();
    let root = parse(
        "m.html",
        "{% macro greet(name) %}a{% endmacro %}{% macro greet(g, name) %}b{% endmacro %}",
    );
    let unit = engine.emit_unit(&root);
    let one = unit.find("macro \"greet\" (\"name\") {").expect("one-argument overload");
    let two = unit
        .find("macro \"greet\" (\"g\", \"name\") {")
        .expect("two-argument overload");
    assert!(one < two);
}

#[test]
fn unit_name_escapes_filename() {
    let engine = engine();
    assert_eq!(
        engine.template_unit_name("pages/index.html"),
        "Template_pages_2f_index_2e_html"
    );
    assert_eq!(engine.template_unit_name("a-b c"), "Template_a_2d_b_20_c");
    assert_eq!(engine.template_unit_name("a_b"), "Template_a__b");
}

#[test]
fn similar_filenames_get_distinct_unit_names() {
    let engine = engine();
    let names = ["page-1.html", "page_1.html", "page.1.html", "page1.html", "page__1.html"]
        .map(|f| engine.template_unit_name(f));
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
