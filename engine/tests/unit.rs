use engine::error::CompilationError;
use engine::unit::{Instruction, compile_unit};
use engine::{Engine, InMemoryLoader, RuntimeValue};
use quill::parser::Parser;

fn search_path() -> Vec<String> {
    vec!["Template".to_string()]
}

const VALID: &str = r#"/* header comment */
unit Template_t extends Template {

    constructor(source, engine, parent) {
        super(source, engine, parent);
    }

    build_content(writer, context) {
        write_text "a\tb";
        push_int -3;
        push_double 1.5e3;
        add;
        print;
        render_block "title";
    }

    init_blocks() {
        block "title" {
            render_parent_block "title";
        }
    }

    init_macros() {
        macro "m" ("x", "y") {
            load "x";
            print;
        }
        macro "m" () {
        }
    }
}
"#;

fn diagnostics(text: &str, target: &str) -> Vec<(usize, String)> {
    match compile_unit(text, target, &search_path()) {
        Ok(_) => panic!("expected the unit to be rejected"),
        Err(diagnostics) => diagnostics
            .into_iter()
            .map(|d| (d.line, d.message))
            .collect(),
    }
}

#[test]
fn handwritten_unit_compiles() {
    let unit = compile_unit(VALID, "Template_t", &search_path()).expect("unit rejected");
    assert_eq!(unit.name, "Template_t");
    assert_eq!(unit.base, "Template");
    assert_eq!(
        unit.constructor.map(|c| c.parameters),
        Some(vec![
            "source".to_string(),
            "engine".to_string(),
            "parent".to_string()
        ])
    );
    assert_eq!(
        unit.content.instructions[..3],
        [
            Instruction::WriteText("a\tb".into()),
            Instruction::Push(RuntimeValue::Int(-3)),
            Instruction::Push(RuntimeValue::Double(1500.0)),
        ]
    );
    assert_eq!(unit.blocks.len(), 1);
    let arities: Vec<usize> = unit.macros["m"].iter().map(|m| m.arity()).collect();
    assert_eq!(arities, [2, 0]);
}

#[test]
fn emitted_units_compile() {
    let engine = Engine::new(InMemoryLoader::new());
    let source = "{% set n = 2 %}{% block b %}{{ n * 2.5f }}{% endblock %}\
                  {% macro m(a) %}{{ -a }}{% endmacro %}{{ m(1L) }}{{ 'q\"\\'' }}";
    let root = Parser::new("all.html", source.to_string(), 0)
        .parse()
        .expect("parse failed");
    let text = engine.emit_unit(&root);
    let unit = compile_unit(&text, "Template_all_2e_html", &search_path())
        .unwrap_or_else(|d| panic!("emitted unit rejected: {:?}\n{}", d, text));
    assert!(unit.blocks.contains_key("b"));
    assert_eq!(unit.macros["m"][0].parameters, ["a"]);
}

#[test]
fn unit_must_match_target_name() {
    let found = diagnostics(VALID, "Template_other");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, 2);
    assert!(found[0].1.contains("must be named after"));
}

#[test]
fn base_must_be_on_search_path() {
    let text = VALID.replace("extends Template", "extends Missing");
    let found = diagnostics(&text, "Template_t");
    assert!(found[0].1.contains("cannot find base type `Missing`"));
}

#[test]
fn every_problem_is_reported_with_its_line() {
    let text = "unit Template_t extends Template {\n\
                \x20   build_content(writer, context) {\n\
                \x20       frobnicate;\n\
                \x20       add;\n\
                \x20       push_int 1;\n\
                \x20   }\n\
                \x20   init_blocks() {\n\
                \x20       block \"a\" {\n\
                \x20           push_inheritance_chain;\n\
                \x20       }\n\
                \x20   }\n\
                }\n";
    let found = diagnostics(text, "Template_t");
    let lines: Vec<usize> = found.iter().map(|(line, _)| *line).collect();
    assert_eq!(lines, [3, 4, 5, 9], "{:?}", found);
    assert!(found[0].1.contains("unknown instruction `frobnicate`"));
    assert!(found[1].1.contains("underflow"));
    assert!(found[2].1.contains("left on the operand stack"));
    assert!(found[3].1.contains("only valid inside `build_content`"));
}

#[test]
fn parent_block_only_inside_blocks() {
    let text = VALID.replace(
        "render_block \"title\";",
        "render_parent_block \"title\";",
    );
    let found = diagnostics(&text, "Template_t");
    assert_eq!(found.len(), 1);
    assert!(found[0].1.contains("only valid inside a block"));
}

#[test]
fn duplicate_blocks_and_macro_arities() {
    let text = VALID
        .replace(
            "        block \"title\" {",
            "        block \"title\" {\n        }\n        block \"title\" {",
        )
        .replace("macro \"m\" () {", "macro \"m\" (\"a\", \"b\") {");
    let found = diagnostics(&text, "Template_t");
    let messages: Vec<&str> = found.iter().map(|(_, m)| m.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("duplicate block `title`")));
    assert!(messages.iter().any(|m| m.contains("duplicate macro `m` taking 2")));
}

#[test]
fn missing_content_builder() {
    let text = "unit Template_t extends Template {\n}\n";
    let found = diagnostics(text, "Template_t");
    assert!(found[0].1.contains("build_content"));
}

#[test]
fn super_must_forward_constructor_parameters() {
    let text = VALID.replace("super(source, engine, parent);", "super(engine, source, parent);");
    let found = diagnostics(&text, "Template_t");
    assert!(found[0].1.contains("unchanged"));
}

#[test]
fn lexical_errors_do_not_stop_compilation() {
    let text = VALID
        .replace("write_text \"a\\tb\";", "write_text \"a\\qb\";")
        .replace("print;\n        render_block", "print @;\n        render_block");
    let found = diagnostics(&text, "Template_t");
    let messages: Vec<&str> = found.iter().map(|(_, m)| m.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("illegal escape")), "{:?}", messages);
    assert!(messages.iter().any(|m| m.contains("illegal character `@`")), "{:?}", messages);
}

#[test]
fn truncated_unit() {
    let found = diagnostics("unit Template_t extends Template {\n build_content(w, c) {\n", "Template_t");
    assert!(found.iter().any(|(_, m)| m.contains("end of unit")));
}

#[test]
fn compilation_error_lists_one_line_per_diagnostic() {
    let text = "unit Template_t extends Template {\n\
                \x20   build_content(writer, context) {\n\
                \x20       print;\n\
                \x20       bogus;\n\
                \x20   }\n\
                }\n";
    let error = CompilationError {
        target: "Template_t".into(),
        diagnostics: compile_unit(text, "Template_t", &search_path()).unwrap_err(),
    };
    let message = error.to_string();
    assert!(message.contains("Error on line 3: operand stack underflow"), "{}", message);
    assert!(message.contains("Error on line 4: unknown instruction `bogus`"), "{}", message);
}
