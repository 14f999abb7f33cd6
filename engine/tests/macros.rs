use engine::error::{DispatchError, EngineError, RenderError};
use engine::{Engine, InMemoryLoader, Settings};

fn engine_with(settings: Settings, templates: &[(&str, &str)]) -> Engine {
    let loader = InMemoryLoader::new();
    for (name, source) in templates {
        loader.add(*name, *source);
    }
    Engine::with_settings(loader, settings)
}

fn engine(templates: &[(&str, &str)]) -> Engine {
    engine_with(Settings::default(), templates)
}

fn render(engine: &Engine, name: &str) -> Result<String, EngineError> {
    engine.render(name, Vec::<(String, String)>::new())
}

const GREET: &str = "{% macro greet(name) %}Hello {{ name }}{% endmacro %}\
                     {% macro greet(greeting, name) %}{{ greeting }}, {{ name }}{% endmacro %}";

#[test]
fn overload_chosen_by_argument_count() {
    let source = format!("{}{{{{ greet(\"Bob\") }}}}|{{{{ greet(\"Hi\", \"Ann\") }}}}", GREET);
    let engine = engine(&[("page.html", source.as_str())]);
    assert_eq!(render(&engine, "page.html").unwrap(), "Hello Bob|Hi, Ann");
}

#[test]
fn no_matching_overload_is_a_dispatch_error() {
    let source = format!("{}{{{{ greet(1, 2, 3) }}}}", GREET);
    let engine = engine(&[("page.html", source.as_str())]);
    match render(&engine, "page.html") {
        Err(EngineError::Render(RenderError::Dispatch(DispatchError::Arity {
            name,
            arguments,
            declared,
        }))) => {
            assert_eq!(name, "greet");
            assert_eq!(arguments, 3);
            assert_eq!(declared, [1, 2]);
        }
        other => panic!("expected a dispatch error, got {:?}", other),
    }
}

#[test]
fn undefined_macro() {
    let engine = engine(&[("page.html", "{{ nothing() }}")]);
    assert!(matches!(
        render(&engine, "page.html"),
        Err(EngineError::Render(RenderError::Dispatch(DispatchError::Undefined(ref name)))) if name == "nothing"
    ));
}

#[test]
fn macro_body_sees_only_its_parameters() {
    let engine = engine(&[(
        "page.html",
        "{% set x = 1 %}{% macro m(a) %}[{{ a }}{{ x }}]{% endmacro %}{{ m(2) }}",
    )]);
    assert_eq!(render(&engine, "page.html").unwrap(), "[2]");
}

#[test]
fn macro_scope_is_isolated_in_strict_mode() {
    let settings = Settings {
        strict_variables: true,
        ..Settings::default()
    };
    let engine = engine_with(
        settings,
        &[(
            "page.html",
            "{% set x = 1 %}{% macro m() %}{{ x }}{% endmacro %}{{ m() }}",
        )],
    );
    assert!(matches!(
        render(&engine, "page.html"),
        Err(EngineError::Render(RenderError::UndefinedVariable(ref name))) if name == "x"
    ));
}

#[test]
fn assignments_inside_macros_do_not_leak() {
    let engine = engine(&[(
        "page.html",
        "{% macro m() %}{% set y = 2 %}{{ y }}{% endmacro %}{{ m() }}<{{ y }}>",
    )]);
    assert_eq!(render(&engine, "page.html").unwrap(), "2<>");
}

#[test]
fn macro_output_is_a_string_value() {
    let engine = engine(&[(
        "page.html",
        "{% macro five() %}5{% endmacro %}{{ five() + 1 }}",
    )]);
    assert_eq!(render(&engine, "page.html").unwrap(), "51");
}

#[test]
fn macros_can_call_macros() {
    let engine = engine(&[(
        "page.html",
        "{% macro inner(v) %}<{{ v }}>{% endmacro %}\
         {% macro outer(v) %}{{ inner(v * 2) }}{% endmacro %}{{ outer(21) }}",
    )]);
    assert_eq!(render(&engine, "page.html").unwrap(), "<42>");
}

#[test]
fn child_macro_overrides_parent_macro() {
    let engine = engine(&[
        (
            "base.html",
            "{% macro who() %}base{% endmacro %}{% block b %}{{ who() }}{% endblock %}",
        ),
        ("child.html", "{% extends \"base.html\" %}{% macro who() %}child{% endmacro %}"),
    ]);
    assert_eq!(render(&engine, "child.html").unwrap(), "child");
    assert_eq!(render(&engine, "base.html").unwrap(), "base");
}

#[test]
fn parent_macros_are_visible_from_child_blocks() {
    let engine = engine(&[
        (
            "base.html",
            "{% macro tag(v) %}<{{ v }}>{% endmacro %}{% block b %}{% endblock %}",
        ),
        (
            "child.html",
            "{% extends \"base.html\" %}{% block b %}{{ tag(\"x\") }}{% endblock %}",
        ),
    ]);
    assert_eq!(render(&engine, "child.html").unwrap(), "<x>");
}

#[test]
fn overloads_resolve_across_the_chain() {
    let engine = engine(&[
        (
            "base.html",
            "{% macro m(a, b) %}base{{ a }}{{ b }}{% endmacro %}{% block b %}{% endblock %}",
        ),
        (
            "child.html",
            "{% extends \"base.html\" %}{% macro m(a) %}child{{ a }}{% endmacro %}\
             {% block b %}{{ m(1) }} {{ m(1, 2) }}{% endblock %}",
        ),
    ]);
    assert_eq!(render(&engine, "child.html").unwrap(), "child1 base12");
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let settings = Settings {
        max_render_depth: 16,
        ..Settings::default()
    };
    let engine = engine_with(
        settings,
        &[("page.html", "{% macro r(n) %}{{ r(n + 1) }}{% endmacro %}{{ r(0) }}")],
    );
    assert!(matches!(
        render(&engine, "page.html"),
        Err(EngineError::Render(RenderError::RecursionLimit(16)))
    ));
}
