use std::sync::Arc;

use engine::error::{EngineError, RenderError};
use engine::{Context, Engine, InMemoryLoader};
use quill::parser::Parser;

fn engine(templates: &[(&str, &str)]) -> Engine {
    let loader = InMemoryLoader::new();
    for (name, source) in templates {
        loader.add(*name, *source);
    }
    Engine::new(loader)
}

fn render(engine: &Engine, name: &str) -> String {
    engine
        .render(name, Vec::<(String, String)>::new())
        .expect("render failed")
}

const BASE: &str = "<title>{% block title %}A{% endblock %}</title>";

#[test]
fn child_overrides_parent_block() {
    let engine = engine(&[
        ("base.html", BASE),
        ("child.html", "{% extends \"base.html\" %}{% block title %}B{% endblock %}"),
    ]);
    assert_eq!(render(&engine, "child.html"), "<title>B</title>");
    assert_eq!(render(&engine, "base.html"), "<title>A</title>");
}

#[test]
fn parent_renders_the_next_ancestor_only() {
    let engine = engine(&[
        ("base.html", BASE),
        (
            "child.html",
            "{% extends \"base.html\" %}{% block title %}{{ parent() }}B{% endblock %}",
        ),
        (
            "grandchild.html",
            "{% extends \"child.html\" %}{% block title %}{{ parent() }}C{% endblock %}",
        ),
    ]);
    assert_eq!(render(&engine, "child.html"), "<title>AB</title>");
    assert_eq!(render(&engine, "grandchild.html"), "<title>ABC</title>");
}

#[test]
fn parent_skips_ancestors_without_the_block() {
    let engine = engine(&[
        ("base.html", BASE),
        ("middle.html", "{% extends \"base.html\" %}"),
        (
            "leaf.html",
            "{% extends \"middle.html\" %}{% block title %}{{ parent() }}!{% endblock %}",
        ),
    ]);
    assert_eq!(render(&engine, "leaf.html"), "<title>A!</title>");
}

#[test]
fn parent_without_ancestor_block_fails() {
    let engine = engine(&[("solo.html", "{% block t %}{{ parent() }}x{% endblock %}")]);
    let error = engine
        .render("solo.html", Vec::<(String, String)>::new())
        .unwrap_err();
    assert!(
        matches!(error, EngineError::Render(RenderError::NoParentBlock(ref name)) if name == "t"),
        "{:?}",
        error
    );
}

#[test]
fn child_content_outside_blocks_is_ignored() {
    let engine = engine(&[
        ("base.html", BASE),
        (
            "child.html",
            "{% extends \"base.html\" %}ignored{% block title %}B{% endblock %}also ignored",
        ),
    ]);
    assert_eq!(render(&engine, "child.html"), "<title>B</title>");
}

#[test]
fn nested_blocks_can_be_overridden_separately() {
    let engine = engine(&[
        (
            "base.html",
            "{% block outer %}[{% block inner %}i{% endblock %}]{% endblock %}",
        ),
        ("child.html", "{% extends \"base.html\" %}{% block inner %}I{% endblock %}"),
    ]);
    assert_eq!(render(&engine, "child.html"), "[I]");
}

#[test]
fn blocks_only_in_child_are_not_rendered() {
    let engine = engine(&[
        ("base.html", BASE),
        ("child.html", "{% extends \"base.html\" %}{% block extra %}X{% endblock %}"),
    ]);
    assert_eq!(render(&engine, "child.html"), "<title>A</title>");
}

#[test]
fn render_pushes_most_derived_first() {
    let engine = engine(&[
        ("base.html", BASE),
        ("child.html", "{% extends \"base.html\" %}"),
        ("leaf.html", "{% extends \"child.html\" %}"),
    ]);
    let leaf = engine.get_template("leaf.html").expect("leaf failed");
    let mut context = Context::new();
    let output = leaf.render_to_string(&mut context).expect("render failed");
    assert_eq!(output, "<title>A</title>");

    let chain: Vec<&str> = context
        .inheritance_chain()
        .iter()
        .map(|t| t.name())
        .collect();
    assert_eq!(chain, ["Template_leaf_2e_html", "Template_child_2e_html"]);
}

#[test]
fn templates_link_their_parent_instances() {
    let engine = engine(&[
        ("base.html", BASE),
        ("child.html", "{% extends \"base.html\" %}"),
    ]);
    let child = engine.get_template("child.html").expect("child failed");
    let base = engine.get_template("base.html").expect("base failed");
    let parent = child.parent().expect("child has no parent");
    assert!(Arc::ptr_eq(parent, &base));
    assert!(base.parent().is_none());
}

#[test]
fn inheritance_cycle_is_rejected() {
    let engine = engine(&[
        ("a.html", "{% extends \"b.html\" %}"),
        ("b.html", "{% extends \"c.html\" %}"),
        ("c.html", "{% extends \"a.html\" %}"),
    ]);
    match engine.get_template("a.html") {
        Err(EngineError::Cycle(cycle)) => {
            assert_eq!(cycle.chain, ["a.html", "b.html", "c.html", "a.html"]);
            assert_eq!(
                cycle.to_string(),
                "template inheritance cycle: a.html -> b.html -> c.html -> a.html"
            );
        }
        other => panic!("expected a cycle error, got {:?}", other),
    }
}

#[test]
fn template_extending_itself_is_a_cycle() {
    let engine = engine(&[("self.html", "{% extends \"self.html\" %}")]);
    assert!(matches!(
        engine.get_template("self.html"),
        Err(EngineError::Cycle(_))
    ));
}

#[test]
fn linking_rejects_a_parent_chain_containing_the_template() {
    let engine = engine(&[("base.html", BASE)]);
    let base = engine.get_template("base.html").expect("base failed");

    // A second template that compiles to the same unit and claims `base` as parent
    let root = Parser::new(
        "base.html",
        "{% extends \"other.html\" %}".to_string(),
        0,
    )
    .parse()
    .expect("parse failed");
    match engine.compile(&root, Some(base)) {
        Err(EngineError::Cycle(cycle)) => {
            assert_eq!(cycle.chain, ["Template_base_2e_html", "Template_base_2e_html"]);
        }
        other => panic!("expected a cycle error, got {:?}", other),
    }
}

#[test]
fn compile_requires_the_declared_parent() {
    let engine = engine(&[]);
    let root = Parser::new(
        "child.html",
        "{% extends \"base.html\" %}".to_string(),
        0,
    )
    .parse()
    .expect("parse failed");
    assert!(matches!(
        engine.compile(&root, None),
        Err(EngineError::UnlinkedParent { ref parent, .. }) if parent == "base.html"
    ));
}

#[test]
fn missing_parent_template() {
    let engine = engine(&[("child.html", "{% extends \"nowhere.html\" %}")]);
    assert!(matches!(
        engine.get_template("child.html"),
        Err(EngineError::Source { ref name, .. }) if name == "nowhere.html"
    ));
}

#[test]
fn undefined_block_reference() {
    // Parsed templates always declare the blocks they reference
    let engine = engine(&[]);
    let unit = "unit Template_x extends Template {\n\
                \x20   constructor(source, engine, parent) {\n\
                \x20       super(source, engine, parent);\n\
                \x20   }\n\
                \x20   build_content(writer, context) {\n\
                \x20       render_block \"nope\";\n\
                \x20   }\n\
                }\n";
    let template = engine
        .loader()
        .instantiate(&engine, unit, "Template_x", None)
        .expect("instantiate failed");
    let error = template.render_to_string(&mut Context::new()).unwrap_err();
    assert!(matches!(error, RenderError::UndefinedBlock(ref name) if name == "nope"));
}

#[test]
fn filenames_differing_only_in_punctuation_are_not_a_cycle() {
    let engine = engine(&[
        ("page_1.html", "[{% block t %}base{% endblock %}]"),
        ("page-1.html", "{% extends \"page_1.html\" %}{% block t %}child{% endblock %}"),
    ]);
    assert_eq!(render(&engine, "page-1.html"), "[child]");
    assert_eq!(render(&engine, "page_1.html"), "[base]");
    assert_eq!(engine.loader().compilations(), 2);
}
