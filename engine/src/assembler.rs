//! Unit assembly: the fixed section layout of one executable unit.

use chrono::Utc;
use quill::RootNode;

use crate::emitter::{Compile, Emitter};

impl Compile for RootNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        let unit_name = emitter.engine().template_unit_name(&self.filename);

        compile_meta_information(self, emitter);
        compile_unit_header(emitter, &unit_name);
        compile_constructor(emitter);
        compile_build_content(self, emitter);
        compile_blocks(self, emitter);
        compile_macros(self, emitter);
        compile_unit_footer(emitter);
    }
}

/// Informational only; the backend skips comments.
fn compile_meta_information(root: &RootNode, emitter: &mut Emitter<'_>) {
    let parent = root.parent_filename.as_deref().unwrap_or("none");
    let compiled_on = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string();

    emitter.write("/*").newline();
    emitter
        .write(" * Filename: ")
        .raw(&comment_safe(&root.filename))
        .newline();
    emitter
        .write(" * Parent filename: ")
        .raw(&comment_safe(parent))
        .newline();
    emitter.write(" * Compiled on: ").raw(&compiled_on).newline();
    emitter.write(" */").newline();
}

fn comment_safe(text: &str) -> String {
    text.replace("*/", "* /").replace('\n', " ")
}

fn compile_unit_header(emitter: &mut Emitter<'_>, unit_name: &str) {
    let base = emitter.engine().base_template().to_string();
    emitter
        .write("unit ")
        .raw(unit_name)
        .raw(" extends ")
        .raw(&base)
        .raw(" {")
        .newline()
        .indent();
}

fn compile_constructor(emitter: &mut Emitter<'_>) {
    emitter
        .newline()
        .write("constructor(source, engine, parent) {")
        .newline();
    emitter
        .indent()
        .write("super(source, engine, parent);")
        .newline();
    emitter.outdent().write("}").newline();
}

fn compile_build_content(root: &RootNode, emitter: &mut Emitter<'_>) {
    emitter
        .newline()
        .write("build_content(writer, context) {")
        .newline()
        .indent();
    if root.has_parent() {
        emitter.write("push_inheritance_chain;").newline();
        emitter.write("delegate_parent;").newline();
    } else {
        emitter.subcompile(&root.body, true);
    }
    emitter.outdent().write("}").newline();
}

fn compile_blocks(root: &RootNode, emitter: &mut Emitter<'_>) {
    emitter.newline().write("init_blocks() {").newline().indent();
    for block in root.blocks.values() {
        emitter.subcompile(block, true);
    }
    emitter.outdent().write("}").newline();
}

fn compile_macros(root: &RootNode, emitter: &mut Emitter<'_>) {
    emitter.newline().write("init_macros() {").newline().indent();
    for overloads in root.macros.values() {
        for overload in overloads {
            emitter.subcompile(overload, true);
        }
    }
    emitter.outdent().write("}").newline();
}

fn compile_unit_footer(emitter: &mut Emitter<'_>) {
    emitter.outdent().write("}").newline();
}
