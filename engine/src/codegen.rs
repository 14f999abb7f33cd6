//! How each body and expression node serializes itself into unit instructions.

use quill::expression::{Expression, Literal, UnaryOperator};
use quill::node::block::BlockNode;
use quill::node::macros::MacroNode;
use quill::node::{
    BlockReferenceNode, BodyNode, Node, ParentNode, PrintNode, SetNode, TextNode,
};

use crate::arithmetic::Operation;
use crate::emitter::{Compile, Emitter};

impl Compile for BodyNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        for node in &self.nodes {
            emitter.subcompile(node, true);
        }
    }
}

impl Compile for Node {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        match self {
            Node::Text(node) => node.compile(emitter),
            Node::Print(node) => node.compile(emitter),
            Node::Set(node) => node.compile(emitter),
            Node::Block(node) => node.compile(emitter),
            Node::Parent(node) => node.compile(emitter),
        }
    }
}

impl Compile for TextNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        if self.text.is_empty() {
            return;
        }
        emitter.write("write_text ").literal(&self.text).raw(";").newline();
    }
}

impl Compile for PrintNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        emitter.subcompile(&self.expression, true);
        emitter.write("print;").newline();
    }
}

impl Compile for SetNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        emitter.subcompile(&self.value, true);
        emitter.write("store ").literal(&self.name).raw(";").newline();
    }
}

impl Compile for BlockReferenceNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        emitter.write("render_block ").literal(&self.name).raw(";").newline();
    }
}

impl Compile for ParentNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        emitter
            .write("render_parent_block ")
            .literal(&self.block)
            .raw(";")
            .newline();
    }
}

/// Registration of the block's rendering routine, inside `init_blocks`.
impl Compile for BlockNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        emitter
            .write("block ")
            .literal(&self.name)
            .raw(" {")
            .newline()
            .indent();
        emitter.subcompile(&self.body, true);
        emitter.outdent().write("}").newline();
    }
}

/// Registration of one (name, arity) overload, inside `init_macros`.
impl Compile for MacroNode {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        emitter.write("macro ").literal(&self.name).raw(" (");
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                emitter.raw(", ");
            }
            emitter.literal(parameter);
        }
        emitter.raw(") {").newline().indent();
        emitter.subcompile(&self.body, true);
        emitter.outdent().write("}").newline();
    }
}

/// Expressions compile to stack instructions leaving one value behind.
impl Compile for Expression {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        match self {
            Expression::Literal(literal) => literal.compile(emitter),
            Expression::Variable(name, _) => {
                emitter.write("load ").literal(name).raw(";").newline();
            }
            Expression::Unary { operator, operand } => {
                emitter.subcompile(operand.as_ref(), true);
                let mnemonic = match operator {
                    UnaryOperator::Plus => "unary_plus;",
                    UnaryOperator::Minus => "unary_minus;",
                };
                emitter.write(mnemonic).newline();
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => {
                emitter.subcompile(left.as_ref(), true);
                emitter.subcompile(right.as_ref(), true);
                emitter
                    .write(Operation::from(*operator).mnemonic())
                    .raw(";")
                    .newline();
            }
            Expression::MacroCall {
                name, arguments, ..
            } => {
                for argument in arguments {
                    emitter.subcompile(argument, true);
                }
                emitter
                    .write("call_macro ")
                    .literal(name)
                    .raw(&format!(" {};", arguments.len()))
                    .newline();
            }
        }
    }
}

impl Compile for Literal {
    fn compile(&self, emitter: &mut Emitter<'_>) {
        match self {
            Literal::Int(n) => emitter.write(&format!("push_int {};", n)),
            Literal::Long(n) => emitter.write(&format!("push_long {};", n)),
            Literal::Float(x) => emitter.write(&format!("push_float {};", x)),
            Literal::Double(x) => emitter.write(&format!("push_double {};", x)),
            Literal::String(s) => emitter.write("push_string ").literal(s).raw(";"),
            Literal::Boolean(b) => emitter.write(&format!("push_bool {};", b)),
            Literal::None => emitter.write("push_none;"),
        };
        emitter.newline();
    }
}
