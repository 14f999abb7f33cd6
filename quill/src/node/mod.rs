pub mod block;
pub mod macros;

use std::ops::Range;

use crate::expression::Expression;

/// A sequence of content-producing nodes.
#[derive(Debug, Clone, Default)]
pub struct BodyNode {
    pub nodes: Vec<Node>,
}

impl BodyNode {
    pub fn new(nodes: Vec<Node>) -> Self {
        BodyNode { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A content-producing node inside a body.
#[derive(Debug, Clone)]
pub enum Node {
    /// Raw template text, written as-is.
    Text(TextNode),
    /// `{{ expr }}`
    Print(PrintNode),
    /// `{% set name = expr %}`
    Set(SetNode),
    /// Where a block was declared: renders the most-derived override.
    Block(BlockReferenceNode),
    /// `{{ parent() }}` inside a block.
    Parent(ParentNode),
}

impl Node {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Node::Text(node) => &node.span,
            Node::Print(node) => &node.span,
            Node::Set(node) => &node.span,
            Node::Block(node) => &node.span,
            Node::Parent(node) => &node.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextNode {
    pub text: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct PrintNode {
    pub expression: Expression,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct SetNode {
    pub name: String,
    pub value: Expression,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct BlockReferenceNode {
    pub name: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct ParentNode {
    /// Name of the enclosing block whose ancestor version is rendered.
    pub block: String,
    pub span: Range<usize>,
}
