pub mod expression;
pub mod node;
pub mod parser;

use indexmap::IndexMap;

use crate::node::BodyNode;
use crate::node::block::BlockNode;
use crate::node::macros::MacroNode;

/// A parsed template: the unit of compilation.
#[derive(Debug, Clone)]
pub struct RootNode {
    /// Template identity, used to derive the executable unit's name.
    pub filename: String,
    /// Set iff the template `{% extends %}` another one.
    pub parent_filename: Option<String>,
    /// Top-level content. Only rendered when there is no parent.
    pub body: BodyNode,
    /// Blocks in declaration order.
    pub blocks: IndexMap<String, BlockNode>,
    /// Macro overloads by name, each list in declaration order.
    pub macros: IndexMap<String, Vec<MacroNode>>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl RootNode {
    pub fn has_parent(&self) -> bool {
        self.parent_filename.is_some()
    }
}
