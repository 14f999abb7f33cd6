use std::ops::Range;

use crate::node::BodyNode;

/// One overload of a macro: `{% macro name(a, b) %}...{% endmacro %}`.
/// Overloads sharing a name are distinguished by arity.
#[derive(Debug, Clone)]
pub struct MacroNode {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: BodyNode,
    pub span: Range<usize>,
}

impl MacroNode {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}
