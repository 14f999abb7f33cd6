use std::ops::Range;

use crate::node::BodyNode;

/// A named, overridable content fragment: `{% block name %}...{% endblock %}`.
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub name: String,
    pub body: BodyNode,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}
