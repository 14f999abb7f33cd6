use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// +x
    Plus,
    /// -x
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Addition => "+",
            BinaryOperator::Subtraction => "-",
            BinaryOperator::Multiplication => "*",
            BinaryOperator::Division => "/",
            BinaryOperator::Modulo => "%",
        }
    }
}

/// A literal as written in template source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    /// `12L`
    Long(i64),
    /// `1.5f`
    Float(f32),
    Double(f64),
    String(String),
    Boolean(bool),
    None,
}

/// An expression AST node.
#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Variable(String, Range<usize>),
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `name(args...)`, dispatched on argument count at render time.
    MacroCall {
        name: String,
        arguments: Vec<Expression>,
        span: Range<usize>,
    },
}
