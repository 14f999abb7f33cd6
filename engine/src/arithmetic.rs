//! Loosely-typed arithmetic over [`RuntimeValue`]s.
//!
//! `+` concatenates as soon as either side is a string. Every other case
//! needs two numeric operands and is carried out at the width of the wider
//! one: double > float > long > int. Integer overflow wraps, integer
//! division truncates toward zero.

use quill::expression::BinaryOperator;

use crate::error::ArithmeticError;
use crate::runtime_value::RuntimeValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl Operation {
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Modulo => "%",
        }
    }

    /// Mnemonic used in executable unit text.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Modulo => "mod",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        match mnemonic {
            "add" => Some(Operation::Add),
            "subtract" => Some(Operation::Subtract),
            "multiply" => Some(Operation::Multiply),
            "divide" => Some(Operation::Divide),
            "mod" => Some(Operation::Modulo),
            _ => None,
        }
    }

    pub fn apply(
        self,
        left: &RuntimeValue,
        right: &RuntimeValue,
    ) -> Result<RuntimeValue, ArithmeticError> {
        match self {
            Operation::Add => add(left, right),
            _ => widening_operation(left, right, self),
        }
    }
}

impl From<BinaryOperator> for Operation {
    fn from(operator: BinaryOperator) -> Self {
        match operator {
            BinaryOperator::Addition => Operation::Add,
            BinaryOperator::Subtraction => Operation::Subtract,
            BinaryOperator::Multiplication => Operation::Multiply,
            BinaryOperator::Division => Operation::Divide,
            BinaryOperator::Modulo => Operation::Modulo,
        }
    }
}

pub fn add(left: &RuntimeValue, right: &RuntimeValue) -> Result<RuntimeValue, ArithmeticError> {
    if left.is_string() || right.is_string() {
        return Ok(RuntimeValue::String(format!("{}{}", left, right)));
    }
    widening_operation(left, right, Operation::Add)
}

pub fn subtract(left: &RuntimeValue, right: &RuntimeValue) -> Result<RuntimeValue, ArithmeticError> {
    widening_operation(left, right, Operation::Subtract)
}

pub fn multiply(left: &RuntimeValue, right: &RuntimeValue) -> Result<RuntimeValue, ArithmeticError> {
    widening_operation(left, right, Operation::Multiply)
}

pub fn divide(left: &RuntimeValue, right: &RuntimeValue) -> Result<RuntimeValue, ArithmeticError> {
    widening_operation(left, right, Operation::Divide)
}

pub fn modulo(left: &RuntimeValue, right: &RuntimeValue) -> Result<RuntimeValue, ArithmeticError> {
    widening_operation(left, right, Operation::Modulo)
}

/// `1 * x`: keeps the operand's width, so an int stays an int.
pub fn unary_plus(operand: &RuntimeValue) -> Result<RuntimeValue, ArithmeticError> {
    multiply(&RuntimeValue::Int(1), operand).map_err(|e| e.for_unary("+"))
}

/// `-1 * x`
pub fn unary_minus(operand: &RuntimeValue) -> Result<RuntimeValue, ArithmeticError> {
    multiply(&RuntimeValue::Int(-1), operand).map_err(|e| e.for_unary("-"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Width {
    Int,
    Long,
    Float,
    Double,
}

fn width(value: &RuntimeValue) -> Option<Width> {
    match value {
        RuntimeValue::Int(_) => Some(Width::Int),
        RuntimeValue::Long(_) => Some(Width::Long),
        RuntimeValue::Float(_) => Some(Width::Float),
        RuntimeValue::Double(_) => Some(Width::Double),
        _ => None,
    }
}

fn as_i32(value: &RuntimeValue) -> i32 {
    match value {
        RuntimeValue::Int(n) => *n,
        _ => 0,
    }
}

fn as_i64(value: &RuntimeValue) -> i64 {
    match value {
        RuntimeValue::Int(n) => i64::from(*n),
        RuntimeValue::Long(n) => *n,
        _ => 0,
    }
}

fn as_f32(value: &RuntimeValue) -> f32 {
    match value {
        RuntimeValue::Int(n) => *n as f32,
        RuntimeValue::Long(n) => *n as f32,
        RuntimeValue::Float(x) => *x,
        _ => 0.0,
    }
}

fn as_f64(value: &RuntimeValue) -> f64 {
    match value {
        RuntimeValue::Int(n) => f64::from(*n),
        RuntimeValue::Long(n) => *n as f64,
        RuntimeValue::Float(x) => f64::from(*x),
        RuntimeValue::Double(x) => *x,
        _ => 0.0,
    }
}

fn widening_operation(
    left: &RuntimeValue,
    right: &RuntimeValue,
    operation: Operation,
) -> Result<RuntimeValue, ArithmeticError> {
    let (Some(left_width), Some(right_width)) = (width(left), width(right)) else {
        return Err(ArithmeticError::InvalidOperands {
            operator: operation.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        });
    };

    match left_width.max(right_width) {
        Width::Double => Ok(RuntimeValue::Double(float_operation(
            as_f64(left),
            as_f64(right),
            operation,
        ))),
        Width::Float => Ok(RuntimeValue::Float(float_operation(
            as_f32(left),
            as_f32(right),
            operation,
        ))),
        Width::Long => {
            long_operation(as_i64(left), as_i64(right), operation).map(RuntimeValue::Long)
        }
        Width::Int => {
            int_operation(as_i32(left), as_i32(right), operation).map(RuntimeValue::Int)
        }
    }
}

fn float_operation<F>(a: F, b: F, operation: Operation) -> F
where
    F: std::ops::Add<Output = F>
        + std::ops::Sub<Output = F>
        + std::ops::Mul<Output = F>
        + std::ops::Div<Output = F>
        + std::ops::Rem<Output = F>,
{
    match operation {
        Operation::Add => a + b,
        Operation::Subtract => a - b,
        Operation::Multiply => a * b,
        Operation::Divide => a / b,
        Operation::Modulo => a % b,
    }
}

fn long_operation(a: i64, b: i64, operation: Operation) -> Result<i64, ArithmeticError> {
    match operation {
        Operation::Add => Ok(a.wrapping_add(b)),
        Operation::Subtract => Ok(a.wrapping_sub(b)),
        Operation::Multiply => Ok(a.wrapping_mul(b)),
        Operation::Divide if b == 0 => Err(ArithmeticError::DivisionByZero("long")),
        Operation::Divide => Ok(a.wrapping_div(b)),
        Operation::Modulo if b == 0 => Err(ArithmeticError::DivisionByZero("long")),
        Operation::Modulo => Ok(a.wrapping_rem(b)),
    }
}

fn int_operation(a: i32, b: i32, operation: Operation) -> Result<i32, ArithmeticError> {
    match operation {
        Operation::Add => Ok(a.wrapping_add(b)),
        Operation::Subtract => Ok(a.wrapping_sub(b)),
        Operation::Multiply => Ok(a.wrapping_mul(b)),
        Operation::Divide if b == 0 => Err(ArithmeticError::DivisionByZero("int")),
        Operation::Divide => Ok(a.wrapping_div(b)),
        Operation::Modulo if b == 0 => Err(ArithmeticError::DivisionByZero("int")),
        Operation::Modulo => Ok(a.wrapping_rem(b)),
    }
}
