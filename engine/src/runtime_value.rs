use std::fmt;

/// A runtime value produced by evaluating an expression.
///
/// Arithmetic and coercion dispatch on the variant alone; see
/// [`crate::arithmetic`] for the widening rules between the numeric tags.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Boolean(bool),
    None,
}

impl RuntimeValue {
    pub fn is_string(&self) -> bool {
        matches!(self, RuntimeValue::String(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Int(_) => "int",
            RuntimeValue::Long(_) => "long",
            RuntimeValue::Float(_) => "float",
            RuntimeValue::Double(_) => "double",
            RuntimeValue::String(_) => "string",
            RuntimeValue::Boolean(_) => "boolean",
            RuntimeValue::None => "none",
        }
    }
}

/// Floating values keep a fractional part so `3.0` never reads as an int.
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value == value.trunc() && value.abs() < 1e16 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Int(n) => write!(f, "{}", n),
            RuntimeValue::Long(n) => write!(f, "{}", n),
            RuntimeValue::Float(x) => {
                if x.is_finite() && *x == x.trunc() && x.abs() < 1e7 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            RuntimeValue::Double(x) => write_float(f, *x),
            RuntimeValue::String(s) => write!(f, "{}", s),
            RuntimeValue::Boolean(b) => write!(f, "{}", b),
            RuntimeValue::None => Ok(()),
        }
    }
}

impl From<i32> for RuntimeValue {
    fn from(n: i32) -> Self {
        RuntimeValue::Int(n)
    }
}

impl From<i64> for RuntimeValue {
    fn from(n: i64) -> Self {
        RuntimeValue::Long(n)
    }
}

impl From<f32> for RuntimeValue {
    fn from(x: f32) -> Self {
        RuntimeValue::Float(x)
    }
}

impl From<f64> for RuntimeValue {
    fn from(x: f64) -> Self {
        RuntimeValue::Double(x)
    }
}

impl From<bool> for RuntimeValue {
    fn from(b: bool) -> Self {
        RuntimeValue::Boolean(b)
    }
}

impl From<&str> for RuntimeValue {
    fn from(s: &str) -> Self {
        RuntimeValue::String(s.to_string())
    }
}

impl From<String> for RuntimeValue {
    fn from(s: String) -> Self {
        RuntimeValue::String(s)
    }
}
