use engine::RuntimeValue::{self, Boolean, Double, Float, Int, Long, None as Nil};
use engine::arithmetic::{add, divide, modulo, multiply, subtract, unary_minus, unary_plus};
use engine::error::ArithmeticError;

fn string(s: &str) -> RuntimeValue {
    RuntimeValue::String(s.to_string())
}

#[test]
fn integer_addition_stays_integer() {
    assert_eq!(add(&Int(1), &Int(2)), Ok(Int(3)));
}

#[test]
fn widening_picks_the_wider_operand() {
    assert_eq!(add(&Int(1), &Double(2.0)), Ok(Double(3.0)));
    assert_eq!(add(&Long(1), &Int(2)), Ok(Long(3)));
    assert_eq!(add(&Int(1), &Float(0.5)), Ok(Float(1.5)));
    assert_eq!(add(&Long(2), &Float(0.5)), Ok(Float(2.5)));
    assert_eq!(multiply(&Float(2.0), &Double(0.25)), Ok(Double(0.5)));
    assert_eq!(subtract(&Long(10), &Int(3)), Ok(Long(7)));
}

#[test]
fn string_concatenation_bypasses_arithmetic() {
    assert_eq!(add(&string("a"), &Int(1)), Ok(string("a1")));
    assert_eq!(add(&Double(1.5), &string("x")), Ok(string("1.5x")));
    assert_eq!(add(&string("is "), &Boolean(true)), Ok(string("is true")));
    assert_eq!(add(&string("n"), &Nil), Ok(string("n")));
}

#[test]
fn integer_division_truncates_toward_zero() {
    assert_eq!(divide(&Int(7), &Int(2)), Ok(Int(3)));
    assert_eq!(divide(&Int(-7), &Int(2)), Ok(Int(-3)));
    assert_eq!(modulo(&Int(-7), &Int(2)), Ok(Int(-1)));
    assert_eq!(divide(&Long(9), &Long(4)), Ok(Long(2)));
}

#[test]
fn floating_division() {
    assert_eq!(divide(&Double(7.0), &Int(2)), Ok(Double(3.5)));
    assert_eq!(modulo(&Double(7.5), &Int(2)), Ok(Double(1.5)));
}

#[test]
fn unary_operators_keep_integer_width() {
    assert_eq!(unary_minus(&Int(5)), Ok(Int(-5)));
    assert_eq!(unary_plus(&Int(5)), Ok(Int(5)));
    assert_eq!(unary_minus(&Long(5)), Ok(Long(-5)));
    assert_eq!(unary_minus(&Float(1.5)), Ok(Float(-1.5)));
}

#[test]
fn non_numeric_operands_are_rejected() {
    assert_eq!(
        subtract(&string("a"), &Int(1)),
        Err(ArithmeticError::InvalidOperands {
            operator: "-",
            left: "string",
            right: "int",
        })
    );
    assert_eq!(
        add(&Boolean(true), &Int(1)),
        Err(ArithmeticError::InvalidOperands {
            operator: "+",
            left: "boolean",
            right: "int",
        })
    );
}

#[test]
fn unary_errors_name_the_unary_operator() {
    assert_eq!(
        unary_minus(&Boolean(true)),
        Err(ArithmeticError::InvalidOperand {
            operator: "-",
            operand: "boolean",
        })
    );
    let message = unary_plus(&string("x")).unwrap_err().to_string();
    assert!(message.contains("[+]"), "{}", message);
}

#[test]
fn integer_division_by_zero() {
    assert_eq!(divide(&Int(1), &Int(0)), Err(ArithmeticError::DivisionByZero("int")));
    assert_eq!(modulo(&Long(1), &Int(0)), Err(ArithmeticError::DivisionByZero("long")));
    assert_eq!(divide(&Double(1.0), &Int(0)), Ok(Double(f64::INFINITY)));
}

#[test]
fn integer_overflow_wraps() {
    assert_eq!(add(&Int(i32::MAX), &Int(1)), Ok(Int(i32::MIN)));
    assert_eq!(multiply(&Long(i64::MAX), &Int(2)), Ok(Long(-2)));
}

#[test]
fn text_representation() {
    assert_eq!(Double(3.0).to_string(), "3.0");
    assert_eq!(Float(2.5).to_string(), "2.5");
    assert_eq!(Long(-4).to_string(), "-4");
    assert_eq!(Boolean(false).to_string(), "false");
    assert_eq!(Nil.to_string(), "");
}
