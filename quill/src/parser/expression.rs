use crate::expression::{BinaryOperator, Expression, Literal, UnaryOperator};
use crate::parser::TokenStream;
use crate::parser::error::ParseError;
use crate::parser::lexer::{self, TokenKind};

/// Parse a standalone expression, e.g. a value passed on the command line.
pub fn parse_expression_str(source: &str, file_id: usize) -> Result<Expression, Vec<ParseError>> {
    let wrapped = format!("{{{{{}}}}}", source);
    let tokens = lexer::tokenize(&wrapped, file_id)?;
    let mut stream = TokenStream::new(tokens, file_id);
    standalone(&mut stream).map_err(|e| vec![e])
}

fn standalone(stream: &mut TokenStream) -> Result<Expression, ParseError> {
    stream.expect(&TokenKind::PrintOpen)?;
    let expr = parse_expression(stream)?;
    stream.expect(&TokenKind::PrintClose)?;
    stream.expect(&TokenKind::Eof)?;
    Ok(expr)
}

/// expression := term (('+' | '-') term)*
pub(crate) fn parse_expression(stream: &mut TokenStream) -> Result<Expression, ParseError> {
    let mut left = parse_term(stream)?;
    loop {
        let operator = match stream.peek().kind {
            TokenKind::Plus => BinaryOperator::Addition,
            TokenKind::Minus => BinaryOperator::Subtraction,
            _ => return Ok(left),
        };
        stream.next();
        let right = parse_term(stream)?;
        left = Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
}

/// term := unary (('*' | '/' | '%') unary)*
fn parse_term(stream: &mut TokenStream) -> Result<Expression, ParseError> {
    let mut left = parse_unary(stream)?;
    loop {
        let operator = match stream.peek().kind {
            TokenKind::Star => BinaryOperator::Multiplication,
            TokenKind::Slash => BinaryOperator::Division,
            TokenKind::Percent => BinaryOperator::Modulo,
            _ => return Ok(left),
        };
        stream.next();
        let right = parse_unary(stream)?;
        left = Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expression, ParseError> {
    let operator = match stream.peek().kind {
        TokenKind::Plus => UnaryOperator::Plus,
        TokenKind::Minus => UnaryOperator::Minus,
        _ => return parse_primary(stream),
    };
    stream.next();
    let operand = parse_unary(stream)?;
    Ok(Expression::Unary {
        operator,
        operand: Box::new(operand),
    })
}

fn parse_primary(stream: &mut TokenStream) -> Result<Expression, ParseError> {
    let token = stream.next();
    let literal = match token.kind {
        TokenKind::Int(n) => Literal::Int(n),
        TokenKind::Long(n) => Literal::Long(n),
        TokenKind::Float(x) => Literal::Float(x),
        TokenKind::Double(x) => Literal::Double(x),
        TokenKind::String(s) => Literal::String(s),
        TokenKind::LeftParen => {
            let inner = parse_expression(stream)?;
            stream.expect(&TokenKind::RightParen)?;
            return Ok(inner);
        }
        TokenKind::Identifier(name) => match name.as_str() {
            "true" => Literal::Boolean(true),
            "false" => Literal::Boolean(false),
            "none" | "null" => Literal::None,
            _ if stream.at(&TokenKind::LeftParen) => {
                stream.next();
                let arguments = parse_arguments(stream)?;
                let end = stream.expect(&TokenKind::RightParen)?;
                return Ok(Expression::MacroCall {
                    name,
                    arguments,
                    span: token.span.start..end.span.end,
                });
            }
            _ => return Ok(Expression::Variable(name, token.span)),
        },
        other => {
            return Err(ParseError::unexpected(
                "an expression",
                other.describe(),
                token.span,
                stream.file_id,
            ));
        }
    };
    Ok(Expression::Literal(literal))
}

fn parse_arguments(stream: &mut TokenStream) -> Result<Vec<Expression>, ParseError> {
    let mut arguments = Vec::new();
    if stream.at(&TokenKind::RightParen) {
        return Ok(arguments);
    }
    loop {
        arguments.push(parse_expression(stream)?);
        if !stream.eat(&TokenKind::Comma) {
            return Ok(arguments);
        }
    }
}
