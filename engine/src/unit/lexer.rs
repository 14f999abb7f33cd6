use crate::error::UnitDiagnostic;

#[derive(Debug, Clone, PartialEq)]
pub enum UnitToken {
    Identifier(String),
    String(String),
    /// Numeric text, interpreted by the instruction that takes it.
    Number(String),
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Eof,
}

impl UnitToken {
    pub fn describe(&self) -> String {
        match self {
            UnitToken::Identifier(name) => format!("`{}`", name),
            UnitToken::String(_) => "string literal".to_string(),
            UnitToken::Number(n) => format!("number `{}`", n),
            UnitToken::LeftBrace => "`{`".to_string(),
            UnitToken::RightBrace => "`}`".to_string(),
            UnitToken::LeftParen => "`(`".to_string(),
            UnitToken::RightParen => "`)`".to_string(),
            UnitToken::Comma => "`,`".to_string(),
            UnitToken::Semicolon => "`;`".to_string(),
            UnitToken::Eof => "end of unit".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: UnitToken,
    pub line: usize,
}

/// Decode a complete double-quoted unit string literal, e.g. `"a\tb"`.
pub fn parse_string_literal(text: &str) -> Option<String> {
    let (tokens, diagnostics) = tokenize(text);
    match tokens.as_slice() {
        [
            Spanned {
                token: UnitToken::String(s),
                ..
            },
            Spanned {
                token: UnitToken::Eof,
                ..
            },
        ] if diagnostics.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Tokenize unit text. Comments are dropped; bad input becomes diagnostics
/// and lexing carries on.
pub fn tokenize(text: &str) -> (Vec<Spanned>, Vec<UnitDiagnostic>) {
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        let token = match c {
            '\n' => {
                line += 1;
                continue;
            }
            c if c.is_whitespace() => continue,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let start = line;
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == '\n' {
                        line += 1;
                    } else if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    diagnostics.push(UnitDiagnostic::new(start, "unterminated comment"));
                }
                continue;
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
                continue;
            }
            '{' => UnitToken::LeftBrace,
            '}' => UnitToken::RightBrace,
            '(' => UnitToken::LeftParen,
            ')' => UnitToken::RightParen,
            ',' => UnitToken::Comma,
            ';' => UnitToken::Semicolon,
            '"' => {
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\n' => break,
                        '\\' => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(e @ ('\\' | '"' | '\'')) => value.push(e),
                            Some(other) => {
                                diagnostics.push(UnitDiagnostic::new(
                                    line,
                                    format!("illegal escape character `\\{}`", other),
                                ));
                            }
                            None => break,
                        },
                        c => value.push(c),
                    }
                }
                if !closed {
                    diagnostics.push(UnitDiagnostic::new(line, "unclosed string literal"));
                    line += 1;
                }
                UnitToken::String(value)
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = c.to_string();
                while let Some(&next) = chars.peek() {
                    let exponent_sign =
                        (next == '-' || next == '+') && number.ends_with(['e', 'E']);
                    if next.is_ascii_alphanumeric() || next == '.' || exponent_sign {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                UnitToken::Number(number)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                UnitToken::Identifier(name)
            }
            other => {
                diagnostics.push(UnitDiagnostic::new(
                    line,
                    format!("illegal character `{}`", other),
                ));
                continue;
            }
        };
        tokens.push(Spanned { token, line });
    }

    tokens.push(Spanned {
        token: UnitToken::Eof,
        line,
    });
    (tokens, diagnostics)
}
