use std::ops::Range;

use crate::parser::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Raw text between tags.
    Text(String),
    /// `{{`
    PrintOpen,
    /// `}}`
    PrintClose,
    /// `{%`
    TagOpen,
    /// `%}`
    TagClose,
    Identifier(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LeftParen,
    RightParen,
    Comma,
    Assign,
    Eof,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Text(_) => "text".to_string(),
            TokenKind::PrintOpen => "`{{`".to_string(),
            TokenKind::PrintClose => "`}}`".to_string(),
            TokenKind::TagOpen => "`{%`".to_string(),
            TokenKind::TagClose => "`%}`".to_string(),
            TokenKind::Identifier(name) => format!("`{}`", name),
            TokenKind::Int(_) | TokenKind::Long(_) => "integer literal".to_string(),
            TokenKind::Float(_) | TokenKind::Double(_) => "number literal".to_string(),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Percent => "`%`".to_string(),
            TokenKind::LeftParen => "`(`".to_string(),
            TokenKind::RightParen => "`)`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Assign => "`=`".to_string(),
            TokenKind::Eof => "end of template".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Split template source into text and delimited code tokens.
/// Lexing continues past bad characters so every error is reported.
pub fn tokenize(source: &str, file_id: usize) -> Result<Vec<Token>, Vec<ParseError>> {
    let mut lexer = Lexer {
        source,
        pos: 0,
        file_id,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    if lexer.errors.is_empty() {
        Ok(lexer.tokens)
    } else {
        Err(lexer.errors)
    }
}

struct Lexer<'s> {
    source: &'s str,
    pos: usize,
    file_id: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl<'s> Lexer<'s> {
    fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: start..self.pos,
        });
    }

    fn run(&mut self) {
        while self.pos < self.source.len() {
            let rest = self.rest();
            let next_delim = ["{{", "{%", "{#"]
                .iter()
                .filter_map(|d| rest.find(d))
                .min();

            match next_delim {
                Some(0) => self.delimited(),
                Some(offset) => {
                    let start = self.pos;
                    self.pos += offset;
                    self.push(TokenKind::Text(rest[..offset].to_string()), start);
                }
                None => {
                    let start = self.pos;
                    self.pos = self.source.len();
                    self.push(TokenKind::Text(rest.to_string()), start);
                }
            }
        }
        let end = self.source.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: end..end,
        });
    }

    fn delimited(&mut self) {
        let start = self.pos;
        let rest = self.rest();

        if rest.starts_with("{#") {
            match rest.find("#}") {
                Some(end) => self.pos += end + 2,
                None => {
                    self.errors.push(
                        ParseError::error("unclosed comment", start..start + 2, self.file_id)
                            .with_note("add `#}` to close this comment"),
                    );
                    self.pos = self.source.len();
                }
            }
            return;
        }

        let (open, close, close_kind) = if rest.starts_with("{{") {
            (TokenKind::PrintOpen, "}}", TokenKind::PrintClose)
        } else {
            (TokenKind::TagOpen, "%}", TokenKind::TagClose)
        };
        self.pos += 2;
        self.push(open, start);

        loop {
            self.skip_whitespace();
            if self.pos >= self.source.len() {
                self.errors.push(
                    ParseError::error("unclosed delimiter", start..start + 2, self.file_id)
                        .with_note(format!("add `{}` to close it", close)),
                );
                return;
            }
            if self.rest().starts_with(close) {
                let close_start = self.pos;
                self.pos += 2;
                self.push(close_kind, close_start);
                return;
            }
            self.code_token();
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }

    fn code_token(&mut self) {
        let start = self.pos;
        let Some(c) = self.rest().chars().next() else {
            return;
        };

        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '%' => Some(TokenKind::Percent),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            ',' => Some(TokenKind::Comma),
            '=' => Some(TokenKind::Assign),
            _ => None,
        };
        if let Some(kind) = single {
            self.pos += 1;
            self.push(kind, start);
            return;
        }

        if c == '"' || c == '\'' {
            self.string(c);
        } else if c.is_ascii_digit() {
            self.number();
        } else if c.is_alphabetic() || c == '_' {
            let len = self
                .rest()
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
                .unwrap_or(self.rest().len());
            let name = self.rest()[..len].to_string();
            self.pos += len;
            self.push(TokenKind::Identifier(name), start);
        } else {
            self.pos += c.len_utf8();
            self.errors.push(ParseError::error(
                format!("unexpected character `{}`", c),
                start..self.pos,
                self.file_id,
            ));
        }
    }

    fn string(&mut self, quote: char) {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                c if c == quote => {
                    self.pos += offset + 1;
                    self.push(TokenKind::String(value), start);
                    return;
                }
                c => value.push(c),
            }
        }
        self.errors.push(ParseError::error(
            "unterminated string literal",
            start..start + 1,
            self.file_id,
        ));
        self.pos = self.source.len();
    }

    fn number(&mut self) {
        let start = self.pos;
        let rest = self.rest();
        let mut len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let mut fractional = false;
        if rest[len..].starts_with('.')
            && rest[len + 1..].starts_with(|c: char| c.is_ascii_digit())
        {
            fractional = true;
            len += 1;
            len += rest[len..]
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len() - len);
        }
        let digits = &rest[..len];
        let suffix = rest[len..].chars().next();
        self.pos += len;

        let kind = match suffix {
            Some('L' | 'l') if !fractional => {
                self.pos += 1;
                digits.parse::<i64>().ok().map(TokenKind::Long)
            }
            Some('f' | 'F') => {
                self.pos += 1;
                digits
                    .parse::<f32>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .map(TokenKind::Float)
            }
            Some('d' | 'D') => {
                self.pos += 1;
                digits
                    .parse::<f64>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .map(TokenKind::Double)
            }
            _ if fractional => digits
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(TokenKind::Double),
            _ => match digits.parse::<i32>() {
                Ok(n) => Some(TokenKind::Int(n)),
                Err(_) => digits.parse::<i64>().ok().map(TokenKind::Long),
            },
        };

        match kind {
            Some(kind) => self.push(kind, start),
            None => self.errors.push(ParseError::error(
                "number literal out of range",
                start..self.pos,
                self.file_id,
            )),
        }
    }
}
