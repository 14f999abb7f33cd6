pub mod error;
pub mod expression;
pub mod lexer;
mod structural;

pub use error::ParseError;

use crate::RootNode;
use crate::parser::lexer::{Token, TokenKind};

/// Parser entry point.
pub struct Parser {
    filename: String,
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(filename: impl Into<String>, source: String, file_id: usize) -> Self {
        Parser {
            filename: filename.into(),
            source,
            file_id,
        }
    }

    /// Parse the template source into a RootNode.
    pub fn parse(&self) -> Result<RootNode, Vec<ParseError>> {
        let tokens = lexer::tokenize(&self.source, self.file_id)?;
        structural::parse_root(&self.filename, tokens, self.file_id)
    }
}

/// Cursor over a token list. Always ends with an `Eof` token.
pub(crate) struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    pub file_id: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, file_id: usize) -> Self {
        TokenStream {
            tokens,
            pos: 0,
            file_id,
        }
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    pub fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.next();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.next())
        } else {
            let found = self.peek();
            Err(ParseError::unexpected(
                kind.describe(),
                found.kind.describe(),
                found.span.clone(),
                self.file_id,
            ))
        }
    }

    pub fn expect_identifier(&mut self, what: &str) -> Result<(String, Token), ParseError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.next();
                Ok((name, token))
            }
            other => Err(ParseError::unexpected(
                what,
                other.describe(),
                token.span.clone(),
                self.file_id,
            )),
        }
    }

    /// Skip to just past the next closing delimiter (error recovery).
    pub fn recover(&mut self) {
        loop {
            match self.next().kind {
                TokenKind::TagClose | TokenKind::PrintClose | TokenKind::Eof => return,
                _ => {}
            }
        }
    }
}
