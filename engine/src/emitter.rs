//! Text builder for executable units.
//!
//! Every AST node knows how to emit itself through [`Compile`]; the emitter
//! only tracks the buffer and the indentation.

use crate::engine::Engine;

const INDENTATION: &str = "    ";

/// Implemented by every node that can be serialized into a unit.
pub trait Compile {
    fn compile(&self, emitter: &mut Emitter<'_>);
}

/// Builds the text of one executable unit. Single-use: [`Emitter::compile`]
/// consumes it, so each compile job needs a fresh instance.
pub struct Emitter<'e> {
    engine: &'e Engine,
    buffer: String,
    indentation: usize,
}

impl<'e> Emitter<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Emitter {
            engine,
            buffer: String::new(),
            indentation: 0,
        }
    }

    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// Emit `node` from a clean state and return the unit text.
    pub fn compile<N: Compile + ?Sized>(mut self, node: &N) -> String {
        self.buffer.clear();
        self.indentation = 0;
        node.compile(&mut self);
        self.buffer
    }

    /// Emit a nested node. Unless `raw`, the indentation prefix is written first.
    pub fn subcompile<N: Compile + ?Sized>(&mut self, node: &N, raw: bool) -> &mut Self {
        if !raw {
            self.add_indentation();
        }
        node.compile(self);
        self
    }

    /// Indentation prefix, then `text`.
    pub fn write(&mut self, text: &str) -> &mut Self {
        self.add_indentation();
        self.buffer.push_str(text);
        self
    }

    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }

    /// `text` as a double-quoted unit string literal.
    pub fn literal(&mut self, text: &str) -> &mut Self {
        self.buffer.push('"');
        for c in text.chars() {
            match c {
                '\\' | '"' | '\'' => {
                    self.buffer.push('\\');
                    self.buffer.push(c);
                }
                '\n' | '\r' | '\u{000C}' => self.buffer.push_str("\\n"),
                '\t' => self.buffer.push_str("\\t"),
                c => self.buffer.push(c),
            }
        }
        self.buffer.push('"');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indentation += 1;
        self
    }

    /// Panics when the indentation is already zero: that is a codegen bug,
    /// never a template error.
    pub fn outdent(&mut self) -> &mut Self {
        assert!(
            self.indentation > 0,
            "emitter outdent below zero indentation"
        );
        self.indentation -= 1;
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.newlines(1)
    }

    pub fn newlines(&mut self, count: usize) -> &mut Self {
        for _ in 0..count {
            self.buffer.push('\n');
        }
        self
    }

    pub fn indentation(&self) -> usize {
        self.indentation
    }

    /// The text accumulated so far.
    pub fn source(&self) -> &str {
        &self.buffer
    }

    fn add_indentation(&mut self) {
        for _ in 0..self.indentation {
            self.buffer.push_str(INDENTATION);
        }
    }
}
