//! Recursive-descent parser for unit text. Problems are recorded and the
//! parser resynchronizes at the next statement or member.

use super::lexer::{Spanned, UnitToken};
use super::Instruction;
use crate::arithmetic::Operation;
use crate::error::UnitDiagnostic;
use crate::runtime_value::RuntimeValue;

#[derive(Debug, Default)]
pub(super) struct ParsedRoutine {
    pub line: usize,
    pub instructions: Vec<(Instruction, usize)>,
}

#[derive(Debug)]
pub(super) struct ParsedBlock {
    pub name: String,
    pub line: usize,
    pub body: ParsedRoutine,
}

#[derive(Debug)]
pub(super) struct ParsedMacro {
    pub name: String,
    pub parameters: Vec<String>,
    pub line: usize,
    pub body: ParsedRoutine,
}

#[derive(Debug)]
pub(super) struct ParsedUnit {
    pub name: String,
    pub base: String,
    pub line: usize,
    pub constructor: Option<Vec<String>>,
    pub content: Option<ParsedRoutine>,
    pub blocks: Vec<ParsedBlock>,
    pub macros: Vec<ParsedMacro>,
}

struct Failed;

type Parsed<T> = Result<T, Failed>;

struct UnitParser<'a> {
    tokens: &'a [Spanned],
    position: usize,
    diagnostics: &'a mut Vec<UnitDiagnostic>,
}

/// `None` only when the unit header itself is unreadable.
pub(super) fn parse(
    tokens: &[Spanned],
    diagnostics: &mut Vec<UnitDiagnostic>,
) -> Option<ParsedUnit> {
    let mut parser = UnitParser {
        tokens,
        position: 0,
        diagnostics,
    };
    parser.parse_unit()
}

impl<'a> UnitParser<'a> {
    fn peek(&self) -> &'a Spanned {
        let index = self.position.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn next(&mut self) -> &'a Spanned {
        let token = self.peek();
        if token.token != UnitToken::Eof {
            self.position += 1;
        }
        token
    }

    fn at(&self, token: &UnitToken) -> bool {
        self.peek().token == *token
    }

    fn error(&mut self, line: usize, message: impl Into<String>) -> Failed {
        self.diagnostics.push(UnitDiagnostic::new(line, message));
        Failed
    }

    fn expect(&mut self, token: UnitToken) -> Parsed<usize> {
        let found = self.next();
        if found.token == token {
            Ok(found.line)
        } else {
            Err(self.error(
                found.line,
                format!("expected {}, found {}", token.describe(), found.token.describe()),
            ))
        }
    }

    fn identifier(&mut self) -> Parsed<(String, usize)> {
        let found = self.next();
        match &found.token {
            UnitToken::Identifier(name) => Ok((name.clone(), found.line)),
            other => Err(self.error(
                found.line,
                format!("expected identifier, found {}", other.describe()),
            )),
        }
    }

    fn keyword(&mut self, keyword: &str) -> Parsed<usize> {
        let (name, line) = self.identifier()?;
        if name == keyword {
            Ok(line)
        } else {
            Err(self.error(line, format!("expected `{}`, found `{}`", keyword, name)))
        }
    }

    fn string(&mut self) -> Parsed<String> {
        let found = self.next();
        match &found.token {
            UnitToken::String(value) => Ok(value.clone()),
            other => Err(self.error(
                found.line,
                format!("expected string literal, found {}", other.describe()),
            )),
        }
    }

    fn number(&mut self) -> Parsed<(String, usize)> {
        let found = self.next();
        match &found.token {
            UnitToken::Number(text) => Ok((text.clone(), found.line)),
            other => Err(self.error(
                found.line,
                format!("expected number, found {}", other.describe()),
            )),
        }
    }

    /// `( a, b, ... )` where each item is read by `item`.
    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Parsed<T>) -> Parsed<Vec<T>> {
        self.expect(UnitToken::LeftParen)?;
        let mut items = Vec::new();
        if self.at(&UnitToken::RightParen) {
            self.next();
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            if self.at(&UnitToken::Comma) {
                self.next();
            } else {
                self.expect(UnitToken::RightParen)?;
                return Ok(items);
            }
        }
    }

    /// Skip the rest of a braced region whose `{` has already been consumed.
    fn skip_braced(&mut self) {
        let mut depth = 1;
        loop {
            match self.next().token {
                UnitToken::LeftBrace => depth += 1,
                UnitToken::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                UnitToken::Eof => return,
                _ => {}
            }
        }
    }

    /// Skip to the end of a member that failed before or inside its body.
    fn recover_member(&mut self) {
        loop {
            match self.peek().token {
                UnitToken::LeftBrace => {
                    self.next();
                    self.skip_braced();
                    return;
                }
                UnitToken::RightBrace | UnitToken::Eof => return,
                _ => {
                    self.next();
                }
            }
        }
    }

    fn parse_unit(&mut self) -> Option<ParsedUnit> {
        let header = (|| {
            let line = self.keyword("unit")?;
            let (name, _) = self.identifier()?;
            self.keyword("extends")?;
            let (base, _) = self.identifier()?;
            self.expect(UnitToken::LeftBrace)?;
            Ok::<_, Failed>((name, base, line))
        })();
        let (name, base, line) = header.ok()?;

        let mut unit = ParsedUnit {
            name,
            base,
            line,
            constructor: None,
            content: None,
            blocks: Vec::new(),
            macros: Vec::new(),
        };

        loop {
            match &self.peek().token {
                UnitToken::RightBrace => {
                    self.next();
                    break;
                }
                UnitToken::Eof => {
                    let line = self.peek().line;
                    self.error(line, "reached end of unit while parsing");
                    return Some(unit);
                }
                _ => {
                    if self.parse_member(&mut unit).is_err() {
                        self.recover_member();
                    }
                }
            }
        }

        let trailing = self.peek();
        if trailing.token != UnitToken::Eof {
            self.error(
                trailing.line,
                format!("unexpected {} after unit body", trailing.token.describe()),
            );
        }

        if unit.content.is_none() {
            self.error(unit.line, "unit does not define `build_content(writer, context)`");
        }

        Some(unit)
    }

    fn parse_member(&mut self, unit: &mut ParsedUnit) -> Parsed<()> {
        let (member, line) = self.identifier()?;
        match member.as_str() {
            "constructor" => {
                let parameters = self.list(|p| p.identifier().map(|(name, _)| name))?;
                self.expect(UnitToken::LeftBrace)?;
                self.keyword("super")?;
                let super_line = self.peek().line;
                let arguments = self.list(|p| p.identifier().map(|(name, _)| name))?;
                self.expect(UnitToken::Semicolon)?;
                self.expect(UnitToken::RightBrace)?;
                if arguments != parameters {
                    self.error(
                        super_line,
                        "constructor must pass its parameters to `super` unchanged",
                    );
                }
                if unit.constructor.is_some() {
                    self.error(line, "duplicate constructor");
                } else {
                    unit.constructor = Some(parameters);
                }
            }
            "build_content" => {
                let parameters = self.list(|p| p.identifier().map(|(name, _)| name))?;
                if parameters.len() != 2 {
                    self.error(
                        line,
                        format!(
                            "`build_content` takes 2 parameters, found {}",
                            parameters.len()
                        ),
                    );
                }
                let body = self.parse_routine()?;
                if unit.content.is_some() {
                    self.error(line, "duplicate method `build_content`");
                } else {
                    unit.content = Some(body);
                }
            }
            "init_blocks" => {
                self.list(|p| p.identifier())?;
                self.expect(UnitToken::LeftBrace)?;
                while !self.at(&UnitToken::RightBrace) && !self.at(&UnitToken::Eof) {
                    let line = self.keyword("block")?;
                    let name = self.string()?;
                    let body = self.parse_routine()?;
                    unit.blocks.push(ParsedBlock { name, line, body });
                }
                self.expect(UnitToken::RightBrace)?;
            }
            "init_macros" => {
                self.list(|p| p.identifier())?;
                self.expect(UnitToken::LeftBrace)?;
                while !self.at(&UnitToken::RightBrace) && !self.at(&UnitToken::Eof) {
                    let line = self.keyword("macro")?;
                    let name = self.string()?;
                    let parameters = self.list(|p| p.string())?;
                    let body = self.parse_routine()?;
                    unit.macros.push(ParsedMacro {
                        name,
                        parameters,
                        line,
                        body,
                    });
                }
                self.expect(UnitToken::RightBrace)?;
            }
            other => {
                return Err(self.error(line, format!("unknown member `{}`", other)));
            }
        }
        Ok(())
    }

    /// `{ statement* }`. A bad statement is reported and skipped.
    fn parse_routine(&mut self) -> Parsed<ParsedRoutine> {
        let line = self.expect(UnitToken::LeftBrace)?;
        let mut routine = ParsedRoutine {
            line,
            instructions: Vec::new(),
        };
        loop {
            match self.peek().token {
                UnitToken::RightBrace => {
                    self.next();
                    return Ok(routine);
                }
                UnitToken::Eof => {
                    let line = self.peek().line;
                    return Err(self.error(line, "reached end of unit while parsing"));
                }
                _ => match self.parse_statement() {
                    Ok(statement) => routine.instructions.push(statement),
                    Err(Failed) => self.recover_statement(),
                },
            }
        }
    }

    fn recover_statement(&mut self) {
        loop {
            match self.peek().token {
                UnitToken::Semicolon => {
                    self.next();
                    return;
                }
                UnitToken::RightBrace | UnitToken::Eof => return,
                _ => {
                    self.next();
                }
            }
        }
    }

    fn parse_statement(&mut self) -> Parsed<(Instruction, usize)> {
        let (mnemonic, line) = self.identifier()?;
        let instruction = match mnemonic.as_str() {
            "write_text" => Instruction::WriteText(self.string()?),
            "push_string" => Instruction::Push(RuntimeValue::String(self.string()?)),
            "load" => Instruction::Load(self.string()?),
            "store" => Instruction::Store(self.string()?),
            "render_block" => Instruction::RenderBlock(self.string()?),
            "render_parent_block" => Instruction::RenderParentBlock(self.string()?),
            "push_int" => Instruction::Push(RuntimeValue::Int(self.numeric("int")?)),
            "push_long" => Instruction::Push(RuntimeValue::Long(self.numeric("long")?)),
            "push_float" => Instruction::Push(RuntimeValue::Float(self.numeric("float")?)),
            "push_double" => Instruction::Push(RuntimeValue::Double(self.numeric("double")?)),
            "push_bool" => {
                let (value, line) = self.identifier()?;
                match value.as_str() {
                    "true" => Instruction::Push(RuntimeValue::Boolean(true)),
                    "false" => Instruction::Push(RuntimeValue::Boolean(false)),
                    other => {
                        return Err(self.error(
                            line,
                            format!("expected `true` or `false`, found `{}`", other),
                        ));
                    }
                }
            }
            "push_none" => Instruction::Push(RuntimeValue::None),
            "unary_plus" => Instruction::UnaryPlus,
            "unary_minus" => Instruction::UnaryMinus,
            "print" => Instruction::Print,
            "push_inheritance_chain" => Instruction::PushInheritanceChain,
            "delegate_parent" => Instruction::DelegateParent,
            "call_macro" => {
                let name = self.string()?;
                let arguments = self.numeric("argument count")?;
                Instruction::CallMacro { name, arguments }
            }
            other => match Operation::from_mnemonic(other) {
                Some(operation) => Instruction::Binary(operation),
                None => {
                    return Err(self.error(line, format!("unknown instruction `{}`", other)));
                }
            },
        };
        self.expect(UnitToken::Semicolon)?;
        Ok((instruction, line))
    }

    fn numeric<T: std::str::FromStr>(&mut self, kind: &str) -> Parsed<T> {
        let (text, line) = self.number()?;
        text.parse()
            .map_err(|_| self.error(line, format!("invalid {} literal `{}`", kind, text)))
    }
}
