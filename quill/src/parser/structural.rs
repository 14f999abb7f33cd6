use std::ops::Range;

use indexmap::IndexMap;

use crate::RootNode;
use crate::node::block::BlockNode;
use crate::node::macros::MacroNode;
use crate::node::{
    BlockReferenceNode, BodyNode, Node, ParentNode, PrintNode, SetNode, TextNode,
};
use crate::parser::TokenStream;
use crate::parser::error::ParseError;
use crate::parser::expression::parse_expression;
use crate::parser::lexer::{Token, TokenKind};

/// Build a RootNode from the token list, collecting every tag-level error.
pub(crate) fn parse_root(
    filename: &str,
    tokens: Vec<Token>,
    file_id: usize,
) -> Result<RootNode, Vec<ParseError>> {
    let mut structure = Structure {
        stream: TokenStream::new(tokens, file_id),
        file_id,
        errors: Vec::new(),
        parent: None,
        blocks: IndexMap::new(),
        macros: IndexMap::new(),
        open_blocks: Vec::new(),
    };

    let body = structure.parse_body(&[]).0;

    if !structure.errors.is_empty() {
        return Err(structure.errors);
    }

    Ok(RootNode {
        filename: filename.to_string(),
        parent_filename: structure.parent.map(|(name, _)| name),
        body,
        blocks: structure.blocks,
        macros: structure.macros,
        source_id: file_id,
    })
}

struct Structure {
    stream: TokenStream,
    file_id: usize,
    errors: Vec<ParseError>,
    parent: Option<(String, Range<usize>)>,
    blocks: IndexMap<String, BlockNode>,
    macros: IndexMap<String, Vec<MacroNode>>,
    /// Names of the blocks enclosing the current position, innermost last.
    open_blocks: Vec<String>,
}

/// How a body ended: on one of the requested end tags, or at end of input.
enum BodyEnd {
    Tag,
    Eof,
}

impl Structure {
    /// Parse nodes until one of `end_tags` (consumed up to its name) or Eof.
    fn parse_body(&mut self, end_tags: &[&str]) -> (BodyNode, BodyEnd) {
        let mut nodes = Vec::new();
        loop {
            let token = self.stream.peek().clone();
            match token.kind {
                TokenKind::Eof => return (BodyNode::new(nodes), BodyEnd::Eof),
                TokenKind::Text(text) => {
                    self.stream.next();
                    nodes.push(Node::Text(TextNode {
                        text,
                        span: token.span,
                    }));
                }
                TokenKind::PrintOpen => {
                    self.stream.next();
                    match self.parse_print(token.span.start) {
                        Ok(node) => nodes.push(node),
                        Err(e) => self.fail(e),
                    }
                }
                TokenKind::TagOpen => {
                    self.stream.next();
                    let name = match &self.stream.peek().kind {
                        TokenKind::Identifier(name) => name.clone(),
                        _ => String::new(),
                    };
                    if end_tags.contains(&name.as_str()) {
                        self.stream.next();
                        return (BodyNode::new(nodes), BodyEnd::Tag);
                    }
                    match self.parse_tag(token.span.start) {
                        Ok(Some(node)) => nodes.push(node),
                        Ok(None) => {}
                        Err(e) => self.fail(e),
                    }
                }
                other => {
                    self.stream.next();
                    self.errors.push(ParseError::unexpected(
                        "text or a tag",
                        other.describe(),
                        token.span,
                        self.file_id,
                    ));
                }
            }
        }
    }

    fn fail(&mut self, error: ParseError) {
        self.errors.push(error);
        self.stream.recover();
    }

    /// After `{{`: either `parent()` or an expression.
    fn parse_print(&mut self, start: usize) -> Result<Node, ParseError> {
        let is_parent_call = matches!(&self.stream.peek().kind, TokenKind::Identifier(name) if name == "parent")
            && self.stream.peek_nth(1).kind == TokenKind::LeftParen
            && self.stream.peek_nth(2).kind == TokenKind::RightParen;

        if is_parent_call {
            let call = self.stream.next();
            self.stream.next();
            self.stream.next();
            let Some(block) = self.open_blocks.last().cloned() else {
                return Err(ParseError::error(
                    "`parent()` used outside of a block",
                    call.span,
                    self.file_id,
                )
                .with_note("`parent()` renders the ancestor's version of the enclosing block"));
            };
            let end = self.stream.expect(&TokenKind::PrintClose)?;
            return Ok(Node::Parent(ParentNode {
                block,
                span: start..end.span.end,
            }));
        }

        let expression = parse_expression(&mut self.stream)?;
        let end = self.stream.expect(&TokenKind::PrintClose)?;
        Ok(Node::Print(PrintNode {
            expression,
            span: start..end.span.end,
        }))
    }

    /// After `{%`. Returns the node to place in the body, if any.
    fn parse_tag(&mut self, start: usize) -> Result<Option<Node>, ParseError> {
        let (tag, tag_token) = self.stream.expect_identifier("a tag name")?;
        match tag.as_str() {
            "extends" => self.parse_extends(start).map(|_| None),
            "block" => self.parse_block(start).map(Some),
            "macro" => self.parse_macro(start).map(|_| None),
            "set" => self.parse_set(start).map(Some),
            "endblock" | "endmacro" => Err(ParseError::error(
                format!("unexpected `{}`", tag),
                tag_token.span,
                self.file_id,
            )
            .with_note("there is no open tag for it to close")),
            _ => Err(ParseError::error(
                format!("unknown tag `{}`", tag),
                tag_token.span,
                self.file_id,
            )),
        }
    }

    fn parse_extends(&mut self, start: usize) -> Result<(), ParseError> {
        let token = self.stream.next();
        let TokenKind::String(parent) = token.kind else {
            return Err(ParseError::unexpected(
                "a template name string",
                token.kind.describe(),
                token.span,
                self.file_id,
            ));
        };
        let end = self.stream.expect(&TokenKind::TagClose)?;
        let span = start..end.span.end;
        // The tag is fully consumed here, so report without recovering
        if let Some((_, first)) = &self.parent {
            let error =
                ParseError::error("template extends more than one parent", span, self.file_id)
                    .with_related(first.clone(), "first `extends` here");
            self.errors.push(error);
            return Ok(());
        }
        self.parent = Some((parent, span));
        Ok(())
    }

    fn parse_block(&mut self, start: usize) -> Result<Node, ParseError> {
        let (name, _) = self.stream.expect_identifier("a block name")?;
        self.stream.expect(&TokenKind::TagClose)?;

        self.open_blocks.push(name.clone());
        let (body, end) = self.parse_body(&["endblock"]);
        self.open_blocks.pop();

        let end_span = self.close_tag(end, "endblock", &name, start)?;
        let span = start..end_span.end;

        if let Some(existing) = self.blocks.get(&name) {
            let error = ParseError::error(
                format!("block `{}` is declared more than once", name),
                span.clone(),
                self.file_id,
            )
            .with_related(existing.span.clone(), "first declared here");
            self.errors.push(error);
            return Ok(Node::Block(BlockReferenceNode { name, span }));
        }

        self.blocks.insert(
            name.clone(),
            BlockNode {
                name: name.clone(),
                body,
                span: span.clone(),
            },
        );
        Ok(Node::Block(BlockReferenceNode { name, span }))
    }

    fn parse_macro(&mut self, start: usize) -> Result<(), ParseError> {
        let (name, _) = self.stream.expect_identifier("a macro name")?;
        self.stream.expect(&TokenKind::LeftParen)?;
        let mut parameters = Vec::new();
        if !self.stream.at(&TokenKind::RightParen) {
            loop {
                let (parameter, token) = self.stream.expect_identifier("a parameter name")?;
                if parameters.contains(&parameter) {
                    return Err(ParseError::error(
                        format!("duplicate parameter `{}`", parameter),
                        token.span,
                        self.file_id,
                    ));
                }
                parameters.push(parameter);
                if !self.stream.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.stream.expect(&TokenKind::RightParen)?;
        self.stream.expect(&TokenKind::TagClose)?;

        // `parent()` inside a macro has no enclosing block
        let enclosing = std::mem::take(&mut self.open_blocks);
        let (body, end) = self.parse_body(&["endmacro"]);
        self.open_blocks = enclosing;

        let end_span = self.close_tag(end, "endmacro", &name, start)?;
        let span = start..end_span.end;

        let overloads = self.macros.entry(name.clone()).or_default();
        if let Some(existing) = overloads.iter().find(|m| m.arity() == parameters.len()) {
            let error = ParseError::error(
                format!(
                    "macro `{}` already has an overload taking {} argument(s)",
                    name,
                    parameters.len()
                ),
                span,
                self.file_id,
            )
            .with_related(existing.span.clone(), "first declared here");
            self.errors.push(error);
            return Ok(());
        }
        overloads.push(MacroNode {
            name,
            parameters,
            body,
            span,
        });
        Ok(())
    }

    fn parse_set(&mut self, start: usize) -> Result<Node, ParseError> {
        let (name, _) = self.stream.expect_identifier("a variable name")?;
        self.stream.expect(&TokenKind::Assign)?;
        let value = parse_expression(&mut self.stream)?;
        let end = self.stream.expect(&TokenKind::TagClose)?;
        Ok(Node::Set(SetNode {
            name,
            value,
            span: start..end.span.end,
        }))
    }

    /// Finish `{% endblock [name] %}` / `{% endmacro [name] %}`.
    fn close_tag(
        &mut self,
        end: BodyEnd,
        tag: &str,
        name: &str,
        start: usize,
    ) -> Result<Range<usize>, ParseError> {
        match end {
            BodyEnd::Eof => Err(ParseError::error(
                format!("unclosed `{}`", name),
                start..start + 2,
                self.file_id,
            )
            .with_note(format!("add `{{% {} %}}` to close it", tag))),
            BodyEnd::Tag => {
                if let TokenKind::Identifier(closing) = &self.stream.peek().kind {
                    if closing != name {
                        let found = self.stream.peek().clone();
                        return Err(ParseError::error(
                            format!("`{}` closes `{}`, but `{}` is open", tag, closing, name),
                            found.span,
                            self.file_id,
                        ));
                    }
                    self.stream.next();
                }
                let close = self.stream.expect(&TokenKind::TagClose)?;
                Ok(close.span)
            }
        }
    }
}
