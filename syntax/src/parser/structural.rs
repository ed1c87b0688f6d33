use std::ops::Range;

use crate::ast::{Body, Expr, Module, Node, Pos};
use crate::parser::error::ParseError;
use crate::parser::expression::{ExprParser, Token, tokenize};
use crate::parser::lexer::{LineIndex, Segment, segment};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse template source text into a module.
pub fn parse_module(source: &str, file_id: usize) -> Result<Module, ParseError> {
    let segments = segment(source, file_id)?;
    let mut state = ParseState::new(source, file_id, segments);
    let (body, end) = state.parse_body(&[])?;
    debug_assert!(end.is_none());
    Ok(Module {
        parent: state.parent,
        body,
    })
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    source: &'a str,
    file_id: usize,
    segments: Vec<Segment>,
    next: usize,
    lines: LineIndex,
    /// Nesting depth of block-level tags; `extends` is only valid at 0.
    depth: usize,
    parent: Option<Expr>,
}

/// The tag that ended a body, with its arguments still unparsed.
struct EndTag {
    name: String,
    args: ExprParser,
    span: Range<usize>,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str, file_id: usize, segments: Vec<Segment>) -> Self {
        ParseState {
            source,
            file_id,
            segments,
            next: 0,
            lines: LineIndex::new(source),
            depth: 0,
            parent: None,
        }
    }

    fn error(&self, msg: impl Into<String>, span: Range<usize>) -> ParseError {
        ParseError::error(msg, span, self.file_id)
    }

    /// Parse nodes until a tag named in `terminators` (returned) or the end
    /// of input (`None`).
    fn parse_body(&mut self, terminators: &[&str]) -> Result<(Body, Option<EndTag>), ParseError> {
        let mut nodes = Vec::new();

        while self.next < self.segments.len() {
            let seg = self.segments[self.next].clone();
            self.next += 1;

            match seg {
                Segment::Text { data, start } => {
                    nodes.push(Node::Text {
                        data,
                        pos: self.lines.pos(start),
                    });
                }
                Segment::Print { inner, start } => {
                    let mut parser = self.expr_parser(inner)?;
                    let expr = parser.parse_expr(0)?;
                    parser.finish()?;
                    nodes.push(Node::Print {
                        expr,
                        pos: self.lines.pos(start),
                    });
                }
                Segment::Tag { inner, span } => {
                    let mut args = self.expr_parser(inner)?;
                    let name = args.expect_ident("tag name")?;

                    if terminators.contains(&name.as_str()) {
                        return Ok((Body::new(nodes), Some(EndTag { name, args, span })));
                    }

                    if let Some(node) = self.parse_tag(&name, args, span)? {
                        nodes.push(node);
                    }
                }
            }
        }

        Ok((Body::new(nodes), None))
    }

    fn expr_parser(&self, inner: Range<usize>) -> Result<ExprParser, ParseError> {
        let tokens = tokenize(self.source, inner.clone(), self.file_id)?;
        Ok(ExprParser::new(tokens, inner, self.file_id))
    }

    fn parse_tag(
        &mut self,
        name: &str,
        mut args: ExprParser,
        span: Range<usize>,
    ) -> Result<Option<Node>, ParseError> {
        let pos = self.lines.pos(span.start);

        match name {
            "extends" => {
                if self.depth > 0 {
                    return Err(self.error("`extends` must be used at the top level", span));
                }
                if self.parent.is_some() {
                    return Err(self.error("template already extends another template", span));
                }
                let target = args.parse_expr(0)?;
                args.finish()?;
                self.parent = Some(target);
                Ok(None)
            }
            "block" => {
                let block_name = args.expect_ident("block name")?;
                args.finish()?;
                let (body, end) = self.parse_nested(&["endblock"])?;
                let mut end = self.require_end(end, "block", &span)?;
                if matches!(end.args.peek(), Some(Token::Ident(_))) {
                    let closing = end.args.expect_ident("block name")?;
                    if closing != block_name {
                        return Err(self
                            .error(
                                format!("`endblock {}` does not close `block {}`", closing, block_name),
                                end.span,
                            )
                            .with_note(format!("`block {}` opened on line {}", block_name, pos.line)));
                    }
                }
                end.args.finish()?;
                Ok(Some(Node::Block {
                    name: block_name,
                    body,
                    pos,
                }))
            }
            "for" => {
                let first = args.expect_ident("loop variable")?;
                let (key, val) = if args.eat(&Token::Comma) {
                    (Some(first), args.expect_ident("loop variable")?)
                } else {
                    (None, first)
                };
                if !matches!(args.peek(), Some(Token::Ident(word)) if word == "in") {
                    return Err(args.error("expected `in`"));
                }
                args.expect_ident("`in`")?;
                let iterable = args.parse_expr(0)?;
                args.finish()?;
                let (body, end) = self.parse_nested(&["endfor"])?;
                self.require_end(end, "for", &span)?.args.finish()?;
                Ok(Some(Node::For {
                    key,
                    val,
                    iterable,
                    body,
                    pos,
                }))
            }
            "if" => {
                let cond = args.parse_expr(0)?;
                args.finish()?;
                self.parse_if(cond, pos, span).map(Some)
            }
            "include" => {
                let target = args.parse_expr(0)?;
                args.finish()?;
                Ok(Some(Node::Include { target, pos }))
            }
            "endblock" | "endfor" | "endif" | "else" | "elseif" => Err(self
                .error(format!("unexpected `{}`", name), span)
                .with_note("no open tag is waiting for it here")),
            other => Err(self.error(format!("unknown tag `{}`", other), span)),
        }
    }

    /// Parse the remainder of an `if` whose condition is already parsed:
    /// its body, then `elseif`/`else` alternates up to the shared `endif`.
    fn parse_if(&mut self, cond: Expr, pos: Pos, span: Range<usize>) -> Result<Node, ParseError> {
        let (body, end) = self.parse_nested(&["elseif", "else", "endif"])?;
        let mut end = self.require_end(end, "if", &span)?;

        let alternate = match end.name.as_str() {
            "endif" => {
                end.args.finish()?;
                Body::empty()
            }
            "else" => {
                end.args.finish()?;
                let (alternate, close) = self.parse_nested(&["endif"])?;
                self.require_end(close, "if", &span)?.args.finish()?;
                alternate
            }
            _ => {
                let cond = end.args.parse_expr(0)?;
                end.args.finish()?;
                let elseif_pos = self.lines.pos(end.span.start);
                Body::new(vec![self.parse_if(cond, elseif_pos, end.span)?])
            }
        };

        Ok(Node::If {
            cond,
            body,
            alternate,
            pos,
        })
    }

    fn parse_nested(&mut self, terminators: &[&str]) -> Result<(Body, Option<EndTag>), ParseError> {
        self.depth += 1;
        let result = self.parse_body(terminators);
        self.depth -= 1;
        result
    }

    fn require_end(
        &self,
        end: Option<EndTag>,
        tag: &str,
        open: &Range<usize>,
    ) -> Result<EndTag, ParseError> {
        end.ok_or_else(|| {
            self.error(format!("unclosed `{}` tag", tag), open.clone())
                .with_note(format!("expected `{{% end{} %}}`", tag))
        })
    }
}
