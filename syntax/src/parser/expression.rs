use std::ops::Range;

use crate::ast::{BinaryOperator, Expr};
use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    StringLit(String),

    // Punctuation
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,

    // Operators
    EqEq,
    BangEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Tilde,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("`{}`", name),
            Token::StringLit(_) => "string literal".to_string(),
            Token::Dot => "`.`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::EqEq => "`==`".to_string(),
            Token::BangEq => "`!=`".to_string(),
            Token::Lt => "`<`".to_string(),
            Token::Gt => "`>`".to_string(),
            Token::LtEq => "`<=`".to_string(),
            Token::GtEq => "`>=`".to_string(),
            Token::Plus => "`+`".to_string(),
            Token::Minus => "`-`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::Slash => "`/`".to_string(),
            Token::Percent => "`%`".to_string(),
            Token::Tilde => "`~`".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Tokenize `source[range]`. Spans in the result are absolute byte offsets.
pub(crate) fn tokenize(
    source: &str,
    range: Range<usize>,
    file_id: usize,
) -> Result<Vec<(Token, Range<usize>)>, ParseError> {
    let text = &source[range.clone()];
    let base = range.start;
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = i;
            while let Some(&(j, c)) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    end = j + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((Token::Ident(text[i..end].to_string()), base + i..base + end));
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = i;
            while let Some(&(j, c)) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    end = j + 1;
                    chars.next();
                } else {
                    break;
                }
            }
            return Err(ParseError::error(
                "number literals are not supported",
                base + i..base + end,
                file_id,
            )
            .with_note("pass numbers through the render context instead"));
        }

        if c == '"' || c == '\'' {
            chars.next();
            let mut value = String::new();
            let mut closed = None;
            while let Some((j, ch)) = chars.next() {
                match ch {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, 'r')) => value.push('\r'),
                        Some((_, escaped)) => value.push(escaped),
                        None => break,
                    },
                    ch if ch == c => {
                        closed = Some(j + 1);
                        break;
                    }
                    ch => value.push(ch),
                }
            }
            let Some(end) = closed else {
                return Err(ParseError::error(
                    "unterminated string literal",
                    base + i..base + text.len(),
                    file_id,
                ));
            };
            tokens.push((Token::StringLit(value), base + i..base + end));
            continue;
        }

        chars.next();
        let next = chars.peek().map(|&(_, c)| c);
        let (token, len) = match (c, next) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::BangEq, 2),
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('.', _) => (Token::Dot, 1),
            (',', _) => (Token::Comma, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('~', _) => (Token::Tilde, 1),
            _ => {
                return Err(ParseError::error(
                    format!("unexpected character `{}`", c),
                    base + i..base + i + c.len_utf8(),
                    file_id,
                ));
            }
        };
        if len == 2 {
            chars.next();
        }
        tokens.push((token, base + i..base + i + len));
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Pratt parser
// ---------------------------------------------------------------------------

pub(crate) struct ExprParser {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    /// Span reported for errors at the end of input.
    span: Range<usize>,
    file_id: usize,
}

// Binding powers (precedence). Higher = tighter binding. All left-assoc.
const BP_OR: u8 = 2; // or
const BP_AND: u8 = 4; // and
const BP_COMPARISON: u8 = 6; // == != < > <= >=
const BP_CONCAT: u8 = 8; // ~
const BP_ADDITIVE: u8 = 10; // + -
const BP_MULTIPLICATIVE: u8 = 12; // * / %

fn infix_op(token: &Token) -> Option<(BinaryOperator, u8)> {
    let op = match token {
        Token::Ident(word) if word == "or" => (BinaryOperator::Or, BP_OR),
        Token::Ident(word) if word == "and" => (BinaryOperator::And, BP_AND),
        Token::EqEq => (BinaryOperator::Equal, BP_COMPARISON),
        Token::BangEq => (BinaryOperator::NotEqual, BP_COMPARISON),
        Token::Lt => (BinaryOperator::LessThan, BP_COMPARISON),
        Token::Gt => (BinaryOperator::GreaterThan, BP_COMPARISON),
        Token::LtEq => (BinaryOperator::LessThanOrEqual, BP_COMPARISON),
        Token::GtEq => (BinaryOperator::GreaterThanOrEqual, BP_COMPARISON),
        Token::Tilde => (BinaryOperator::Concat, BP_CONCAT),
        Token::Plus => (BinaryOperator::Add, BP_ADDITIVE),
        Token::Minus => (BinaryOperator::Subtract, BP_ADDITIVE),
        Token::Star => (BinaryOperator::Multiply, BP_MULTIPLICATIVE),
        Token::Slash => (BinaryOperator::Divide, BP_MULTIPLICATIVE),
        Token::Percent => (BinaryOperator::Modulo, BP_MULTIPLICATIVE),
        _ => return None,
    };
    Some(op)
}

impl ExprParser {
    pub(crate) fn new(tokens: Vec<(Token, Range<usize>)>, span: Range<usize>, file_id: usize) -> Self {
        ExprParser {
            tokens,
            pos: 0,
            span,
            file_id,
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the current token, or the end of the input.
    fn current_span(&self) -> Range<usize> {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.clone())
            .unwrap_or_else(|| self.span.end..self.span.end)
    }

    pub(crate) fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError::error(msg, self.current_span(), self.file_id)
    }

    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name)
            }
            Some(other) => Err(self.error(format!("expected {}, found {}", what, other.describe()))),
            None => Err(self.error(format!("expected {}", what))),
        }
    }

    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), ParseError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", token.describe())))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => self.error(format!("{}, found {}", expected, token.describe())),
            None => self.error(format!("{}, found end of expression", expected)),
        }
    }

    /// Error unless all tokens were consumed.
    pub(crate) fn finish(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected {}", token.describe()))),
        }
    }

    // ------------------------------------------------------------------
    // Pratt parser core
    // ------------------------------------------------------------------

    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_postfix()?;

        loop {
            let Some((op, l_bp)) = self.peek().and_then(infix_op) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.pos += 1;
            let right = self.parse_expr(l_bp + 1)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.eat(&Token::Dot) {
                let attr = self.expect_ident("attribute name")?;
                let args = if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.parse_args()?
                } else {
                    Vec::new()
                };
                expr = Expr::GetAttr {
                    base: Box::new(expr),
                    attr: Box::new(Expr::StringLiteral(attr)),
                    args,
                };
            } else if self.eat(&Token::LBracket) {
                let attr = self.parse_expr(0)?;
                self.expect(Token::RBracket)?;
                expr = Expr::GetAttr {
                    base: Box::new(expr),
                    attr: Box::new(attr),
                    args: Vec::new(),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("unexpected end of expression"));
        };

        match token {
            Token::Ident(name) => {
                if infix_op(&Token::Ident(name.clone())).is_some() || name == "not" {
                    return Err(self
                        .error(format!("unexpected operator `{}`", name))
                        .with_note("unary operators are not supported"));
                }
                self.pos += 1;
                if self.eat(&Token::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::FuncCall { name, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::StringLit(s) => {
                self.pos += 1;
                Ok(Expr::StringLiteral(s))
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.parse_expr(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Minus => Err(self
                .error("unexpected `-`")
                .with_note("unary operators are not supported")),
            _ => Err(self.unexpected("expected an expression")),
        }
    }

    /// Parse call arguments after the opening parenthesis.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(0)?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen)?;
            return Ok(args);
        }
    }
}

/// Parse a standalone expression, e.g. the body of a `{{ … }}` tag.
pub fn parse_expression(source: &str, file_id: usize) -> Result<Expr, ParseError> {
    let tokens = tokenize(source, 0..source.len(), file_id)?;
    let mut parser = ExprParser::new(tokens, 0..source.len(), file_id);
    let expr = parser.parse_expr(0)?;
    parser.finish()?;
    Ok(expr)
}
