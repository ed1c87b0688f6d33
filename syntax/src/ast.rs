use std::fmt;

/// Location of a statement in its template: 1-based line, 0-based byte
/// offset within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub offset: usize,
}

impl Pos {
    pub fn new(line: usize, offset: usize) -> Self {
        Pos { line, offset }
    }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Target of `{% extends %}`, if the template declares one.
    pub parent: Option<Expr>,
    pub body: Body,
}

/// An ordered list of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub nodes: Vec<Node>,
}

impl Body {
    pub fn new(nodes: Vec<Node>) -> Self {
        Body { nodes }
    }

    pub fn empty() -> Self {
        Body { nodes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal template text, written verbatim.
    Text { data: String, pos: Pos },
    /// `{{ expr }}`
    Print { expr: Expr, pos: Pos },
    /// `{% block name %}…{% endblock %}`
    Block { name: String, body: Body, pos: Pos },
    /// `{% for [key,] val in iterable %}…{% endfor %}`
    For {
        key: Option<String>,
        val: String,
        iterable: Expr,
        body: Body,
        pos: Pos,
    },
    /// `{% if cond %}…{% else %}…{% endif %}`. An `elseif` arrives as a
    /// nested `If` that is the sole node of `alternate`.
    If {
        cond: Expr,
        body: Body,
        alternate: Body,
        pos: Pos,
    },
    /// `{% include target %}`
    Include { target: Expr, pos: Pos },
}

impl Node {
    pub fn pos(&self) -> Pos {
        match self {
            Node::Text { pos, .. }
            | Node::Print { pos, .. }
            | Node::Block { pos, .. }
            | Node::For { pos, .. }
            | Node::If { pos, .. }
            | Node::Include { pos, .. } => *pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    And,
    Or,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Concat => "~",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        };
        f.write_str(op)
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare identifier: a loop variable or a context entry.
    Name(String),
    StringLiteral(String),
    /// `base.attr`, `base[attr]` or, with arguments, `base.attr(args)`.
    GetAttr {
        base: Box<Expr>,
        attr: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `name(args)`
    FuncCall { name: String, args: Vec<Expr> },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// The literal text when this is a string literal.
    pub fn as_static_str(&self) -> Option<&str> {
        match self {
            Expr::StringLiteral(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(name) => f.write_str(name),
            Expr::StringLiteral(s) => write!(f, "{:?}", s),
            Expr::GetAttr { base, attr, args } => {
                match attr.as_ref() {
                    Expr::StringLiteral(name) => write!(f, "{}.{}", base, name)?,
                    other => write!(f, "{}[{}]", base, other)?,
                }
                if !args.is_empty() {
                    write_args(f, args)?;
                }
                Ok(())
            }
            Expr::FuncCall { name, args } => {
                f.write_str(name)?;
                write_args(f, args)
            }
            Expr::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    write!(f, "(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, ")")
}
