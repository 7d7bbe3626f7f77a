use crate::error::Span;
use crate::value::ValueType;

/// A program is a chain of `StatementList` nodes: each holds one statement
/// and the rest of the program.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    StatementList {
        statement: Box<Node>,
        rest: Option<Box<Node>>,
        span: Span,
    },
    Set {
        name: String,
        expr: Box<Node>,
        span: Span,
    },
    Print {
        expr: Box<Node>,
        span: Span,
    },
    Binary {
        left: Box<Node>,
        operator: BinaryOp,
        right: Box<Node>,
        span: Span,
    },
    /// `poly[point]`
    EvaluateAt {
        poly: Box<Node>,
        point: Box<Node>,
        span: Span,
    },
    /// `{c0, c1, ...}`, highest degree first.
    Coefficients {
        coefficients: Vec<Node>,
        span: Span,
    },
    IntLiteral {
        value: i64,
        span: Span,
    },
    FloatLiteral {
        value: f64,
        span: Span,
    },
    StringLiteral {
        value: String,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
        }
    }
}

impl Node {
    /// Links statements into a `StatementList` chain, first statement at the
    /// root. `None` for an empty program.
    pub fn statement_list(statements: Vec<Node>) -> Option<Node> {
        statements.into_iter().rev().fold(None, |rest, statement| {
            let span = *statement.span();
            Some(Node::StatementList {
                statement: Box::new(statement),
                rest: rest.map(Box::new),
                span,
            })
        })
    }

    /// Statements of a `StatementList` chain in program order. Any other node
    /// is treated as a single statement.
    pub fn statements(&self) -> Statements<'_> {
        Statements { next: Some(self) }
    }

    pub fn span(&self) -> &Span {
        match self {
            Node::StatementList { span, .. } => span,
            Node::Set { span, .. } => span,
            Node::Print { span, .. } => span,
            Node::Binary { span, .. } => span,
            Node::EvaluateAt { span, .. } => span,
            Node::Coefficients { span, .. } => span,
            Node::IntLiteral { span, .. } => span,
            Node::FloatLiteral { span, .. } => span,
            Node::StringLiteral { span, .. } => span,
            Node::Identifier { span, .. } => span,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }

    /// Type known without running anything. Identifiers are not known until
    /// run time.
    pub fn value_type(&self) -> ValueType {
        match self {
            Node::IntLiteral { .. } => ValueType::Integer,
            Node::FloatLiteral { .. } => ValueType::Float,
            Node::StringLiteral { .. } => ValueType::Text,
            Node::Coefficients { .. } => ValueType::Polynomial,
            _ => ValueType::Unknown,
        }
    }
}

pub struct Statements<'a> {
    next: Option<&'a Node>,
}

impl<'a> Iterator for Statements<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.next.take()?;
        match node {
            Node::StatementList { statement, rest, .. } => {
                self.next = rest.as_deref();
                Some(&**statement)
            }
            other => Some(other),
        }
    }
}

impl Node {
    /// Moves every boxed child into `pending`, leaving cheap placeholders.
    fn detach_children(&mut self, pending: &mut Vec<Node>) {
        let mut detach = |child: &mut Node| {
            let span = *child.span();
            pending.push(std::mem::replace(child, Node::IntLiteral { value: 0, span }));
        };

        match self {
            Node::StatementList { statement, rest, .. } => {
                detach(&mut **statement);
                if let Some(rest) = rest {
                    detach(&mut **rest);
                }
            }
            Node::Set { expr, .. } | Node::Print { expr, .. } => detach(&mut **expr),
            Node::Binary { left, right, .. } => {
                detach(&mut **left);
                detach(&mut **right);
            }
            Node::EvaluateAt { poly, point, .. } => {
                detach(&mut **poly);
                detach(&mut **point);
            }
            Node::Coefficients { .. }
            | Node::IntLiteral { .. }
            | Node::FloatLiteral { .. }
            | Node::StringLiteral { .. }
            | Node::Identifier { .. } => {}
        }
    }
}

impl Drop for Node {
    // Tears the tree down with an explicit work list; statement chains and
    // operator chains are as long as the program, too deep to drop
    // recursively.
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}
