use crate::ast::{BinaryOp, Node};
use crate::error::{Diagnostics, PolyError};
use crate::lexer::{LexError, Token, TokenKind};
use crate::token_stream::TokenStream;

/// Recursive-descent parser, one method per grammar rule:
///
/// ```text
/// Program   := { Statement }
/// Statement := "set" Identifier Expr ";" | "print" Expr ";"
/// Expr      := Term { ("+" | "-") Expr }
/// Term      := Primary [ "*" Term ]
/// Primary   := IntLiteral | FloatLiteral | StringLiteral | "(" Expr ")" | Poly
/// Poly      := "{" Coeffs "}" [ "[" Expr "]" ] | Identifier [ "[" Expr "]" ]
/// Coeffs    := Coeff { "," Coeff }
/// ```
///
/// `+`, `-` and `*` associate to the right. Operator chains are parsed in a
/// loop, so only parentheses and brackets add to the call depth.
pub struct Parser {
    tokens: TokenStream,
    diagnostics: Diagnostics,
    /// Open parentheses and brackets around the current position.
    depth: usize,
}

/// Deepest nesting of parentheses and brackets accepted.
pub const MAX_NESTING: usize = 128;

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            tokens: TokenStream::new(source),
            diagnostics: Diagnostics::new(),
            depth: 0,
        }
    }

    /// Parses the whole input. A statement that fails is reported once and
    /// skipped; `None` means no statement parsed at all.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(&mut self) -> Option<Node> {
        let mut statements = Vec::new();

        loop {
            match self.statement() {
                Ok(Some(statement)) => statements.push(statement),
                Ok(None) => break,
                Err(error) => {
                    self.diagnostics.report(error);
                    self.synchronize();
                }
            }
        }

        tracing::debug!(
            statements = statements.len(),
            errors = self.diagnostics.len(),
            "parse finished"
        );
        Node::statement_list(statements)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<PolyError> {
        self.diagnostics.take()
    }

    /// `Ok(None)` at end of input.
    fn statement(&mut self) -> Result<Option<Node>, PolyError> {
        let command = self.advance()?;

        match command.kind {
            TokenKind::EndOfInput => Ok(None),
            TokenKind::KeywordSet => self.set_statement(command).map(Some),
            TokenKind::KeywordPrint => self.print_statement(command).map(Some),
            _ => {
                let error = PolyError::parse_error_with_help(
                    command.span,
                    format!("invalid statement, found {}", command.describe()),
                    "Statements start with 'set' or 'print'. Example: set x 5; print x;".to_string(),
                );
                Err(self.reject(command, error))
            }
        }
    }

    fn set_statement(&mut self, keyword: Token) -> Result<Node, PolyError> {
        let name = self.consume_with_help(
            TokenKind::Identifier,
            "identifier required after 'set'",
            "A set statement names the identifier to bind: set x 5;".to_string(),
        )?;
        let expr = self.expression()?;
        let end = self.end_of_statement()?;

        Ok(Node::Set {
            name: name.lexeme,
            expr: Box::new(expr),
            span: keyword.span.to(&end.span),
        })
    }

    fn print_statement(&mut self, keyword: Token) -> Result<Node, PolyError> {
        let expr = self.expression()?;
        let end = self.end_of_statement()?;

        Ok(Node::Print {
            expr: Box::new(expr),
            span: keyword.span.to(&end.span),
        })
    }

    fn end_of_statement(&mut self) -> Result<Token, PolyError> {
        let token = self.advance()?;
        if token.is(TokenKind::Semicolon) {
            return Ok(token);
        }

        let negative_literal = matches!(token.kind, TokenKind::IntLiteral | TokenKind::FloatLiteral)
            && token.lexeme.starts_with('-');
        let message = format!("semicolon required, found {}", token.describe());
        let error = if negative_literal {
            PolyError::parse_error_with_help(
                token.span,
                message,
                "A '-' written directly before a digit is part of the number. Put a space after '-' to subtract: 5 - 3".to_string(),
            )
        } else {
            PolyError::parse_error(token.span, message)
        };
        Err(self.reject(token, error))
    }

    fn expression(&mut self) -> Result<Node, PolyError> {
        let first = self.term()?;
        let mut rest = Vec::new();

        loop {
            let operator_token = self.tokens.get();
            let operator = match operator_token.kind {
                TokenKind::Plus => BinaryOp::Plus,
                TokenKind::Minus => BinaryOp::Minus,
                _ => {
                    self.tokens.put_back(operator_token);
                    break;
                }
            };
            self.operand(&operator_token)?;
            rest.push((operator, self.term()?));
        }

        Ok(fold_right(first, rest))
    }

    fn term(&mut self) -> Result<Node, PolyError> {
        let first = self.primary()?;
        let mut rest = Vec::new();

        loop {
            let operator_token = self.tokens.get();
            if !operator_token.is(TokenKind::Star) {
                self.tokens.put_back(operator_token);
                break;
            }
            self.operand(&operator_token)?;
            rest.push((BinaryOp::Times, self.primary()?));
        }

        Ok(fold_right(first, rest))
    }

    fn primary(&mut self) -> Result<Node, PolyError> {
        let token = self.advance()?;

        match token.kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => number(token),
            TokenKind::StringLiteral => {
                let value = token.lexeme[1..token.lexeme.len() - 1].to_string();
                Ok(Node::StringLiteral {
                    value,
                    span: token.span,
                })
            }
            TokenKind::LParen => {
                let expr = self.nested(&token, Self::expression)?;
                self.consume_with_help(
                    TokenKind::RParen,
                    "')' required after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'.".to_string(),
                )?;
                Ok(expr)
            }
            TokenKind::LBrace | TokenKind::Identifier => {
                self.tokens.put_back(token);
                self.poly()
            }
            _ => {
                let help_msg = match token.kind {
                    TokenKind::RParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
                    TokenKind::RBrace => "Found '}' without matching '{'. Check for unbalanced braces.",
                    TokenKind::RBracket => "Found ']' without matching '['. Check for unbalanced brackets.",
                    TokenKind::EndOfInput => "Reached end of input while expecting an expression.",
                    TokenKind::Semicolon => "The statement ended before its expression.",
                    _ => "Expected a literal, identifier, polynomial or parenthesized expression here.",
                };

                let error = PolyError::parse_error_with_help(
                    token.span,
                    format!("primary expression expected, found {}", token.describe()),
                    help_msg.to_string(),
                );
                Err(self.reject(token, error))
            }
        }
    }

    fn poly(&mut self) -> Result<Node, PolyError> {
        let token = self.advance()?;

        let base = match token.kind {
            TokenKind::LBrace => {
                let coefficients = self.coefficients()?;
                let end = self.consume_with_help(
                    TokenKind::RBrace,
                    "'}' required after coefficients",
                    "Coefficient lists are closed with '}'. Example: {1, 0, -2}".to_string(),
                )?;
                Node::Coefficients {
                    coefficients,
                    span: token.span.to(&end.span),
                }
            }
            TokenKind::Identifier => Node::Identifier {
                name: token.lexeme,
                span: token.span,
            },
            _ => {
                let error = PolyError::parse_error(
                    token.span,
                    format!("polynomial expected, found {}", token.describe()),
                );
                return Err(self.reject(token, error));
            }
        };

        let bracket = self.tokens.get();
        if !bracket.is(TokenKind::LBracket) {
            self.tokens.put_back(bracket);
            return Ok(base);
        }

        let point = self.nested(&bracket, Self::expression)?;
        let end = self.consume_with_help(
            TokenKind::RBracket,
            "']' required after evaluation point",
            "Evaluation points are written in square brackets: {1, 2}[3]".to_string(),
        )?;
        let span = base.span().to(&end.span);

        Ok(Node::EvaluateAt {
            poly: Box::new(base),
            point: Box::new(point),
            span,
        })
    }

    fn coefficients(&mut self) -> Result<Vec<Node>, PolyError> {
        let first = self.advance()?;
        if !matches!(first.kind, TokenKind::IntLiteral | TokenKind::FloatLiteral) {
            let error = PolyError::parse_error_with_help(
                first.span,
                format!("coefficients required between braces, found {}", first.describe()),
                "A polynomial lists at least one integer or float coefficient: {1, 0, -2}".to_string(),
            );
            return Err(self.reject(first, error));
        }
        let mut coefficients = vec![number(first)?];

        loop {
            let comma = self.tokens.get();
            if !comma.is(TokenKind::Comma) {
                self.tokens.put_back(comma);
                break;
            }

            let next = self.advance()?;
            if !matches!(next.kind, TokenKind::IntLiteral | TokenKind::FloatLiteral) {
                let error = PolyError::parse_error(
                    next.span,
                    format!("coefficient required after ',', found {}", next.describe()),
                );
                return Err(self.reject(next, error));
            }
            coefficients.push(number(next)?);
        }

        Ok(coefficients)
    }

    /// Next token, with lexical errors turned into diagnostics.
    fn advance(&mut self) -> Result<Token, PolyError> {
        let token = self.tokens.get();
        if token.is(TokenKind::Error) {
            return Err(lex_diagnostic(&token));
        }
        Ok(token)
    }

    fn consume_with_help(
        &mut self,
        kind: TokenKind,
        message: &str,
        help: String,
    ) -> Result<Token, PolyError> {
        let token = self.advance()?;
        if token.is(kind) {
            Ok(token)
        } else {
            let error = PolyError::parse_error_with_help(
                token.span,
                format!("{}, found {}", message, token.describe()),
                help,
            );
            Err(self.reject(token, error))
        }
    }

    /// Checks that the token after a binary operator can start an operand.
    fn operand(&mut self, operator: &Token) -> Result<(), PolyError> {
        let next = self.advance()?;
        let starts_operand = matches!(
            next.kind,
            TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::StringLiteral
                | TokenKind::Identifier
                | TokenKind::LParen
                | TokenKind::LBrace
        );
        if starts_operand {
            self.tokens.put_back(next);
            return Ok(());
        }

        let error = PolyError::parse_error_with_help(
            next.span,
            format!("expression required after '{}'", operator.lexeme),
            format!(
                "'{}' needs an expression on both sides, found {}.",
                operator.lexeme,
                next.describe()
            ),
        );
        Err(self.reject(next, error))
    }

    /// Runs `rule` one nesting level deeper, refusing past `MAX_NESTING`.
    fn nested(
        &mut self,
        open: &Token,
        rule: fn(&mut Self) -> Result<Node, PolyError>,
    ) -> Result<Node, PolyError> {
        if self.depth >= MAX_NESTING {
            return Err(PolyError::parse_error(
                open.span,
                format!("expression nested too deeply, more than {} levels", MAX_NESTING),
            ));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// Returns `token` to the stream so resynchronization sees it, and passes
    /// the error through.
    fn reject(&mut self, token: Token, error: PolyError) -> PolyError {
        self.tokens.put_back(token);
        error
    }

    /// Skips the rest of a failed statement: through the next `;`, or up to
    /// the next statement keyword or end of input. Lexical errors among the
    /// skipped tokens are still reported.
    fn synchronize(&mut self) {
        let mut skipped = 0usize;
        loop {
            let token = self.tokens.get();
            match token.kind {
                TokenKind::Semicolon => break,
                TokenKind::EndOfInput | TokenKind::KeywordSet | TokenKind::KeywordPrint => {
                    self.tokens.put_back(token);
                    break;
                }
                TokenKind::Error => self.diagnostics.report(lex_diagnostic(&token)),
                _ => skipped += 1,
            }
        }
        tracing::debug!(skipped, line = self.tokens.line(), "resynchronized");
    }
}

/// Builds the right-nested tree for `first op1 t1 op2 t2 ...`, i.e.
/// `first op1 (t1 op2 (...))`.
fn fold_right(first: Node, rest: Vec<(BinaryOp, Node)>) -> Node {
    let mut rest = rest.into_iter().rev();
    let Some((mut operator, mut tree)) = rest.next() else {
        return first;
    };
    for (previous, left) in rest {
        tree = binary(left, operator, tree);
        operator = previous;
    }
    binary(first, operator, tree)
}

fn binary(left: Node, operator: BinaryOp, right: Node) -> Node {
    let span = left.span().to(right.span());
    Node::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}

fn lex_diagnostic(token: &Token) -> PolyError {
    let reason = token.error.unwrap_or(LexError::UnexpectedEndOfInput);
    PolyError::lex_error(token.span, reason.to_string())
}

/// Converts a numeric literal token. Out-of-range text is a diagnostic,
/// never a panic.
fn number(token: Token) -> Result<Node, PolyError> {
    if token.is(TokenKind::IntLiteral) {
        let value = token.lexeme.parse::<i64>().map_err(|_| {
            PolyError::parse_error(
                token.span,
                format!("integer literal {} out of range", token.lexeme),
            )
        })?;
        Ok(Node::IntLiteral {
            value,
            span: token.span,
        })
    } else {
        let value = token
            .lexeme
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                PolyError::parse_error(
                    token.span,
                    format!("float literal {} out of range", token.lexeme),
                )
            })?;
        Ok(Node::FloatLiteral {
            value,
            span: token.span,
        })
    }
}
