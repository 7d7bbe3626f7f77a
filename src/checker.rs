use crate::ast::Node;
use crate::error::{Diagnostics, PolyError};
use std::collections::HashMap;

/// Use-before-set analysis. One pass, every offending use reported.
///
/// The map survives between calls to `check`, so an interactive session
/// remembers what earlier lines defined.
#[derive(Debug, Default)]
pub struct StaticChecker {
    defined: HashMap<String, bool>,
    diagnostics: Diagnostics,
}

impl StaticChecker {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn check(&mut self, program: &Node) {
        for statement in program.statements() {
            self.check_node(statement);
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.get(name).copied().unwrap_or(false)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<PolyError> {
        self.diagnostics.take()
    }

    fn check_node(&mut self, node: &Node) {
        match node {
            Node::StatementList { .. } => {
                for statement in node.statements() {
                    self.check_node(statement);
                }
            }
            Node::Set { name, expr, .. } => {
                // The value is checked before the name counts as defined.
                self.check_node(expr);
                self.defined.insert(name.clone(), true);
            }
            Node::Print { expr, .. } => self.check_node(expr),
            Node::Binary { .. } => {
                // Walk the right spine of an operator chain in a loop.
                let mut tail = node;
                while let Node::Binary { left, right, .. } = tail {
                    self.check_node(left);
                    tail = &**right;
                }
                self.check_node(tail);
            }
            Node::EvaluateAt { poly, point, .. } => {
                self.check_node(poly);
                self.check_node(point);
            }
            Node::Coefficients { coefficients, .. } => {
                for coefficient in coefficients {
                    self.check_node(coefficient);
                }
            }
            Node::Identifier { name, span } => {
                if !self.is_defined(name) {
                    self.diagnostics.report(PolyError::static_error(
                        *span,
                        format!("identifier used before set: {}", name),
                    ));
                }
            }
            Node::IntLiteral { .. } | Node::FloatLiteral { .. } | Node::StringLiteral { .. } => {}
        }
    }
}
