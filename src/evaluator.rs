use crate::ast::{BinaryOp, Node};
use crate::error::{Diagnostics, PolyError, Span};
use crate::value::{Value, ValueType};
use std::collections::HashMap;
use std::io::{self, Write};

/// Identifier bindings for one program run.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    values: HashMap<String, Value>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Binds `name`, replacing any earlier binding.
    pub fn assign(&mut self, name: &str, value: Value) {
        tracing::debug!(name, value = %value, "bind");
        self.values.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Tree-walking evaluator. Print output goes to `out`; runtime errors are
/// collected and evaluation carries on with `Value::Unknown`.
pub struct Evaluator<W: Write> {
    symbols: SymbolTable,
    /// Last type each identifier evaluated to.
    deduced_types: HashMap<String, ValueType>,
    diagnostics: Diagnostics,
    out: W,
}

impl<W: Write> Evaluator<W> {
    pub fn new(out: W) -> Self {
        Self {
            symbols: SymbolTable::new(),
            deduced_types: HashMap::new(),
            diagnostics: Diagnostics::new(),
            out,
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate_program(&mut self, program: &Node) -> io::Result<()> {
        for statement in program.statements() {
            self.evaluate(statement)?;
        }
        Ok(())
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn deduced_type(&self, name: &str) -> ValueType {
        self.deduced_types
            .get(name)
            .copied()
            .unwrap_or(ValueType::Unknown)
    }

    /// Static type of `node`, falling back to what identifiers were last seen
    /// holding.
    pub fn type_of(&self, node: &Node) -> ValueType {
        match node {
            Node::Identifier { name, .. } => self.deduced_type(name),
            other => other.value_type(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<PolyError> {
        self.diagnostics.take()
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Evaluates `node`, children first. Only a failing output sink is an
    /// `Err`; language-level problems become diagnostics and `Unknown`.
    pub fn evaluate(&mut self, node: &Node) -> io::Result<Value> {
        match node {
            Node::StatementList { .. } => {
                for statement in node.statements() {
                    self.evaluate(statement)?;
                }
                Ok(Value::Unknown)
            }
            Node::Set { name, expr, span } => {
                let value = self.evaluate(expr)?;
                if value.is_unknown() {
                    self.runtime_error(*span, format!("value assigned to '{}' is unknown", name));
                }
                self.symbols.assign(name, value.clone());
                Ok(value)
            }
            Node::Print { expr, span } => {
                let value = self.evaluate(expr)?;
                if value.is_unknown() {
                    self.runtime_error(*span, "cannot print an unknown value".to_string());
                } else {
                    writeln!(self.out, "{}", value)?;
                }
                Ok(value)
            }
            Node::Binary { .. } => self.evaluate_chain(node),
            Node::EvaluateAt { poly, point, span } => {
                let poly_val = self.evaluate(poly)?;
                let point_val = self.evaluate(point)?;
                Ok(self.evaluate_at(&poly_val, &point_val, span))
            }
            Node::Coefficients { coefficients, .. } => {
                let mut values = Vec::with_capacity(coefficients.len());
                for coefficient in coefficients {
                    values.push(self.evaluate(coefficient)?);
                }
                Ok(Value::Polynomial(values))
            }
            Node::IntLiteral { value, .. } => Ok(Value::Integer(*value)),
            Node::FloatLiteral { value, .. } => Ok(Value::Float(*value)),
            Node::StringLiteral { value, .. } => Ok(Value::Text(value.clone())),
            Node::Identifier { name, .. } => {
                // Use-before-set is the static checker's to report.
                let value = self.symbols.get(name).cloned().unwrap_or(Value::Unknown);
                self.deduced_types.insert(name.clone(), value.value_type());
                Ok(value)
            }
        }
    }

    /// Evaluates a right-nested operator chain such as `a + (b - (c * d))`
    /// without recursing down its right spine: operands left to right, then
    /// the operators innermost first.
    fn evaluate_chain(&mut self, node: &Node) -> io::Result<Value> {
        let mut links = Vec::new();
        let mut tail = node;
        while let Node::Binary {
            left,
            operator,
            right,
            span,
        } = tail
        {
            links.push((self.evaluate(left)?, *operator, span));
            tail = &**right;
        }

        let mut result = self.evaluate(tail)?;
        while let Some((left, operator, span)) = links.pop() {
            result = self.evaluate_binary_op(operator, &left, &result, span);
        }
        Ok(result)
    }

    fn evaluate_binary_op(
        &mut self,
        operator: BinaryOp,
        left: &Value,
        right: &Value,
        span: &Span,
    ) -> Value {
        let result = match operator {
            BinaryOp::Plus => left.plus(right),
            BinaryOp::Minus => left.minus(right),
            BinaryOp::Times => left.times(right),
        };

        // An unknown operand was already reported where it came from.
        if result.is_unknown() && !left.is_unknown() && !right.is_unknown() {
            let message = match (left, right) {
                (Value::Integer(_), Value::Integer(_)) => {
                    format!("integer overflow in '{}'", operator.symbol())
                }
                (l, r) if l.is_numeric() && r.is_numeric() => {
                    format!("float overflow in '{}'", operator.symbol())
                }
                (Value::Polynomial(_), Value::Polynomial(_)) if operator == BinaryOp::Plus => {
                    format!("coefficient overflow in '{}'", operator.symbol())
                }
                (Value::Text(_), Value::Integer(_)) if operator == BinaryOp::Times => {
                    format!("repeated string too long in '{}'", operator.symbol())
                }
                _ => format!(
                    "type mismatch: cannot apply '{}' to {} and {}",
                    operator.symbol(),
                    left.type_name(),
                    right.type_name()
                ),
            };
            self.runtime_error(*span, message);
        }

        result
    }

    fn evaluate_at(&mut self, poly: &Value, point: &Value, span: &Span) -> Value {
        if poly.is_unknown() || point.is_unknown() {
            return Value::Unknown;
        }
        if !matches!(poly, Value::Polynomial(_)) {
            self.runtime_error(
                *span,
                format!("cannot evaluate {} at a point, polynomial required", poly.type_name()),
            );
            return Value::Unknown;
        }
        if !point.is_numeric() {
            self.runtime_error(
                *span,
                format!("evaluation point must be numeric, found {}", point.type_name()),
            );
            return Value::Unknown;
        }

        let result = poly.evaluate_at(point);
        if result.is_unknown() {
            let kind = if poly.has_float() || point.has_float() {
                "float"
            } else {
                "integer"
            };
            self.runtime_error(*span, format!("{} overflow evaluating polynomial", kind));
        }
        result
    }

    fn runtime_error(&mut self, span: Span, message: String) {
        self.diagnostics.report(PolyError::runtime_error(span, message));
    }
}
