use std::fmt;

/// Upper bound on the size of a string built by `Text * Integer`.
const MAX_TEXT_BYTES: usize = 1 << 28;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Coefficients, highest degree first.
    Polynomial(Vec<Value>),
    /// No valid value. Produced instead of failing.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Float,
    Text,
    Polynomial,
    Unknown,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Text => "string",
            ValueType::Polynomial => "polynomial",
            ValueType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::Polynomial(_) => ValueType::Polynomial,
            Value::Unknown => ValueType::Unknown,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// A float, or a polynomial with at least one float coefficient.
    pub fn has_float(&self) -> bool {
        match self {
            Value::Float(_) => true,
            Value::Polynomial(coefficients) => coefficients.iter().any(Value::has_float),
            _ => false,
        }
    }

    /// Integer/integer stays integer (checked), anything mixed with a float
    /// is done in floating point. Overflow either way is `Unknown`.
    fn numeric(
        &self,
        other: &Value,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Option<Value> {
        match (self, other) {
            (Value::Integer(l), Value::Integer(r)) => Some(int_op(*l, *r).map_or(Value::Unknown, Value::Integer)),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                Some(finite(float_op(self.as_f64()?, other.as_f64()?)))
            }
            _ => None,
        }
    }

    pub fn plus(&self, other: &Value) -> Value {
        if let Some(result) = self.numeric(other, i64::checked_add, |l, r| l + r) {
            return result;
        }
        match (self, other) {
            (Value::Text(l), Value::Text(r)) => Value::Text(format!("{}{}", l, r)),
            (Value::Polynomial(l), Value::Polynomial(r)) => add_coefficients(l, r),
            _ => Value::Unknown,
        }
    }

    pub fn minus(&self, other: &Value) -> Value {
        self.numeric(other, i64::checked_sub, |l, r| l - r)
            .unwrap_or(Value::Unknown)
    }

    pub fn times(&self, other: &Value) -> Value {
        if let Some(result) = self.numeric(other, i64::checked_mul, |l, r| l * r) {
            return result;
        }
        match (self, other) {
            (Value::Text(text), Value::Integer(count)) => repeat(text, *count),
            _ => Value::Unknown,
        }
    }

    /// Evaluates a polynomial at `point` with Horner's rule. Floating point
    /// when the point or any coefficient is a float, checked integer
    /// arithmetic otherwise.
    pub fn evaluate_at(&self, point: &Value) -> Value {
        let Value::Polynomial(coefficients) = self else {
            return Value::Unknown;
        };
        if !point.is_numeric() || !coefficients.iter().all(Value::is_numeric) {
            return Value::Unknown;
        }

        let floating = point.has_float() || self.has_float();

        let result = if floating {
            point.as_f64().and_then(|x| {
                coefficients
                    .iter()
                    .try_fold(0.0, |acc, c| Some(acc * x + c.as_f64()?))
                    .map(finite)
            })
        } else {
            point.as_i64().and_then(|x| {
                coefficients
                    .iter()
                    .try_fold(0i64, |acc, c| acc.checked_mul(x)?.checked_add(c.as_i64()?))
                    .map(Value::Integer)
            })
        };

        result.unwrap_or(Value::Unknown)
    }
}

fn finite(value: f64) -> Value {
    if value.is_finite() {
        Value::Float(value)
    } else {
        Value::Unknown
    }
}

/// Coefficient-wise sum, aligned at the constant term.
fn add_coefficients(left: &[Value], right: &[Value]) -> Value {
    let (longer, shorter) = if left.len() >= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    let offset = longer.len() - shorter.len();

    let mut sum = Vec::with_capacity(longer.len());
    for (i, coefficient) in longer.iter().enumerate() {
        let value = match i.checked_sub(offset) {
            Some(j) => coefficient.plus(&shorter[j]),
            None => coefficient.clone(),
        };
        if value.is_unknown() {
            return Value::Unknown;
        }
        sum.push(value);
    }
    Value::Polynomial(sum)
}

fn repeat(text: &str, count: i64) -> Value {
    if count <= 0 {
        return Value::Text(String::new());
    }
    match usize::try_from(count)
        .ok()
        .and_then(|count| text.len().checked_mul(count))
    {
        Some(bytes) if bytes <= MAX_TEXT_BYTES => Value::Text(text.repeat(count as usize)),
        _ => Value::Unknown,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => {
                // Always show at least one decimal place for floats
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Text(s) => write!(f, "{}", s),
            Value::Polynomial(coefficients) => {
                write!(f, "{{ ")?;
                for (i, c) in coefficients.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, " }}")
            }
            Value::Unknown => write!(f, "unknown"),
        }
    }
}
