use chrono::{DateTime, SecondsFormat, Utc};

/// A literal compared against an attribute in a criteria rule.
///
/// Literals arrive from the wire as JSON strings, numbers, or booleans and
/// are rewritten by the coercion stage into the type the schema declares.
/// The integer/float distinction is preserved, and dates only ever appear
/// after coercion.
///
/// # Examples
///
/// ```
/// use rules_query::Literal;
///
/// let wire = Literal::String("100".to_string());
/// let number = Literal::Integer(100);
/// let flag = Literal::Boolean(true);
///
/// assert_eq!(wire.type_name(), "string");
/// assert_eq!(number.type_name(), "integer");
/// assert_eq!(flag.type_name(), "boolean");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// JSON boolean (true/false)
    Boolean(bool),

    /// Whole number (preserved separately from floats)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string
    String(String),

    /// UTC instant, produced by coercing a `date-time` string
    Date(DateTime<Utc>),
}

impl Literal {
    /// Human-readable type name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Boolean(_) => "boolean",
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::Date(_) => "date",
        }
    }

    /// Get as string (concatenation)
    pub fn as_string(&self) -> String {
        match self {
            Literal::String(s) => s.clone(),
            Literal::Float(n) => n.to_string(),
            Literal::Integer(n) => n.to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Date(d) => format_date(d),
        }
    }

    /// Convert a JSON scalar into a literal.
    ///
    /// Returns `None` for null, arrays, and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Literal> {
        match value {
            serde_json::Value::Bool(b) => Some(Literal::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Literal::Integer(i)),
                None => n.as_f64().map(Literal::Float),
            },
            serde_json::Value::String(s) => Some(Literal::String(s.clone())),
            _ => None,
        }
    }

    /// Plain JSON rendering. Dates become ISO-8601 strings; non-finite floats
    /// become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Literal::Boolean(b) => serde_json::Value::Bool(*b),
            Literal::Integer(i) => serde_json::Value::Number((*i).into()),
            Literal::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Literal::String(s) => serde_json::Value::String(s.clone()),
            Literal::Date(d) => serde_json::Value::String(format_date(d)),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "\"{}\"", s),
            other => write!(f, "{}", other.as_string()),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Integer(n)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Float(n)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

/// `YYYY-MM-DDTHH:mm:ss.sssZ`, the only date shape the compiler reads or writes.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
