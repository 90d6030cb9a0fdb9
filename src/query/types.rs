use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operators a filter rule may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,
}

impl FilterOp {
    /// LIKE-family operators get their value wrapped in `%...%`.
    pub fn is_like(&self) -> bool {
        matches!(self, FilterOp::Like | FilterOp::ILike)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Ne => "$ne",
            FilterOp::Gt => "$gt",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
            FilterOp::Lte => "$lte",
            FilterOp::Like => "$like",
            FilterOp::ILike => "$ilike",
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Like => "LIKE",
            FilterOp::ILike => "ILIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive `ASC` / `DESC`; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Reference to a filterable field, either a column of the queried entity or
/// a column reached through one of its associations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub association: Option<String>,
    pub column: String,
}

impl FieldRef {
    pub fn column(column: impl Into<String>) -> Self {
        Self { association: None, column: column.into() }
    }

    pub fn nested(association: impl Into<String>, column: impl Into<String>) -> Self {
        Self { association: Some(association.into()), column: column.into() }
    }

    /// Accepts `column`, `alias.column` and the already-wrapped `$alias.column$` form.
    pub fn parse(raw: &str) -> Self {
        let inner = raw
            .strip_prefix('$')
            .and_then(|s| s.strip_suffix('$'))
            .unwrap_or(raw);
        match inner.split_once('.') {
            Some((association, column)) => Self::nested(association, column),
            None => Self::column(inner),
        }
    }

    pub fn is_nested(&self) -> bool {
        self.association.is_some()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.association {
            Some(association) => write!(f, "${}.{}$", association, self.column),
            None => f.write_str(&self.column),
        }
    }
}

/// A filter operand after type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

/// Renders a number the way a query-string client would have typed it:
/// integral values without a fractional part, `NaN` and `Infinity` spelled out.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Bind parameter produced by statement rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
