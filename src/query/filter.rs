use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use super::params::{parse_number, QueryParams};
use super::types::{FieldRef, FilterOp, FilterValue};

/// How a raw query-string value is coerced before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    Number,
    /// Only the literal `"true"` is true.
    Boolean,
}

impl ValueType {
    pub fn coerce(&self, raw: &str) -> FilterValue {
        match self {
            ValueType::String => FilterValue::Text(raw.to_string()),
            ValueType::Number => FilterValue::Number(parse_number(raw)),
            ValueType::Boolean => FilterValue::Bool(raw == "true"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterTarget {
    /// A single field; `None` means the query key itself names the field.
    Field(Option<String>),
    /// Search several fields at once, joined with OR.
    AnyOf(Vec<String>),
}

/// Endpoint-authored declaration of how one query key becomes a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    pub target: FilterTarget,
    pub operator: FilterOp,
    pub value_type: ValueType,
}

impl FilterRule {
    pub fn new(operator: FilterOp) -> Self {
        Self { target: FilterTarget::Field(None), operator, value_type: ValueType::String }
    }

    pub fn eq() -> Self {
        Self::new(FilterOp::Eq)
    }

    pub fn any_of<I, S>(fields: I, operator: FilterOp) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: FilterTarget::AnyOf(fields.into_iter().map(Into::into).collect()),
            operator,
            value_type: ValueType::String,
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.target = FilterTarget::Field(Some(field.into()));
        self
    }

    pub fn number(mut self) -> Self {
        self.value_type = ValueType::Number;
        self
    }

    pub fn boolean(mut self) -> Self {
        self.value_type = ValueType::Boolean;
        self
    }
}

/// Ordered set of accepted query keys. Keys not declared here never filter.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    rules: IndexMap<String, FilterRule>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, key: impl Into<String>, rule: FilterRule) -> Self {
        self.rules.insert(key.into(), rule);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: FieldRef,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// Resolved where-clause: per-field conditions (ANDed) plus one OR group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub fields: IndexMap<FieldRef, IndexMap<FilterOp, FilterValue>>,
    pub any_of: Vec<Predicate>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.any_of.is_empty()
    }

    /// Conditions recorded for a field, addressed as `column` or `alias.column`.
    pub fn conditions(&self, field: &str) -> Option<&IndexMap<FilterOp, FilterValue>> {
        self.fields.get(&FieldRef::parse(field))
    }

    /// Every field reference this filter touches, in order of first appearance.
    pub fn field_refs(&self) -> impl Iterator<Item = &FieldRef> {
        self.fields.keys().chain(self.any_of.iter().map(|p| &p.field))
    }

    /// ORM-style JSON rendering (`{"price": {"$gte": 10}, "$or": [...]}`), used for logging.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (field, conditions) in &self.fields {
            let ops: Map<String, Value> = conditions
                .iter()
                .map(|(op, value)| (op.as_str().to_string(), value_json(value)))
                .collect();
            out.insert(field.to_string(), Value::Object(ops));
        }
        if !self.any_of.is_empty() {
            let group: Vec<Value> = self
                .any_of
                .iter()
                .map(|p| json!({ p.field.to_string(): { p.op.as_str(): value_json(&p.value) } }))
                .collect();
            out.insert("$or".to_string(), Value::Array(group));
        }
        Value::Object(out)
    }
}

fn value_json(value: &FilterValue) -> Value {
    match value {
        FilterValue::Text(s) => Value::String(s.clone()),
        FilterValue::Bool(b) => Value::Bool(*b),
        FilterValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
    }
}

/// Build the where-clause for the keys declared in `config`.
///
/// Missing and empty values are skipped. Multi-field rules append "contains"
/// predicates to the OR group; single-field rules coerce the value and merge
/// into that field's existing conditions so two rules may bound one column.
pub fn resolve_filters(query: &QueryParams, config: &FilterConfig) -> FilterSpec {
    let mut spec = FilterSpec::default();

    for (key, rule) in config.iter() {
        let Some(raw) = query.first(key).filter(|v| !v.is_empty()) else {
            continue;
        };

        match &rule.target {
            FilterTarget::AnyOf(fields) => {
                spec.any_of.extend(fields.iter().map(|field| Predicate {
                    field: FieldRef::parse(field),
                    op: rule.operator,
                    value: FilterValue::Text(format!("%{}%", raw)),
                }));
            }
            FilterTarget::Field(field) => {
                let value = rule.value_type.coerce(raw);
                let value = if rule.operator.is_like() {
                    FilterValue::Text(format!("%{}%", value))
                } else {
                    value
                };
                let field = FieldRef::parse(field.as_deref().unwrap_or(key));
                spec.fields.entry(field).or_default().insert(rule.operator, value);
            }
        }
    }

    spec
}
