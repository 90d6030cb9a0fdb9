use indexmap::map::Entry;
use indexmap::IndexMap;

/// A decoded query-string value. Repeated keys (`?a=1&a=2`) arrive as `Many`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// The value the translator acts on; multi-valued keys use their first entry.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(s) => Some(s.as_str()),
            QueryValue::Many(values) => values.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = QueryValue::Many(vec![first, value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

/// Untrusted query parameters exactly as received from the client.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    values: IndexMap<String, QueryValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: &str) -> Self {
        url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect()
    }

    /// Adds a value; a key seen twice becomes multi-valued.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        match self.values.entry(key.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value.into()),
            Entry::Vacant(entry) => {
                entry.insert(QueryValue::Single(value.into()));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.values.get(key)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(QueryValue::first)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Leading-integer parse: optional whitespace and sign, then as many digits as
/// are present. `"12abc"` is 12, `"3.9"` is 3, `"abc"` is `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Whole-string numeric cast. Blank input is zero; anything that is not a
/// decimal literal (or `Infinity`) is NaN.
pub fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')) =>
        {
            s.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}
