//! Scalar cell values shared by every stage of the merge pipeline.
//!
//! Source files deliver text, numbers, dates or nothing at all. [`Value`] keeps
//! that closed set explicit and owns the stringify/trim/number rules the
//! normalizer, merge engine and aggregations rely on.

use std::{fmt, sync::OnceLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Stringified form, or `None` for [`Value::Null`].
    pub fn as_display(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Stringified and trimmed form; `None` when the value is blank.
    pub fn trimmed(&self) -> Option<String> {
        let display = self.as_display()?;
        let trimmed = display.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(_) | Value::Date(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric reading used by statistics. Thousands separators are ignored;
    /// anything that is not a plain decimal numeral yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_numeric(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display().unwrap_or_default())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern compiles")
    })
}

pub fn parse_numeric(raw: &str) -> Option<f64> {
    let stripped = raw.trim().replace(',', "");
    if !decimal_pattern().is_match(&stripped) {
        return None;
    }
    stripped.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
