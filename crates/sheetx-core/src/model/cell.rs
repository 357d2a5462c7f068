use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal content of a cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Presentation attributes of a cell
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }

    /// True when the number format expects numeric content
    pub fn is_numeric(&self) -> bool {
        self.number_format
            .as_deref()
            .is_some_and(is_numeric_format)
    }
}

/// Whether a number format code renders numbers (as opposed to `@` text)
pub fn is_numeric_format(code: &str) -> bool {
    let code = code.trim();
    !code.is_empty()
        && !code.eq_ignore_ascii_case("general")
        && code != "@"
        && code.contains(['0', '#', '%', '?'])
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text, stored verbatim; never evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "CellStyle::is_default")]
    pub style: CellStyle,
}

impl Cell {
    pub fn with_value(value: CellValue) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    pub fn with_formula(formula: impl Into<String>) -> Self {
        Self {
            formula: Some(formula.into()),
            ..Default::default()
        }
    }

    /// A cell with nothing worth storing
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.formula.is_none() && self.style.is_default()
    }
}
