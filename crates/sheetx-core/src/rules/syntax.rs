//! Syntax checks for formulas and defined names

use crate::errors::{Result, SheetXError};
use crate::model::CellAddr;

/// Marker every formula must start with
pub const FORMULA_MARKER: char = '=';

/// Names the grid reserves for itself
const RESERVED_NAMES: &[&str] = &[
    "TRUE",
    "FALSE",
    "NULL",
    "R",
    "C",
    "PRINT_AREA",
    "PRINT_TITLES",
    "CRITERIA",
    "DATABASE",
    "EXTRACT",
    "CONSOLIDATE_AREA",
    "SHEET_TITLE",
];

/// Check formula shape without evaluating it
///
/// Parentheses inside double-quoted string literals are ignored; `""`
/// escapes a quote inside a literal.
///
/// # Errors
///
/// Returns `SheetXError::InvalidFormula` when the marker is missing, the
/// body is empty, a string literal is unterminated, or parentheses do not
/// balance.
pub fn check_formula(formula: &str) -> Result<()> {
    let invalid = |reason: &str| SheetXError::InvalidFormula {
        formula: formula.to_string(),
        reason: reason.to_string(),
    };

    let body = formula
        .strip_prefix(FORMULA_MARKER)
        .ok_or_else(|| invalid("must start with '='"))?;
    if body.trim().is_empty() {
        return Err(invalid("empty formula body"));
    }

    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_string) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
            }
            ('"', _) => in_string = !in_string,
            ('(', false) => depth += 1,
            (')', false) => {
                depth -= 1;
                if depth < 0 {
                    return Err(invalid("unexpected ')'"));
                }
            }
            _ => {}
        }
    }

    if in_string {
        return Err(invalid("unterminated string literal"));
    }
    if depth != 0 {
        return Err(invalid("unbalanced parentheses"));
    }
    Ok(())
}

/// Check a defined name
///
/// # Errors
///
/// Returns `SheetXError::InvalidNamedRange` for malformed names or names
/// that read as cell references, and `SheetXError::ReservedName` for
/// reserved words.
pub fn check_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| SheetXError::InvalidNamedRange {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("empty name")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_' || c == '\\') => {
            return Err(invalid("must start with a letter, '_' or '\\'"))
        }
        _ => {}
    }
    if name.len() > 255 {
        return Err(invalid("longer than 255 characters"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return Err(invalid("only letters, digits, '_' and '.' are allowed"));
    }

    let upper = name.to_ascii_uppercase();
    if RESERVED_NAMES.contains(&upper.as_str()) {
        return Err(SheetXError::ReservedName {
            name: name.to_string(),
        });
    }
    if upper.parse::<CellAddr>().is_ok() || is_r1c1(&upper) {
        return Err(invalid("reads as a cell reference"));
    }
    Ok(())
}

fn is_r1c1(upper: &str) -> bool {
    let Some(rest) = upper.strip_prefix('R') else {
        return false;
    };
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let Some(col) = rest[digits_end..].strip_prefix('C') else {
        return false;
    };
    col.chars().all(|c| c.is_ascii_digit())
}
