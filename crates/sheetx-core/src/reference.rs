//! Advisory cross-check of metric values against external reference data
//!
//! Pure annotation: a check never raises and never blocks a commit.

use crate::config::ReferenceConfig;
use crate::model::{CellInput, Operation, SequencedOperation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time metric value from a reference data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceValue {
    pub source: String,
    pub category: String,
    pub value: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

impl ReferenceValue {
    pub fn new(source: impl Into<String>, category: impl Into<String>, value: f64, confidence: f64) -> Self {
        Self {
            source: source.into(),
            category: category.into(),
            value,
            confidence,
            unit: None,
            as_of: None,
        }
    }

    /// Provider data is usable only when attributed, finite and carrying a
    /// confidence in `[0, 1]`
    pub fn is_usable(&self) -> bool {
        !self.source.trim().is_empty()
            && !self.category.trim().is_empty()
            && self.value.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCheck {
    pub operation_index: u32,
    pub expected_value: f64,
    pub actual_value: f64,
    pub delta_pct: f64,
    pub within_tolerance: bool,
    pub confidence: f64,
    pub source: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMatcher {
    tolerance: f64,
    min_confidence: f64,
}

impl Default for ReferenceMatcher {
    fn default() -> Self {
        Self::new(&ReferenceConfig::default())
    }
}

impl ReferenceMatcher {
    pub fn new(config: &ReferenceConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            min_confidence: config.min_confidence,
        }
    }

    /// Compare a metric-tagged operation's value with `reference`
    ///
    /// Returns `None` when the operation is not a tagged numeric write or
    /// the reference is unusable.
    pub fn check(&self, op: &SequencedOperation, reference: &ReferenceValue) -> Option<ReferenceCheck> {
        let metric = op.metric.as_ref()?;
        if !reference.is_usable() {
            return None;
        }

        let actual = match &op.operation {
            Operation::CellWrite { value, .. } => numeric_input(value).or(metric.value)?,
            Operation::FormulaWrite { .. } => metric.value?,
            _ => return None,
        };
        if !actual.is_finite() {
            return None;
        }

        let expected = reference.value;
        let ratio = (actual - expected).abs() / expected.abs().max(1.0);
        let confident = reference.confidence >= self.min_confidence;

        Some(ReferenceCheck {
            operation_index: op.index,
            expected_value: expected,
            actual_value: actual,
            delta_pct: ratio * 100.0,
            within_tolerance: !confident || ratio <= self.tolerance,
            confidence: reference.confidence,
            source: reference.source.clone(),
            category: reference.category.clone(),
        })
    }
}

fn numeric_input(input: &CellInput) -> Option<f64> {
    match input {
        CellInput::Number(n) => Some(*n),
        CellInput::Text(s) => s.trim().parse().ok(),
        CellInput::Bool(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricTag;

    fn revenue_write(value: f64) -> SequencedOperation {
        SequencedOperation {
            index: 2,
            operation: Operation::CellWrite {
                sheet: "Sheet1".to_string(),
                cell: "B2".to_string(),
                value: CellInput::Number(value),
            },
            metric: Some(MetricTag {
                category: "revenue".to_string(),
                value: None,
            }),
        }
    }

    #[test]
    fn test_within_tolerance() {
        let matcher = ReferenceMatcher::default();
        let check = matcher
            .check(&revenue_write(101.0), &ReferenceValue::new("sec", "revenue", 100.0, 0.9))
            .unwrap();
        assert!(check.within_tolerance);
        assert!((check.delta_pct - 1.0).abs() < 1e-9);
        assert_eq!(check.operation_index, 2);
    }

    #[test]
    fn test_out_of_tolerance_when_confident() {
        let matcher = ReferenceMatcher::default();
        let check = matcher
            .check(&revenue_write(110.0), &ReferenceValue::new("sec", "revenue", 100.0, 0.9))
            .unwrap();
        assert!(!check.within_tolerance);
    }

    #[test]
    fn test_low_confidence_forces_within() {
        let matcher = ReferenceMatcher::default();
        let check = matcher
            .check(&revenue_write(200.0), &ReferenceValue::new("blog", "revenue", 100.0, 0.5))
            .unwrap();
        assert!(check.within_tolerance);
        assert!(check.delta_pct > 2.0);
    }

    #[test]
    fn test_small_expected_uses_unit_denominator() {
        let matcher = ReferenceMatcher::default();
        let check = matcher
            .check(&revenue_write(0.01), &ReferenceValue::new("sec", "revenue", 0.0, 1.0))
            .unwrap();
        assert!(check.within_tolerance);
    }

    #[test]
    fn test_untagged_operation_skipped() {
        let mut op = revenue_write(5.0);
        op.metric = None;
        let reference = ReferenceValue::new("sec", "revenue", 5.0, 1.0);
        assert!(ReferenceMatcher::default().check(&op, &reference).is_none());
    }

    #[test]
    fn test_unusable_reference_skipped() {
        let matcher = ReferenceMatcher::default();
        for reference in [
            ReferenceValue::new("", "revenue", 100.0, 0.9),
            ReferenceValue::new("sec", "revenue", f64::NAN, 0.9),
            ReferenceValue::new("sec", "revenue", 100.0, 1.5),
        ] {
            assert!(matcher.check(&revenue_write(100.0), &reference).is_none());
        }
    }

    #[test]
    fn test_formula_uses_tagged_value() {
        let op = SequencedOperation {
            index: 0,
            operation: Operation::FormulaWrite {
                sheet: "Sheet1".to_string(),
                cell: "B9".to_string(),
                formula: "=SUM(B2:B8)".to_string(),
            },
            metric: Some(MetricTag {
                category: "revenue".to_string(),
                value: Some(98.5),
            }),
        };
        let check = ReferenceMatcher::default()
            .check(&op, &ReferenceValue::new("sec", "revenue", 100.0, 0.8))
            .unwrap();
        assert_eq!(check.actual_value, 98.5);
        assert!(check.within_tolerance);
    }
}
