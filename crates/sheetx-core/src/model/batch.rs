use crate::model::operation::Operation;
use crate::reference::ReferenceValue;
use serde::{Deserialize, Serialize};
use sheetx_core_types::WorkbookId;
use std::collections::{BTreeMap, BTreeSet};

/// Marks an operation's target as a financial metric
///
/// `value` is the numeric outcome the instruction source expects; it is
/// needed for formula targets since formulas are never evaluated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTag {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Operation plus its position in the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedOperation {
    pub index: u32,
    #[serde(flatten)]
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricTag>,
}

/// Ordered set of operations submitted together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workbook_id: Option<WorkbookId>,
    pub operations: Vec<SequencedOperation>,
    /// Reference values for advisory cross-checks, keyed by operation index
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<u32, ReferenceValue>,
}

impl Batch {
    /// Batch indexed 0, 1, 2, ... in the given order
    pub fn from_operations(operations: impl IntoIterator<Item = Operation>) -> Self {
        let operations = operations
            .into_iter()
            .zip(0u32..)
            .map(|(operation, index)| SequencedOperation {
                index,
                operation,
                metric: None,
            })
            .collect();
        Self {
            operations,
            ..Default::default()
        }
    }

    pub fn for_workbook(mut self, workbook_id: impl Into<WorkbookId>) -> Self {
        self.workbook_id = Some(workbook_id.into());
        self
    }

    /// Tag the operation at `index` as a financial metric
    pub fn with_metric(mut self, index: u32, metric: MetricTag) -> Self {
        if let Some(op) = self.operations.iter_mut().find(|op| op.index == index) {
            op.metric = Some(metric);
        }
        self
    }

    pub fn with_reference(mut self, index: u32, reference: ReferenceValue) -> Self {
        self.references.insert(index, reference);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations in apply order; ties keep submission order
    pub fn ordered(&self) -> Vec<&SequencedOperation> {
        let mut ops: Vec<&SequencedOperation> = self.operations.iter().collect();
        ops.sort_by_key(|op| op.index);
        ops
    }

    /// Every sheet some operation refers to
    pub fn touched_sheets(&self) -> BTreeSet<String> {
        self.operations
            .iter()
            .map(|op| op.operation.sheet().to_string())
            .collect()
    }
}
