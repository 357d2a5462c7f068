use serde::{Deserialize, Serialize};
use sheetx_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using SheetXError
pub type Result<T> = std::result::Result<T, SheetXError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and the review payload handed to the approval
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExErrorKind {
    // Validation
    InvalidReference,
    OutOfBounds,
    SheetNotFound,
    InvalidFormula,
    InvalidValue,
    InvalidParam,
    InvalidName,
    AlreadyExists,
    DuplicateIndex,

    // Snapshot
    SnapshotCapture,
    SnapshotExpired,
    NotFound,

    // Executor
    EnvironmentChanged,
    TransientIo,
    Unsupported,
    Timeout,

    // Rollback
    Restore,

    // Concurrency
    BatchInProgress,

    // Integration/IO
    InvalidInput,
    Config,
    Io,
    Serialization,
    Persistence,

    // Internal
    IllegalTransition,
    Internal,
}

/// Coarse grouping of error kinds, ordered by severity.
///
/// `Validation` failures are expected and returned as data; `Restore` is the
/// only category that leaves the workbook possibly inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    BatchInProgress,
    SnapshotCapture,
    Executor,
    Infrastructure,
    Restore,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidReference => "ERR_INVALID_REFERENCE",
            ExErrorKind::OutOfBounds => "ERR_OUT_OF_BOUNDS",
            ExErrorKind::SheetNotFound => "ERR_SHEET_NOT_FOUND",
            ExErrorKind::InvalidFormula => "ERR_INVALID_FORMULA",
            ExErrorKind::InvalidValue => "ERR_INVALID_VALUE",
            ExErrorKind::InvalidParam => "ERR_INVALID_PARAM",
            ExErrorKind::InvalidName => "ERR_INVALID_NAME",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::DuplicateIndex => "ERR_DUPLICATE_INDEX",
            ExErrorKind::SnapshotCapture => "ERR_SNAPSHOT_CAPTURE",
            ExErrorKind::SnapshotExpired => "ERR_SNAPSHOT_EXPIRED",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::EnvironmentChanged => "ERR_ENVIRONMENT_CHANGED",
            ExErrorKind::TransientIo => "ERR_TRANSIENT_IO",
            ExErrorKind::Unsupported => "ERR_UNSUPPORTED",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Restore => "ERR_RESTORE",
            ExErrorKind::BatchInProgress => "ERR_BATCH_IN_PROGRESS",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::IllegalTransition => "ERR_ILLEGAL_TRANSITION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Category this kind belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExErrorKind::InvalidReference
            | ExErrorKind::OutOfBounds
            | ExErrorKind::SheetNotFound
            | ExErrorKind::InvalidFormula
            | ExErrorKind::InvalidValue
            | ExErrorKind::InvalidParam
            | ExErrorKind::InvalidName
            | ExErrorKind::AlreadyExists
            | ExErrorKind::DuplicateIndex
            | ExErrorKind::InvalidInput => ErrorCategory::Validation,
            ExErrorKind::BatchInProgress => ErrorCategory::BatchInProgress,
            ExErrorKind::SnapshotCapture
            | ExErrorKind::SnapshotExpired
            | ExErrorKind::NotFound => ErrorCategory::SnapshotCapture,
            ExErrorKind::EnvironmentChanged
            | ExErrorKind::TransientIo
            | ExErrorKind::Unsupported
            | ExErrorKind::Timeout => ErrorCategory::Executor,
            ExErrorKind::Config
            | ExErrorKind::Io
            | ExErrorKind::Serialization
            | ExErrorKind::Persistence
            | ExErrorKind::IllegalTransition
            | ExErrorKind::Internal => ErrorCategory::Infrastructure,
            ExErrorKind::Restore => ErrorCategory::Restore,
        }
    }

    /// True only for failures that need operator intervention
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Restore
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling plus enough
/// context (sheet, operation index, applied operations) for a human to
/// reconcile a workbook by hand.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    sheet: Option<String>,
    index: Option<u32>,
    applied: Option<Vec<u32>>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            sheet: None,
            index: None,
            applied: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (workbook, batch or named range)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add sheet context
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Add operation sequence index context
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Record which operations had been applied when the error surfaced
    pub fn with_applied(mut self, applied: Vec<u32>) -> Self {
        self.applied = Some(applied);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Operations applied before the failure, if recorded
    pub fn applied(&self) -> Option<&[u32]> {
        self.applied.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(sheet) = &self.sheet {
            write!(f, " (sheet: {})", sheet)?;
        }
        if let Some(index) = self.index {
            write!(f, " (index: {})", index)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(applied) = &self.applied {
            write!(f, " (applied: {:?})", applied)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for SheetX operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetXError {
    // ===== Validation Errors =====
    /// Cell reference does not match `[A-Z]+[1-9][0-9]*`
    #[error("Invalid cell reference: {reference}")]
    InvalidCellRef { reference: String },

    /// Range reference malformed or inverted
    #[error("Invalid range reference {reference}: {reason}")]
    InvalidRangeRef { reference: String, reason: String },

    /// Column reference does not match `[A-Z]+`
    #[error("Invalid column reference: {column}")]
    InvalidColumnRef { column: String },

    /// Row number is zero or past the grid limit
    #[error("Invalid row number: {row}")]
    InvalidRowRef { row: u32 },

    /// Reference lies past the sheet bounds plus the auto-extend margin
    #[error("Reference {reference} is out of bounds for sheet {sheet} (limit {max_rows} rows x {max_cols} cols)")]
    OutOfBounds {
        sheet: String,
        reference: String,
        max_rows: u32,
        max_cols: u32,
    },

    /// Sheet does not exist and is not the default sheet
    #[error("Sheet not found: {sheet}")]
    SheetNotFound { sheet: String },

    /// Formula failed the syntax check
    #[error("Invalid formula {formula:?}: {reason}")]
    InvalidFormula { formula: String, reason: String },

    /// Non-numeric value written to a numeric-formatted cell
    #[error("Cell {sheet}!{cell} has a numeric format but value {value:?} is not a finite number")]
    NonNumericValue {
        sheet: String,
        cell: String,
        value: String,
    },

    /// NaN or infinite number
    #[error("Value for {cell} is not a finite number")]
    NonFiniteNumber { cell: String },

    /// Row/column action parameter out of range
    #[error("Invalid parameter for {action}: {reason}")]
    InvalidAxisParam { action: String, reason: String },

    /// Format specification rejected
    #[error("Invalid format: {reason}")]
    InvalidFormat { reason: String },

    /// Named range name malformed
    #[error("Invalid named range name {name:?}: {reason}")]
    InvalidNamedRange { name: String, reason: String },

    /// Named range name is a reserved word
    #[error("Named range name {name:?} is reserved")]
    ReservedName { name: String },

    /// Named range name already used in this batch or workbook
    #[error("Named range {name:?} already exists")]
    DuplicateNamedRange { name: String },

    /// Two operations in one batch share a sequence index
    #[error("Duplicate operation index {index}")]
    DuplicateOperationIndex { index: u32 },

    // ===== Snapshot Errors =====
    /// Pre-batch state could not be read
    #[error("Snapshot capture failed: {message}")]
    SnapshotCapture {
        sheet: Option<String>,
        message: String,
    },

    /// Retained snapshot outlived its window
    #[error("Retained snapshot for batch {batch_id} has expired")]
    SnapshotExpired { batch_id: String },

    /// No retained snapshot under that key
    #[error("No retained snapshot for batch {batch_id}")]
    SnapshotNotFound { batch_id: String },

    /// Sheets moved on since the retained batch committed
    #[error("Workbook changed since batch {batch_id} committed; rolling it back would discard later edits")]
    RetainedStateChanged { batch_id: String },

    /// Restoring the snapshot failed; workbook possibly inconsistent
    #[error("Restore failed after applying operations {applied:?}: {message}")]
    Restore { message: String, applied: Vec<u32> },

    // ===== Executor Errors =====
    /// Workbook changed under us between validation and apply
    #[error("Environment changed on sheet {sheet}: {message}")]
    EnvironmentChanged { sheet: String, message: String },

    /// Retryable I/O failure
    #[error("Transient I/O failure: {message}")]
    TransientIo { message: String },

    /// Backend cannot perform the requested operation
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// I/O call exceeded its configured bound
    #[error("{op} exceeded its {limit_ms}ms bound (took {elapsed_ms}ms)")]
    Timeout {
        op: String,
        elapsed_ms: u64,
        limit_ms: u64,
    },

    // ===== Batch Errors =====
    /// Another batch holds the workbook
    #[error("A batch is already in progress for workbook {workbook_id}")]
    BatchInProgress { workbook_id: String },

    /// State machine was driven along an undefined edge
    #[error("Illegal batch transition {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    // ===== Generic Errors =====
    /// Configuration rejected
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Retained snapshot storage failed
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Serialization error (JSON/TOML encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SheetXError {
    /// Canonical kind of this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            SheetXError::InvalidCellRef { .. }
            | SheetXError::InvalidRangeRef { .. }
            | SheetXError::InvalidColumnRef { .. }
            | SheetXError::InvalidRowRef { .. } => ExErrorKind::InvalidReference,
            SheetXError::OutOfBounds { .. } => ExErrorKind::OutOfBounds,
            SheetXError::SheetNotFound { .. } => ExErrorKind::SheetNotFound,
            SheetXError::InvalidFormula { .. } => ExErrorKind::InvalidFormula,
            SheetXError::NonNumericValue { .. } | SheetXError::NonFiniteNumber { .. } => {
                ExErrorKind::InvalidValue
            }
            SheetXError::InvalidAxisParam { .. } | SheetXError::InvalidFormat { .. } => {
                ExErrorKind::InvalidParam
            }
            SheetXError::InvalidNamedRange { .. } | SheetXError::ReservedName { .. } => {
                ExErrorKind::InvalidName
            }
            SheetXError::DuplicateNamedRange { .. } => ExErrorKind::AlreadyExists,
            SheetXError::DuplicateOperationIndex { .. } => ExErrorKind::DuplicateIndex,
            SheetXError::SnapshotCapture { .. } => ExErrorKind::SnapshotCapture,
            SheetXError::SnapshotExpired { .. } => ExErrorKind::SnapshotExpired,
            SheetXError::SnapshotNotFound { .. } => ExErrorKind::NotFound,
            SheetXError::Restore { .. } => ExErrorKind::Restore,
            SheetXError::EnvironmentChanged { .. } | SheetXError::RetainedStateChanged { .. } => {
                ExErrorKind::EnvironmentChanged
            }
            SheetXError::TransientIo { .. } => ExErrorKind::TransientIo,
            SheetXError::Unsupported { .. } => ExErrorKind::Unsupported,
            SheetXError::Timeout { .. } => ExErrorKind::Timeout,
            SheetXError::BatchInProgress { .. } => ExErrorKind::BatchInProgress,
            SheetXError::IllegalTransition { .. } => ExErrorKind::IllegalTransition,
            SheetXError::Config { .. } => ExErrorKind::Config,
            SheetXError::Persistence { .. } => ExErrorKind::Persistence,
            SheetXError::Serialization { .. } => ExErrorKind::Serialization,
            SheetXError::Internal { .. } => ExErrorKind::Internal,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Conversion from SheetXError to ExError
///
/// Keeps the human-readable message and lifts the structured fields that
/// each variant carries.
impl From<SheetXError> for ExError {
    fn from(err: SheetXError) -> Self {
        let base = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            SheetXError::OutOfBounds { sheet, .. }
            | SheetXError::SheetNotFound { sheet }
            | SheetXError::NonNumericValue { sheet, .. }
            | SheetXError::EnvironmentChanged { sheet, .. } => base.with_sheet(sheet),
            SheetXError::SnapshotCapture {
                sheet: Some(sheet), ..
            } => base.with_sheet(sheet).with_op("snapshot_capture"),
            SheetXError::SnapshotCapture { sheet: None, .. } => base.with_op("snapshot_capture"),
            SheetXError::InvalidNamedRange { name, .. }
            | SheetXError::ReservedName { name }
            | SheetXError::DuplicateNamedRange { name } => base.with_entity_id(name),
            SheetXError::DuplicateOperationIndex { index } => base.with_index(index),
            SheetXError::SnapshotExpired { batch_id }
            | SheetXError::SnapshotNotFound { batch_id }
            | SheetXError::RetainedStateChanged { batch_id } => base.with_entity_id(batch_id),
            SheetXError::Restore { applied, .. } => {
                base.with_op("snapshot_restore").with_applied(applied)
            }
            SheetXError::Timeout { op, .. } => base.with_op(op),
            SheetXError::BatchInProgress { workbook_id } => base.with_entity_id(workbook_id),
            _ => base,
        }
    }
}

impl From<serde_json::Error> for SheetXError {
    fn from(err: serde_json::Error) -> Self {
        SheetXError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SheetXError {
    fn from(err: toml::de::Error) -> Self {
        SheetXError::Config {
            message: err.to_string(),
        }
    }
}
