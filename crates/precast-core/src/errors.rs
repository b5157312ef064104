use precast_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that front ends return verbatim and
/// tests assert against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,
    NotFound,
    InvalidOperation,
    InvalidQuantity,
    InsufficientStock,
    EmptyPlan,

    // Consistency
    NegativeBalance,
    ConstraintViolation,
    AdjustmentAborted,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Timeout,
    Config,

    // Auth
    Unauthorised,

    // Internal
    Internal,
}

/// Coarse classification used by front ends to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected before any mutation; nothing to roll back
    Validation,
    /// A committed invariant would have been broken; the transaction rolled back
    Consistency,
    /// Storage, IO or configuration failure
    Infrastructure,
    /// No valid session for the caller
    Unauthenticated,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidOperation => "ERR_INVALID_OPERATION",
            ExErrorKind::InvalidQuantity => "ERR_INVALID_QUANTITY",
            ExErrorKind::InsufficientStock => "ERR_INSUFFICIENT_STOCK",
            ExErrorKind::EmptyPlan => "ERR_EMPTY_PLAN",
            ExErrorKind::NegativeBalance => "ERR_NEGATIVE_BALANCE",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::AdjustmentAborted => "ERR_ADJUSTMENT_ABORTED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Unauthorised => "ERR_UNAUTHORISED",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Classify this kind for status mapping
    pub fn class(&self) -> ErrorClass {
        match self {
            ExErrorKind::InvalidInput
            | ExErrorKind::NotFound
            | ExErrorKind::InvalidOperation
            | ExErrorKind::InvalidQuantity
            | ExErrorKind::InsufficientStock
            | ExErrorKind::EmptyPlan => ErrorClass::Validation,
            ExErrorKind::NegativeBalance
            | ExErrorKind::ConstraintViolation
            | ExErrorKind::AdjustmentAborted => ErrorClass::Consistency,
            ExErrorKind::Unauthorised => ErrorClass::Unauthenticated,
            ExErrorKind::Io
            | ExErrorKind::Serialization
            | ExErrorKind::Persistence
            | ExErrorKind::Timeout
            | ExErrorKind::Config
            | ExErrorKind::Internal => ErrorClass::Infrastructure,
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the context needed
/// to diagnose a failed read or adjustment from its log line alone.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    line_index: Option<usize>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            line_index: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (project, element type or BOM id)
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Add the zero-based index of the offending adjustment line
    pub fn with_line_index(mut self, index: usize) -> Self {
        self.line_index = Some(index);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn line_index(&self) -> Option<usize> {
        self.line_index
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
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(index) = self.line_index {
            write!(f, " (line: {})", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain failures raised while planning or applying an inventory adjustment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InventoryError {
    /// Project id is not a positive integer
    #[error("Invalid project id: {project_id}")]
    InvalidProjectId { project_id: i64 },

    #[error("Project not found: {project_id}")]
    ProjectNotFound { project_id: i64 },

    #[error("Element type {element_type_id} not found in project {project_id}")]
    ElementTypeNotFound {
        project_id: i64,
        element_type_id: i64,
    },

    #[error("BOM product not found: {bom_id}")]
    BomNotFound { bom_id: i64 },

    #[error("Invalid operation '{operation}' for BOM ID {bom_id}: expected 'add' or 'subtract'")]
    InvalidOperation { bom_id: i64, operation: String },

    #[error("Quantity must be positive for BOM ID {bom_id}, got {quantity}")]
    NonPositiveQuantity { bom_id: i64, quantity: i64 },

    /// The line would take a balance past the integer range
    #[error("Quantity {quantity} for BOM ID {bom_id} overflows the balance {balance}")]
    QuantityOutOfRange {
        bom_id: i64,
        quantity: i64,
        balance: i64,
    },

    #[error("Insufficient stock for BOM ID {bom_id}: on hand {on_hand}, requested {requested}")]
    InsufficientStock {
        bom_id: i64,
        on_hand: i64,
        requested: i64,
    },

    #[error("Adjustment request contains no BOM lines")]
    EmptyPlan,

    /// Applying a delta would drive a balance below zero
    #[error("Balance for BOM ID {bom_id} in project {project_id} would become {balance}")]
    NegativeBalance {
        project_id: i64,
        bom_id: i64,
        balance: i64,
    },
}

impl From<InventoryError> for ExError {
    fn from(err: InventoryError) -> Self {
        let message = err.to_string();
        match err {
            InventoryError::InvalidProjectId { project_id } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_entity_id(project_id)
                    .with_message(message)
            }
            InventoryError::ProjectNotFound { project_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(project_id)
                .with_message(message),
            InventoryError::ElementTypeNotFound {
                element_type_id, ..
            } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(element_type_id)
                .with_message(message),
            InventoryError::BomNotFound { bom_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(bom_id)
                .with_message(message),
            InventoryError::InvalidOperation { bom_id, .. } => {
                ExError::new(ExErrorKind::InvalidOperation)
                    .with_entity_id(bom_id)
                    .with_message(message)
            }
            InventoryError::NonPositiveQuantity { bom_id, .. }
            | InventoryError::QuantityOutOfRange { bom_id, .. } => {
                ExError::new(ExErrorKind::InvalidQuantity)
                    .with_entity_id(bom_id)
                    .with_message(message)
            }
            InventoryError::InsufficientStock { bom_id, .. } => {
                ExError::new(ExErrorKind::InsufficientStock)
                    .with_entity_id(bom_id)
                    .with_message(message)
            }
            InventoryError::EmptyPlan => {
                ExError::new(ExErrorKind::EmptyPlan).with_message(message)
            }
            InventoryError::NegativeBalance { bom_id, .. } => {
                ExError::new(ExErrorKind::NegativeBalance)
                    .with_entity_id(bom_id)
                    .with_message(message)
            }
        }
    }
}
