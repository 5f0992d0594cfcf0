use thiserror::Error;

/// Result type alias using DatastoresError
pub type Result<T> = std::result::Result<T, DatastoresError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, log events and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    NotFound,
    CycleDetected,
    CorruptStructure,

    // Identity
    AllocationExhausted,
    IdCollision,

    // Packaging
    DependencyWalkTruncated,
    ReconcileConflict,
    ExternalService,

    // Integration/IO
    Config,
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::CorruptStructure => "ERR_CORRUPT_STRUCTURE",
            ExErrorKind::AllocationExhausted => "ERR_ALLOCATION_EXHAUSTED",
            ExErrorKind::IdCollision => "ERR_ID_COLLISION",
            ExErrorKind::DependencyWalkTruncated => "ERR_DEPENDENCY_WALK_TRUNCATED",
            ExErrorKind::ReconcileConflict => "ERR_RECONCILE_CONFLICT",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the operation and
/// the offending entity so an operator can locate the source data.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
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
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
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
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for element registry and bundle reconciliation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatastoresError {
    // ===== Structural Errors =====
    /// Element not present in the store (the root sentinel is never visible)
    #[error("Element not found: {element_id}")]
    ElementNotFound { element_id: String },

    /// Requested parent not present in the store
    #[error("Parent element not found: {parent_id}")]
    ParentNotFound { parent_id: String },

    /// Move target is the element itself or one of its descendants
    #[error("Cannot move element {element_id} under {new_parent_id}: would create a cycle")]
    CyclicMove {
        element_id: String,
        new_parent_id: String,
    },

    /// Ancestor walk exceeded its bound without reaching the root
    #[error("Parent chain of {element_id} exceeds {limit} ancestors; structure is likely corrupt")]
    ParentChainTooDeep { element_id: String, limit: usize },

    /// Hydrated store violates the parent/child invariants
    #[error("Corrupt structure at {element_id}: {reason}")]
    CorruptStructure { element_id: String, reason: String },

    // ===== Identity Errors =====
    /// No free id found within the probe bound
    #[error("Failed to allocate a stable id after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    /// Minted id already names an element of the target store
    #[error("Stable id {element_id} is already used in this store")]
    IdCollision { element_id: String },

    /// Text is not a valid stable id encoding
    #[error("Invalid stable id encoding '{input}': {reason}")]
    InvalidIdEncoding { input: String, reason: String },

    // ===== Packaging Errors =====
    /// Dependency walk hit its depth guard
    #[error("Dependency walk truncated at {content_id} (depth limit {limit})")]
    DependencyWalkTruncated { content_id: String, limit: usize },

    /// Desired state cannot be applied until the caller resolves it
    #[error("Reconcile conflict for {name}: {reason}")]
    ReconcileConflict { name: String, reason: String },

    /// Packaging backend rejected an operation
    #[error("Packaging backend failed in {op} for {target}: {reason}")]
    Backend {
        op: String,
        target: String,
        reason: String,
    },

    // ===== Integration Errors =====
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl DatastoresError {
    /// The id or name of the offending entity, if the variant carries one
    pub fn entity(&self) -> Option<&str> {
        match self {
            DatastoresError::ElementNotFound { element_id }
            | DatastoresError::CyclicMove { element_id, .. }
            | DatastoresError::ParentChainTooDeep { element_id, .. }
            | DatastoresError::CorruptStructure { element_id, .. }
            | DatastoresError::IdCollision { element_id } => Some(element_id),
            DatastoresError::ParentNotFound { parent_id } => Some(parent_id),
            DatastoresError::InvalidIdEncoding { input, .. } => Some(input),
            DatastoresError::DependencyWalkTruncated { content_id, .. } => Some(content_id),
            DatastoresError::ReconcileConflict { name, .. } => Some(name),
            DatastoresError::Backend { target, .. } => Some(target),
            DatastoresError::Io { path, .. } => Some(path),
            DatastoresError::AllocationExhausted { .. }
            | DatastoresError::Config { .. }
            | DatastoresError::Serialization { .. } => None,
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        match self {
            DatastoresError::ElementNotFound { .. } | DatastoresError::ParentNotFound { .. } => {
                ExErrorKind::NotFound
            }
            DatastoresError::CyclicMove { .. } => ExErrorKind::CycleDetected,
            DatastoresError::ParentChainTooDeep { .. }
            | DatastoresError::CorruptStructure { .. } => ExErrorKind::CorruptStructure,
            DatastoresError::AllocationExhausted { .. } => ExErrorKind::AllocationExhausted,
            DatastoresError::IdCollision { .. } => ExErrorKind::IdCollision,
            DatastoresError::InvalidIdEncoding { .. } => ExErrorKind::InvalidInput,
            DatastoresError::DependencyWalkTruncated { .. } => {
                ExErrorKind::DependencyWalkTruncated
            }
            DatastoresError::ReconcileConflict { .. } => ExErrorKind::ReconcileConflict,
            DatastoresError::Backend { .. } => ExErrorKind::ExternalService,
            DatastoresError::Config { .. } => ExErrorKind::Config,
            DatastoresError::Io { .. } => ExErrorKind::Io,
            DatastoresError::Serialization { .. } => ExErrorKind::Serialization,
        }
    }
}

impl From<DatastoresError> for ExError {
    fn from(err: DatastoresError) -> Self {
        let mut ex = ExError::new(err.kind()).with_message(err.to_string());
        if let Some(entity) = err.entity() {
            ex = ex.with_entity_id(entity);
        }
        ex
    }
}

impl From<serde_json::Error> for DatastoresError {
    fn from(err: serde_json::Error) -> Self {
        DatastoresError::Serialization {
            reason: err.to_string(),
        }
    }
}
