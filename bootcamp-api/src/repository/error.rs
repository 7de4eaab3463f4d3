//! Repository error types
//!
//! Structured errors for repository operations: what was being done, why it
//! failed, and which entity was involved.

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Finding a single entity by ID
    FindById,
    /// Finding multiple entities with filters
    FindAll,
    /// Counting entities matching filters
    Count,
    /// Creating a new entity
    Create,
    /// Updating an existing entity
    Update,
    /// Deleting an entity
    Delete,
    /// Computing a grouped aggregate
    Aggregate,
    /// Defining tables and indexes
    Schema,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindAll => write!(f, "find_all"),
            Self::Count => write!(f, "count"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Aggregate => write!(f, "aggregate"),
            Self::Schema => write!(f, "schema"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Entity was not found
    NotFound,
    /// A unique index already holds the value
    AlreadyExists,
    /// Validation failed before the database operation
    ValidationFailed,
    /// Failed to connect to the database
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Underlying database error
    DatabaseError,
    /// Serialization or deserialization error
    SerializationError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g., "Bootcamp")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Attach the entity type
    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Attach the entity ID
    #[must_use]
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Create a "not found" error for a specific entity
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::FindById,
            RepositoryErrorKind::NotFound,
            "Entity not found",
        )
        .with_entity_type(entity_type)
        .with_entity_id(entity_id)
    }

    /// Create a validation error
    pub fn validation_failed(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ValidationFailed, message)
    }

    /// Create a serialization error
    pub fn serialization(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
    }

    /// Classify a SurrealDB error raised during `operation`
    pub fn from_surreal(operation: RepositoryOperation, err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        let lower = msg.to_lowercase();

        let kind = if lower.contains("already contains")
            || lower.contains("already exists")
            || lower.contains("duplicate")
        {
            RepositoryErrorKind::AlreadyExists
        } else if lower.contains("timeout") || lower.contains("timed out") {
            RepositoryErrorKind::Timeout
        } else if lower.contains("connect") || lower.contains("signin") {
            RepositoryErrorKind::ConnectionFailed
        } else if lower.contains("deserializ") || lower.contains("serializ") {
            RepositoryErrorKind::SerializationError
        } else {
            RepositoryErrorKind::DatabaseError
        };

        Self::new(operation, kind, msg)
    }

    /// Whether retrying the operation might succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;

        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{entity_type}: {entity_id}]"),
            (Some(entity_type), None) => write!(f, " [{entity_type}]"),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = RepositoryError::not_found("Bootcamp", "5d713995b721c3bb38c1f5d0");
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.entity_type.as_deref(), Some("Bootcamp"));
        assert_eq!(
            error.to_string(),
            "Repository not_found error during find_by_id: Entity not found [Bootcamp: 5d713995b721c3bb38c1f5d0]"
        );
    }

    #[test]
    fn test_display_without_entity() {
        let error = RepositoryError::validation_failed(RepositoryOperation::Create, "Please add a name");
        assert_eq!(
            error.to_string(),
            "Repository validation_failed error during create: Please add a name"
        );
    }

    #[test]
    fn test_retriable() {
        let timeout = RepositoryError::new(
            RepositoryOperation::Count,
            RepositoryErrorKind::Timeout,
            "timed out",
        );
        assert!(timeout.is_retriable());
        assert!(!RepositoryError::not_found("Course", "x").is_retriable());
    }
}
