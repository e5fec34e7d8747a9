use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by agora repositories and stores.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Validation failed for one or more fields.
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Target row is missing, soft-deleted, or hidden behind a deleted parent.
    #[error("{table} {id} not found")]
    NotFound { table: String, id: i64 },

    /// A referenced parent row is missing or no longer visible.
    #[error("{field} references {table} {id}, which does not exist")]
    ParentNotFound { field: String, table: String, id: i64 },

    /// The acting principal may not perform the operation.
    #[error("forbidden: cannot {action} {table}")]
    Forbidden { action: Action, table: String },

    /// Unique constraint violation - the value(s) already exist on another live row.
    #[error("unique constraint violation on {table}: fields {fields:?} with values {values:?} already exist on row {existing_id}")]
    UniqueConstraintViolation {
        table: String,
        fields: Vec<String>,
        values: Vec<String>,
        existing_id: i64,
    },

    /// Invalid input supplied to a list/filter operation.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

/// The four caller-facing outcomes plus infrastructure failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    Validation,
    Internal,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::NotFound { .. } | RepoError::ParentNotFound { .. } => ErrorKind::NotFound,
            RepoError::Forbidden { .. } => ErrorKind::Forbidden,
            RepoError::UniqueConstraintViolation { .. } => ErrorKind::Conflict,
            RepoError::Validation(_) | RepoError::InvalidRequest { .. } => ErrorKind::Validation,
            RepoError::Redis(_) | RepoError::Other { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(table: &str, id: i64) -> Self {
        RepoError::NotFound {
            table: table.to_string(),
            id,
        }
    }

    pub(crate) fn forbidden(action: Action, table: &str) -> Self {
        RepoError::Forbidden {
            action,
            table: table.to_string(),
        }
    }
}

/// Operation names used in authorization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    List,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Read => "read",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Collection of validation issues encountered while preparing a mutation.
#[derive(Debug, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;
