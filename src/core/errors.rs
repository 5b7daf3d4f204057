use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Actor is neither owner nor member of the group, or not the owner of a record
    #[error("User {0} is not allowed to access this group")]
    AccessDenied(String),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),
    #[error("{0} not found")]
    NotFound(String),
    /// Zero participants, or a custom split that does not add up to the total
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("User {0} is not a participant of this group")]
    UnknownParticipant(String),
    #[error("Member {0} is already in the group")]
    AlreadyMember(String),
    #[error("No balance for {debtor} owing {creditor}")]
    NoBalance { debtor: String, creditor: String },
    /// Optimistic write lost against a concurrent writer
    #[error("Group {0} was modified concurrently")]
    VersionConflict(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Enrichment error: {0}")]
    EnrichmentError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl LedgerError {
    pub fn invalid_input(field: &str, title: &str, description: impl Into<String>) -> Self {
        LedgerError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: title.to_string(),
                description: description.into(),
            },
        )
    }
}
