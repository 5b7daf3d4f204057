use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::core::{errors::LedgerError, money::Money, services::NewGroupMember};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub members: Vec<NewGroupMember>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
}

impl From<AddMemberRequest> for NewGroupMember {
    fn from(req: AddMemberRequest) -> Self {
        NewGroupMember {
            user_id: req.user_id,
            name: req.name,
            email: req.email,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SettleRequest {
    pub debtor_id: String,
    pub creditor_id: String,
    #[schema(value_type = f64)]
    pub amount: Money,
}

#[derive(Serialize, ToSchema)]
pub struct BalancesResponse {
    #[schema(value_type = BTreeMap<String, BTreeMap<String, f64>>)]
    pub balances: crate::core::ledger::BalanceMap,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

// Newtype wrapper for LedgerError to implement IntoResponse
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LedgerError::AccessDenied(_) => StatusCode::FORBIDDEN,
            LedgerError::GroupNotFound(_) | LedgerError::ExpenseNotFound(_) | LedgerError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LedgerError::InvalidSplit(_)
            | LedgerError::UnknownParticipant(_)
            | LedgerError::NoBalance { .. }
            | LedgerError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            LedgerError::AlreadyMember(_) | LedgerError::VersionConflict(_) => StatusCode::CONFLICT,
            LedgerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LedgerError::EnrichmentError(_) => StatusCode::BAD_GATEWAY,
            LedgerError::StorageError(_) | LedgerError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let (error, field) = match self.0 {
            LedgerError::InvalidInput(field, detail) => (format!("{}: {}", detail.title, detail.description), Some(field)),
            LedgerError::NoBalance { debtor, creditor } => {
                (format!("No balance found between {} and {}", debtor, creditor), None)
            }
            other => (other.to_string(), None),
        };
        (status, Json(ErrorResponse { error, field })).into_response()
    }
}
