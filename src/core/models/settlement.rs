use crate::core::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A payment recorded between two members of a group.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SettlementRecord {
    pub id: String,
    pub debtor_id: String,
    pub creditor_id: String,
    #[schema(value_type = f64)]
    pub amount: Money,
    /// Portion of `amount` that reduced the outstanding debt; any excess is dropped.
    #[schema(value_type = f64)]
    pub applied: Money,
    pub recorded_by: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
}
