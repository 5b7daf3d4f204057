use super::expense::{Category, ExpenseSuggestions};
use super::settlement::SettlementRecord;
use crate::core::ledger::balance_map::BalanceMap;
use crate::core::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const PLACEHOLDER_PREFIX: &str = "pending:";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    Custom,
}

impl std::fmt::Display for SplitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SplitType::Equal => "equal",
            SplitType::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GroupMember {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

impl GroupMember {
    /// Member added by email who has not signed in yet.
    pub fn placeholder(name: String, email: String) -> Self {
        GroupMember {
            user_id: placeholder_id(&email),
            name,
            email,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.user_id.starts_with(PLACEHOLDER_PREFIX)
    }
}

pub fn placeholder_id(email: &str) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, email.trim().to_lowercase())
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GroupExpense {
    pub id: String,
    pub description: String,
    #[schema(value_type = f64)]
    pub total_amount: Money,
    pub paid_by: String,
    pub split_type: SplitType,
    /// member id -> owed share; values sum to `total_amount`
    #[schema(value_type = BTreeMap<String, f64>)]
    pub splits: BTreeMap<String, Money>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    pub category: Option<Category>,
    pub suggestions: Option<ExpenseSuggestions>,
    /// Back-reference to the personal expense this was created from
    pub expense_id: Option<String>,
}

impl GroupExpense {
    /// Matches either the group expense id or the personal back-reference.
    pub fn matches_ref(&self, reference: &str) -> bool {
        self.id == reference || self.expense_id.as_deref() == Some(reference)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub members: Vec<GroupMember>,
    pub expenses: Vec<GroupExpense>,
    pub settlements: Vec<SettlementRecord>,
    #[schema(value_type = BTreeMap<String, BTreeMap<String, f64>>)]
    pub balances: BalanceMap,
    pub version: u64,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn has_access(&self, user_id: &str) -> bool {
        self.is_owner(user_id) || self.is_member(user_id)
    }

    pub fn has_member_email(&self, email: &str) -> bool {
        self.members.iter().any(|m| m.email.eq_ignore_ascii_case(email))
    }

    /// Owner first, then members in insertion order, without duplicates.
    pub fn participant_ids(&self) -> Vec<String> {
        let mut ids = vec![self.owner_id.clone()];
        for member in &self.members {
            if !ids.contains(&member.user_id) {
                ids.push(member.user_id.clone());
            }
        }
        ids
    }

    pub fn find_expense(&self, reference: &str) -> Option<&GroupExpense> {
        self.expenses.iter().find(|e| e.matches_ref(reference))
    }
}
