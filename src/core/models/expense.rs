use crate::core::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Travel,
    Shopping,
    Entertainment,
    Health,
    Utilities,
    Rent,
    Education,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Travel,
        Category::Shopping,
        Category::Entertainment,
        Category::Health,
        Category::Utilities,
        Category::Rent,
        Category::Education,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Travel => "travel",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Utilities => "utilities",
            Category::Rent => "rent",
            Category::Education => "education",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("unknown category `{}`", s))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Upi,
    CreditCard,
    DebitCard,
    NetBanking,
}

/// Structured advice attached to an expense by the enrichment collaborator.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ExpenseSuggestions {
    pub health_impact: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    pub smart_tip: String,
    pub frequency_suggestion: String,
}

impl ExpenseSuggestions {
    pub fn neutral() -> Self {
        ExpenseSuggestions {
            health_impact: "No specific health impact identified.".to_string(),
            alternatives: Vec::new(),
            smart_tip: "Track your spending to make informed decisions.".to_string(),
            frequency_suggestion: "As needed".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PersonalExpense {
    pub id: String,
    pub user_id: String,
    pub item_name: String,
    #[schema(value_type = f64)]
    pub amount: Money,
    pub category: Category,
    pub payment_type: PaymentType,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub predicted_category: Option<Category>,
    pub suggestions: Option<ExpenseSuggestions>,
    pub is_group_expense: bool,
    pub group_id: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

/// Input for a new personal expense, optionally shared with a group.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewPersonalExpense {
    pub item_name: String,
    #[schema(value_type = f64)]
    pub amount: Money,
    pub category: Option<Category>,
    pub payment_type: PaymentType,
    #[schema(value_type = Option<String>)]
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub is_group_expense: bool,
    pub group_id: Option<String>,
    #[serde(default = "default_split_equally")]
    pub split_equally: bool,
    #[schema(value_type = Option<BTreeMap<String, f64>>)]
    pub custom_splits: Option<BTreeMap<String, Money>>,
}

fn default_split_equally() -> bool {
    true
}

/// A personal expense as seen by the caller, including other members' group-shared records.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExpenseView {
    #[serde(flatten)]
    pub expense: PersonalExpense,
    pub is_member_view: bool,
    #[schema(value_type = Option<f64>)]
    pub user_share: Option<Money>,
}
