mod ledger_tests;

use crate::core::errors::LedgerError;
use crate::core::models::expense::{Category, ExpenseSuggestions, PersonalExpense};
use crate::core::models::group::{Group, GroupExpense, SplitType};
use crate::core::money::Money;
use crate::core::services::{LedgerService, NewGroupExpense, NewGroupMember};
use crate::infrastructure::enrichment::Enricher;
use crate::infrastructure::storage::{Storage, in_memory::InMemoryStorage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const CAROL: &str = "carol";

/// Behaves like an unreachable model API.
pub struct FailingEnricher;

#[async_trait]
impl Enricher for FailingEnricher {
    async fn predict_category(&self, _description: &str) -> Result<Category, LedgerError> {
        Err(LedgerError::EnrichmentError("model unavailable".to_string()))
    }

    async fn suggest(
        &self,
        _description: &str,
        _category: Category,
        _amount: Money,
    ) -> Result<ExpenseSuggestions, LedgerError> {
        Err(LedgerError::EnrichmentError("model unavailable".to_string()))
    }
}

/// Always answers `Food` with a fixed tip.
pub struct FoodEnricher;

#[async_trait]
impl Enricher for FoodEnricher {
    async fn predict_category(&self, _description: &str) -> Result<Category, LedgerError> {
        Ok(Category::Food)
    }

    async fn suggest(
        &self,
        _description: &str,
        _category: Category,
        _amount: Money,
    ) -> Result<ExpenseSuggestions, LedgerError> {
        Ok(ExpenseSuggestions {
            health_impact: "Moderate".to_string(),
            alternatives: vec!["Cook at home".to_string()],
            smart_tip: "Plan meals ahead".to_string(),
            frequency_suggestion: "Weekly".to_string(),
        })
    }
}

/// Fails the first `conflicts` group writes with a version conflict.
pub struct FlakyStorage {
    inner: InMemoryStorage,
    conflicts: AtomicU32,
}

impl FlakyStorage {
    pub fn new(conflicts: u32) -> Self {
        FlakyStorage {
            inner: InMemoryStorage::new(),
            conflicts: AtomicU32::new(conflicts),
        }
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn insert_group(&self, group: Group) -> Result<Group, LedgerError> {
        self.inner.insert_group(group).await
    }

    async fn load_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        self.inner.load_group(group_id).await
    }

    async fn save_group(&self, group: Group) -> Result<Group, LedgerError> {
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(LedgerError::VersionConflict(group.id));
        }
        self.inner.save_group(group).await
    }

    async fn list_groups_for(&self, user_id: &str, email: Option<&str>) -> Result<Vec<Group>, LedgerError> {
        self.inner.list_groups_for(user_id, email).await
    }

    async fn load_group_expense_by_backref(
        &self,
        group_id: &str,
        expense_id: &str,
    ) -> Result<Option<GroupExpense>, LedgerError> {
        self.inner.load_group_expense_by_backref(group_id, expense_id).await
    }

    async fn save_personal_expense(&self, expense: PersonalExpense) -> Result<(), LedgerError> {
        self.inner.save_personal_expense(expense).await
    }

    async fn get_personal_expense(&self, expense_id: &str) -> Result<Option<PersonalExpense>, LedgerError> {
        self.inner.get_personal_expense(expense_id).await
    }

    async fn delete_personal_expense(&self, expense_id: &str) -> Result<bool, LedgerError> {
        self.inner.delete_personal_expense(expense_id).await
    }

    async fn list_personal_expenses(&self, user_id: &str) -> Result<Vec<PersonalExpense>, LedgerError> {
        self.inner.list_personal_expenses(user_id).await
    }

    async fn list_shared_expenses(
        &self,
        group_ids: &[String],
        exclude_user: &str,
    ) -> Result<Vec<PersonalExpense>, LedgerError> {
        self.inner.list_shared_expenses(group_ids, exclude_user).await
    }
}

pub type TestService = LedgerService<InMemoryStorage, FailingEnricher>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn create_test_service() -> TestService {
    init_tracing();
    LedgerService::new(InMemoryStorage::new(), FailingEnricher, "test-secret".to_string(), 3)
}

pub fn money(major: f64) -> Money {
    Money::from_major(major)
}

pub fn member(user_id: &str) -> NewGroupMember {
    NewGroupMember {
        user_id: Some(user_id.to_string()),
        name: user_id.to_string(),
        email: format!("{}@example.com", user_id),
    }
}

/// Alice owns the group, Bob and Carol are members.
pub async fn trio_group<S: Storage, E: Enricher>(service: &LedgerService<S, E>) -> Group {
    service
        .create_group(ALICE, "Trip".to_string(), vec![member(BOB), member(CAROL)])
        .await
        .unwrap()
}

/// Alice owns the group, Bob is the only member.
pub async fn pair_group<S: Storage, E: Enricher>(service: &LedgerService<S, E>) -> Group {
    service
        .create_group(ALICE, "Dinner".to_string(), vec![member(BOB)])
        .await
        .unwrap()
}

pub fn equal_expense(description: &str, total: f64, paid_by: &str) -> NewGroupExpense {
    NewGroupExpense {
        description: description.to_string(),
        total_amount: money(total),
        paid_by: Some(paid_by.to_string()),
        split_type: SplitType::Equal,
        custom_splits: None,
        category: Some(Category::Food),
        date: None,
    }
}
