use crate::core::errors::LedgerError;
use crate::core::models::{
    expense::PersonalExpense,
    group::{Group, GroupExpense},
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<HashMap<String, Group>>>,
    expenses: Arc<RwLock<HashMap<String, PersonalExpense>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_group(&self, group: Group) -> Result<Group, LedgerError> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group.id) {
            return Err(LedgerError::StorageError(format!("Group {} already exists", group.id)));
        }
        groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn load_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        Ok(self.groups.read().await.get(group_id).cloned())
    }

    async fn save_group(&self, mut group: Group) -> Result<Group, LedgerError> {
        let mut groups = self.groups.write().await;
        let stored = groups
            .get(&group.id)
            .ok_or_else(|| LedgerError::GroupNotFound(group.id.clone()))?;
        if stored.version != group.version {
            warn!(
                "Version conflict on group {}: stored {}, written {}",
                group.id, stored.version, group.version
            );
            return Err(LedgerError::VersionConflict(group.id));
        }
        group.version += 1;
        debug!("Saved group {} at version {}", group.id, group.version);
        groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn list_groups_for(&self, user_id: &str, email: Option<&str>) -> Result<Vec<Group>, LedgerError> {
        let mut found: Vec<Group> = self
            .groups
            .read()
            .await
            .values()
            .filter(|g| g.has_access(user_id) || email.is_some_and(|e| g.has_member_email(e)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn load_group_expense_by_backref(
        &self,
        group_id: &str,
        expense_id: &str,
    ) -> Result<Option<GroupExpense>, LedgerError> {
        Ok(self.groups.read().await.get(group_id).and_then(|g| {
            g.expenses
                .iter()
                .find(|e| e.expense_id.as_deref() == Some(expense_id))
                .cloned()
        }))
    }

    async fn save_personal_expense(&self, expense: PersonalExpense) -> Result<(), LedgerError> {
        self.expenses.write().await.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_personal_expense(&self, expense_id: &str) -> Result<Option<PersonalExpense>, LedgerError> {
        Ok(self.expenses.read().await.get(expense_id).cloned())
    }

    async fn delete_personal_expense(&self, expense_id: &str) -> Result<bool, LedgerError> {
        Ok(self.expenses.write().await.remove(expense_id).is_some())
    }

    async fn list_personal_expenses(&self, user_id: &str) -> Result<Vec<PersonalExpense>, LedgerError> {
        Ok(self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_shared_expenses(
        &self,
        group_ids: &[String],
        exclude_user: &str,
    ) -> Result<Vec<PersonalExpense>, LedgerError> {
        Ok(self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| {
                e.is_group_expense
                    && e.user_id != exclude_user
                    && e.group_id.as_ref().is_some_and(|g| group_ids.contains(g))
            })
            .cloned()
            .collect())
    }
}
