use crate::core::errors::LedgerError;
use crate::core::models::{
    expense::PersonalExpense,
    group::{Group, GroupExpense},
};
use async_trait::async_trait;

/// Document store for groups and personal expenses.
///
/// A group (members, expense list, settlements, balance map) is one document
/// and is always written whole.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn insert_group(&self, group: Group) -> Result<Group, LedgerError>;
    async fn load_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    /// Writes `group` if the stored version still equals `group.version`, and
    /// returns the stored copy with the version bumped. Fails with
    /// `VersionConflict` otherwise.
    async fn save_group(&self, group: Group) -> Result<Group, LedgerError>;
    async fn list_groups_for(&self, user_id: &str, email: Option<&str>) -> Result<Vec<Group>, LedgerError>;
    /// Finds the group expense created from the given personal expense.
    async fn load_group_expense_by_backref(
        &self,
        group_id: &str,
        expense_id: &str,
    ) -> Result<Option<GroupExpense>, LedgerError>;

    async fn save_personal_expense(&self, expense: PersonalExpense) -> Result<(), LedgerError>;
    async fn get_personal_expense(&self, expense_id: &str) -> Result<Option<PersonalExpense>, LedgerError>;
    async fn delete_personal_expense(&self, expense_id: &str) -> Result<bool, LedgerError>;
    async fn list_personal_expenses(&self, user_id: &str) -> Result<Vec<PersonalExpense>, LedgerError>;
    /// Group-shared personal expenses in any of `group_ids`, excluding those owned by `exclude_user`.
    async fn list_shared_expenses(
        &self,
        group_ids: &[String],
        exclude_user: &str,
    ) -> Result<Vec<PersonalExpense>, LedgerError>;
}

pub mod in_memory;
