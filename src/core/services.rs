use crate::auth::jwt::{Claims, JwtService};
use crate::core::errors::LedgerError;
use crate::core::ledger::{self, BalanceMap, Payment, compute_split, mutator::ensure_access};
use crate::core::locks::GroupLocks;
use crate::core::models::{
    expense::{Category, ExpenseSuggestions, ExpenseView, NewPersonalExpense, PersonalExpense},
    group::{Group, GroupExpense, GroupMember, SplitType, placeholder_id},
};
use crate::core::money::Money;
use crate::infrastructure::enrichment::Enricher;
use crate::infrastructure::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const MAX_AMOUNT: Money = Money::from_minor(100_000_000);

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewGroupMember {
    /// Absent until the invitee signs in; a placeholder id is assigned meanwhile
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewGroupExpense {
    pub description: String,
    #[schema(value_type = f64)]
    pub total_amount: Money,
    /// Defaults to the caller
    pub paid_by: Option<String>,
    pub split_type: SplitType,
    #[schema(value_type = Option<BTreeMap<String, f64>>)]
    pub custom_splits: Option<BTreeMap<String, Money>>,
    pub category: Option<Category>,
    #[schema(value_type = Option<String>)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GroupSummary {
    pub group_name: String,
    pub total_expenses: usize,
    #[schema(value_type = f64)]
    pub total_amount: Money,
    /// Sum of every member's split shares
    #[schema(value_type = BTreeMap<String, f64>)]
    pub per_member_totals: BTreeMap<String, Money>,
    #[schema(value_type = BTreeMap<String, BTreeMap<String, f64>>)]
    pub balances: BalanceMap,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SettleResponse {
    #[schema(value_type = f64)]
    pub remaining_balance: Money,
    #[schema(value_type = BTreeMap<String, BTreeMap<String, f64>>)]
    pub balances: BalanceMap,
}

/// Everything needed to append one expense to a group ledger.
struct ExpenseDraft {
    id: String,
    description: String,
    total_amount: Money,
    paid_by: String,
    split_type: SplitType,
    custom_splits: Option<BTreeMap<String, Money>>,
    category: Option<Category>,
    suggestions: Option<ExpenseSuggestions>,
    expense_id: Option<String>,
    date: DateTime<Utc>,
}

struct Enrichment {
    category: Category,
    predicted: Option<Category>,
    suggestions: ExpenseSuggestions,
}

pub struct LedgerService<S: Storage, E: Enricher> {
    storage: S,
    enricher: E,
    locks: GroupLocks,
    retry_limit: u32,
    jwt_service: JwtService,
}

impl<S: Storage, E: Enricher> LedgerService<S, E> {
    pub fn new(storage: S, enricher: E, jwt_secret: String, retry_limit: u32) -> Self {
        LedgerService {
            storage,
            enricher,
            locks: GroupLocks::new(),
            retry_limit: retry_limit.max(1),
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, LedgerError> {
        self.jwt_service.validate_token(token)
    }

    pub fn issue_token(&self, user_id: &str, email: Option<&str>) -> Result<String, LedgerError> {
        self.jwt_service.generate_token(user_id, email)
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        if value.trim().is_empty() {
            return Err(LedgerError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.len() > max_length {
            return Err(LedgerError::invalid_input(
                field,
                &format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(LedgerError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: Money) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(LedgerError::invalid_input(
                field,
                "Amount Too Large",
                format!("Amount cannot exceed {}", MAX_AMOUNT),
            ));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), LedgerError> {
        if !email.contains('@') || email.len() < 3 {
            return Err(LedgerError::invalid_input(
                "email",
                "Invalid email",
                format!("{} is not a valid email address", email),
            ));
        }
        Ok(())
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.storage
            .load_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    /// Runs one read-modify-write cycle on a group.
    ///
    /// The group lock is held throughout. `apply` sees a freshly loaded group
    /// on every attempt and returns `None` to leave the group unwritten. A
    /// version conflict is retried until the attempt limit is reached.
    async fn mutate_group<T, F>(&self, group_id: &str, mut apply: F) -> Result<(Group, Option<T>), LedgerError>
    where
        F: FnMut(&mut Group) -> Result<Option<T>, LedgerError>,
    {
        let _guard = self.locks.acquire(group_id).await;
        let mut attempt = 1;
        loop {
            let mut group = self.load_group(group_id).await?;
            let Some(outcome) = apply(&mut group)? else {
                return Ok((group, None));
            };
            match self.storage.save_group(group).await {
                Ok(saved) => return Ok((saved, Some(outcome))),
                Err(LedgerError::VersionConflict(id)) if attempt < self.retry_limit => {
                    warn!("Retrying write to group {} after conflict (attempt {})", id, attempt);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Best-effort category and advice. Never fails.
    async fn enrich(&self, description: &str, category: Option<Category>, amount: Money) -> Enrichment {
        let predicted = match category {
            Some(_) => None,
            None => match self.enricher.predict_category(description).await {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("Category prediction unavailable for '{}': {}", description, e);
                    None
                }
            },
        };
        let category = category.or(predicted).unwrap_or(Category::Other);
        let suggestions = match self.enricher.suggest(description, category, amount).await {
            Ok(s) => s,
            Err(e) => {
                warn!("Suggestions unavailable for '{}': {}", description, e);
                ExpenseSuggestions::neutral()
            }
        };
        Enrichment {
            category,
            predicted,
            suggestions,
        }
    }

    // GROUPS

    pub async fn create_group(
        &self,
        owner_id: &str,
        name: String,
        members: Vec<NewGroupMember>,
    ) -> Result<Group, LedgerError> {
        self.validate_string_input("name", &name, 100)?;
        info!("Creating group '{}' for owner {}", name, owner_id);

        let mut group_members: Vec<GroupMember> = Vec::new();
        for member in members {
            let member = self.build_member(member)?;
            let duplicate = member.user_id == owner_id
                || group_members
                    .iter()
                    .any(|m| m.user_id == member.user_id || m.email.eq_ignore_ascii_case(&member.email));
            if duplicate {
                debug!("Skipping duplicate member {}", member.user_id);
                continue;
            }
            group_members.push(member);
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            owner_id: owner_id.to_string(),
            members: group_members,
            expenses: Vec::new(),
            settlements: Vec::new(),
            balances: BalanceMap::new(),
            version: 0,
            created_at: Utc::now(),
        };
        let created = self.storage.insert_group(group).await?;
        debug!("Group created with ID: {}", created.id);
        Ok(created)
    }

    fn build_member(&self, member: NewGroupMember) -> Result<GroupMember, LedgerError> {
        let email = member.email.trim().to_string();
        self.validate_email(&email)?;
        self.validate_string_input("name", &member.name, 100)?;
        Ok(match member.user_id.filter(|id| !id.trim().is_empty()) {
            Some(user_id) => GroupMember {
                user_id,
                name: member.name,
                email,
            },
            None => GroupMember::placeholder(member.name, email),
        })
    }

    pub async fn list_groups(&self, actor_id: &str, actor_email: Option<&str>) -> Result<Vec<Group>, LedgerError> {
        self.storage.list_groups_for(actor_id, actor_email).await
    }

    pub async fn get_group(&self, group_id: &str, actor_id: &str) -> Result<Group, LedgerError> {
        let group = self.load_group(group_id).await?;
        ensure_access(&group, actor_id)?;
        Ok(group)
    }

    /// Owner-only.
    pub async fn add_member(
        &self,
        group_id: &str,
        actor_id: &str,
        member: NewGroupMember,
    ) -> Result<Group, LedgerError> {
        let member = self.build_member(member)?;
        info!("User {} adding member {} to group {}", actor_id, member.user_id, group_id);
        let (group, _) = self
            .mutate_group(group_id, |group| {
                if !group.is_owner(actor_id) {
                    return Err(LedgerError::AccessDenied(actor_id.to_string()));
                }
                if group.has_access(&member.user_id) || group.has_member_email(&member.email) {
                    return Err(LedgerError::AlreadyMember(member.email.clone()));
                }
                group.members.push(member.clone());
                Ok(Some(()))
            })
            .await?;
        Ok(group)
    }

    /// Swaps the caller's email placeholder for their real id across the whole ledger.
    pub async fn claim_membership(&self, group_id: &str, actor_id: &str, actor_email: &str) -> Result<Group, LedgerError> {
        let placeholder = placeholder_id(actor_email);
        info!("User {} claiming {} in group {}", actor_id, placeholder, group_id);
        let (group, _) = self
            .mutate_group(group_id, |group| {
                if !group.is_member(&placeholder) {
                    return Err(LedgerError::NotFound(format!("Pending membership for {}", actor_email)));
                }
                if group.has_access(actor_id) {
                    return Err(LedgerError::AlreadyMember(actor_id.to_string()));
                }
                ledger::rename_member(group, &placeholder, actor_id);
                Ok(Some(()))
            })
            .await?;
        Ok(group)
    }

    // LEDGER

    async fn append_expense(
        &self,
        group_id: &str,
        actor_id: &str,
        draft: ExpenseDraft,
    ) -> Result<GroupExpense, LedgerError> {
        let (_, expense) = self
            .mutate_group(group_id, |group| {
                ensure_access(group, actor_id)?;
                if draft.split_type == SplitType::Equal && group.members.is_empty() {
                    return Err(LedgerError::InvalidSplit(
                        "equal split needs at least one member besides the owner".to_string(),
                    ));
                }
                let participants = group.participant_ids();
                if !participants.contains(&draft.paid_by) {
                    return Err(LedgerError::UnknownParticipant(draft.paid_by.clone()));
                }
                let splits = compute_split(
                    draft.total_amount,
                    &participants,
                    draft.split_type,
                    draft.custom_splits.as_ref(),
                )?;
                let expense = GroupExpense {
                    id: draft.id.clone(),
                    description: draft.description.clone(),
                    total_amount: draft.total_amount,
                    paid_by: draft.paid_by.clone(),
                    split_type: draft.split_type,
                    splits,
                    date: draft.date,
                    category: draft.category,
                    suggestions: draft.suggestions.clone(),
                    expense_id: draft.expense_id.clone(),
                };
                ledger::add_expense(group, actor_id, expense.clone())?;
                Ok(Some(expense))
            })
            .await?;
        expense.ok_or_else(|| LedgerError::InternalServerError("expense was not recorded".to_string()))
    }

    pub async fn add_expense(
        &self,
        group_id: &str,
        actor_id: &str,
        input: NewGroupExpense,
    ) -> Result<GroupExpense, LedgerError> {
        self.validate_string_input("description", &input.description, 255)?;
        self.validate_amount_input("total_amount", input.total_amount)?;
        info!(
            "User {} adding expense of {} to group {}",
            actor_id, input.total_amount, group_id
        );

        // Enrichment happens before the group lock is taken.
        let category = match input.category {
            Some(c) => Some(c),
            None => self
                .enricher
                .predict_category(&input.description)
                .await
                .inspect_err(|e| warn!("Category prediction unavailable for '{}': {}", input.description, e))
                .ok(),
        };

        let draft = ExpenseDraft {
            id: Uuid::new_v4().to_string(),
            description: input.description,
            total_amount: input.total_amount,
            paid_by: input.paid_by.unwrap_or_else(|| actor_id.to_string()),
            split_type: input.split_type,
            custom_splits: input.custom_splits,
            category,
            suggestions: None,
            expense_id: None,
            date: input.date.unwrap_or_else(Utc::now),
        };
        let expense = self.append_expense(group_id, actor_id, draft).await?;
        debug!("Expense {} added to group {}", expense.id, group_id);
        Ok(expense)
    }

    /// Removing an expense that is not in the group leaves everything untouched.
    pub async fn remove_expense(
        &self,
        group_id: &str,
        actor_id: &str,
        expense_ref: &str,
    ) -> Result<BalanceMap, LedgerError> {
        info!("User {} removing expense {} from group {}", actor_id, expense_ref, group_id);
        let (group, removed) = self
            .mutate_group(group_id, |group| {
                ensure_access(group, actor_id)?;
                Ok(ledger::remove_expense(group, expense_ref))
            })
            .await?;
        if removed.is_none() {
            debug!("Expense {} not present in group {}", expense_ref, group_id);
        }
        Ok(group.balances)
    }

    pub async fn settle(
        &self,
        group_id: &str,
        actor_id: &str,
        debtor_id: &str,
        creditor_id: &str,
        amount: Money,
    ) -> Result<SettleResponse, LedgerError> {
        self.validate_amount_input("amount", amount)?;
        info!(
            "User {} recording payment of {} from {} to {} in group {}",
            actor_id, amount, debtor_id, creditor_id, group_id
        );
        let settlement_id = Uuid::new_v4().to_string();
        let (group, outcome) = self
            .mutate_group(group_id, |group| {
                let outcome = ledger::record_settlement(
                    group,
                    Payment {
                        id: settlement_id.clone(),
                        debtor_id,
                        creditor_id,
                        amount,
                        recorded_by: actor_id,
                        date: Utc::now(),
                    },
                )?;
                Ok(Some(outcome))
            })
            .await?;
        let remaining_balance = outcome.map(|o| o.remaining).unwrap_or(Money::ZERO);
        Ok(SettleResponse {
            remaining_balance,
            balances: group.balances,
        })
    }

    pub async fn get_balances(&self, group_id: &str, actor_id: &str) -> Result<BalanceMap, LedgerError> {
        Ok(self.get_group(group_id, actor_id).await?.balances)
    }

    pub async fn get_summary(&self, group_id: &str, actor_id: &str) -> Result<GroupSummary, LedgerError> {
        let group = self.get_group(group_id, actor_id).await?;
        let mut per_member_totals: BTreeMap<String, Money> = BTreeMap::new();
        for expense in &group.expenses {
            for (member, share) in &expense.splits {
                *per_member_totals.entry(member.clone()).or_default() += *share;
            }
        }
        Ok(GroupSummary {
            group_name: group.name,
            total_expenses: group.expenses.len(),
            total_amount: group.expenses.iter().map(|e| e.total_amount).sum(),
            per_member_totals,
            balances: group.balances,
        })
    }

    // PERSONAL EXPENSES

    pub async fn create_personal_expense(
        &self,
        actor_id: &str,
        input: NewPersonalExpense,
    ) -> Result<PersonalExpense, LedgerError> {
        self.validate_string_input("item_name", &input.item_name, 255)?;
        self.validate_amount_input("amount", input.amount)?;
        let shared_group = match (input.is_group_expense, input.group_id.as_deref()) {
            (true, Some(gid)) if !gid.trim().is_empty() => Some(gid.to_string()),
            (true, _) => {
                return Err(LedgerError::invalid_input(
                    "group_id",
                    "Missing group",
                    "A group expense needs a group_id",
                ));
            }
            (false, _) => None,
        };

        let enrichment = self.enrich(&input.item_name, input.category, input.amount).await;
        let now = Utc::now();
        let expense = PersonalExpense {
            id: Uuid::new_v4().to_string(),
            user_id: actor_id.to_string(),
            item_name: input.item_name,
            amount: input.amount,
            category: enrichment.category,
            payment_type: input.payment_type,
            date: input.date.unwrap_or(now),
            notes: input.notes,
            location: input.location,
            predicted_category: enrichment.predicted,
            suggestions: Some(enrichment.suggestions),
            is_group_expense: shared_group.is_some(),
            group_id: shared_group.clone(),
            created_at: now,
        };

        if let Some(group_id) = &shared_group {
            let draft = ExpenseDraft {
                id: Uuid::new_v4().to_string(),
                description: expense.item_name.clone(),
                total_amount: expense.amount,
                paid_by: actor_id.to_string(),
                split_type: if input.split_equally {
                    SplitType::Equal
                } else {
                    SplitType::Custom
                },
                custom_splits: input.custom_splits,
                category: Some(expense.category),
                suggestions: expense.suggestions.clone(),
                expense_id: Some(expense.id.clone()),
                date: expense.date,
            };
            self.append_expense(group_id, actor_id, draft).await?;
        }

        if let Err(e) = self.storage.save_personal_expense(expense.clone()).await {
            if let Some(group_id) = &shared_group {
                warn!("Rolling back group expense {} after failed save", expense.id);
                self.detach_from_group(group_id, &expense.id).await;
            }
            return Err(e);
        }
        info!("Personal expense {} created for {}", expense.id, actor_id);
        Ok(expense)
    }

    /// Removes the group copy of a personal expense. Failures are logged, not returned,
    /// so the personal record can still be deleted.
    async fn detach_from_group(&self, group_id: &str, expense_id: &str) {
        match self.storage.load_group_expense_by_backref(group_id, expense_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("No group copy of {} in group {}", expense_id, group_id);
                return;
            }
            Err(e) => warn!("Lookup of {} in group {} failed: {}", expense_id, group_id, e),
        }
        let result = self
            .mutate_group(group_id, |group| Ok(ledger::remove_expense(group, expense_id)))
            .await;
        if let Err(e) = result {
            warn!("Could not remove {} from group {}: {}", expense_id, group_id, e);
        }
    }

    pub async fn delete_personal_expense(&self, actor_id: &str, expense_id: &str) -> Result<(), LedgerError> {
        let expense = self
            .storage
            .get_personal_expense(expense_id)
            .await?
            .filter(|e| e.user_id == actor_id)
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))?;

        if let (true, Some(group_id)) = (expense.is_group_expense, expense.group_id.as_deref()) {
            self.detach_from_group(group_id, expense_id).await;
        }

        if !self.storage.delete_personal_expense(expense_id).await? {
            return Err(LedgerError::ExpenseNotFound(expense_id.to_string()));
        }
        info!("Personal expense {} deleted by {}", expense_id, actor_id);
        Ok(())
    }

    /// The caller's own expenses plus what other members shared into the caller's groups.
    pub async fn list_expenses(&self, actor_id: &str, actor_email: Option<&str>) -> Result<Vec<ExpenseView>, LedgerError> {
        let (own, groups) = futures::try_join!(
            self.storage.list_personal_expenses(actor_id),
            self.storage.list_groups_for(actor_id, actor_email),
        )?;
        let group_ids: Vec<String> = groups.iter().map(|g| g.id.clone()).collect();
        let shared = self.storage.list_shared_expenses(&group_ids, actor_id).await?;
        let groups: HashMap<&str, &Group> = groups.iter().map(|g| (g.id.as_str(), g)).collect();

        let mut views: Vec<ExpenseView> = own
            .into_iter()
            .map(|expense| ExpenseView {
                expense,
                is_member_view: false,
                user_share: None,
            })
            .collect();
        for expense in shared {
            let user_share = expense
                .group_id
                .as_deref()
                .and_then(|gid| groups.get(gid))
                .and_then(|g| g.find_expense(&expense.id))
                .and_then(|ge| ge.splits.get(actor_id).copied());
            views.push(ExpenseView {
                expense,
                is_member_view: true,
                user_share,
            });
        }
        views.sort_by(|a, b| b.expense.date.cmp(&a.expense.date));
        Ok(views)
    }
}
