use super::balance_map::BalanceMap;
use super::settle::{SettleOutcome, apply_payment};
use super::simplify::simplify;
use crate::core::errors::LedgerError;
use crate::core::models::group::{Group, GroupExpense};
use crate::core::models::settlement::SettlementRecord;
use crate::core::money::Money;
use chrono::{DateTime, Utc};

pub fn ensure_access(group: &Group, actor_id: &str) -> Result<(), LedgerError> {
    if group.has_access(actor_id) {
        Ok(())
    } else {
        Err(LedgerError::AccessDenied(actor_id.to_string()))
    }
}

/// Raw, unsimplified balances from every expense split and recorded payment.
///
/// Each non-payer share becomes a debt to the payer. A payment counts as the
/// creditor owing the debtor the applied amount, which nets against the
/// original debt during simplification.
pub fn replay(group: &Group) -> BalanceMap {
    let mut raw = BalanceMap::new();
    for expense in &group.expenses {
        for (participant, share) in &expense.splits {
            raw.increment(participant, &expense.paid_by, *share);
        }
    }
    for settlement in &group.settlements {
        raw.increment(&settlement.creditor_id, &settlement.debtor_id, settlement.applied);
    }
    raw
}

pub fn recompute_balances(group: &Group) -> BalanceMap {
    simplify(&replay(group))
}

/// Appends the expense and rebuilds the balance map from the full ledger.
pub fn add_expense(group: &mut Group, actor_id: &str, expense: GroupExpense) -> Result<(), LedgerError> {
    ensure_access(group, actor_id)?;
    group.expenses.push(expense);
    group.balances = recompute_balances(group);
    Ok(())
}

/// Drops every expense matching `reference` and rebuilds the balance map.
///
/// Returns `None` without touching the group when nothing matches.
pub fn remove_expense(group: &mut Group, reference: &str) -> Option<GroupExpense> {
    let position = group.expenses.iter().position(|e| e.matches_ref(reference))?;
    let removed = group.expenses.remove(position);
    group.expenses.retain(|e| !e.matches_ref(reference));
    group.balances = recompute_balances(group);
    Some(removed)
}

pub struct Payment<'a> {
    pub id: String,
    pub debtor_id: &'a str,
    pub creditor_id: &'a str,
    pub amount: Money,
    pub recorded_by: &'a str,
    pub date: DateTime<Utc>,
}

/// Reduces or clears `balances[debtor][creditor]` and keeps the payment in the ledger.
pub fn record_settlement(group: &mut Group, payment: Payment<'_>) -> Result<SettleOutcome, LedgerError> {
    ensure_access(group, payment.recorded_by)?;
    let mut balances = group.balances.clone();
    let outcome = apply_payment(&mut balances, payment.debtor_id, payment.creditor_id, payment.amount)?;
    group.settlements.push(SettlementRecord {
        id: payment.id,
        debtor_id: payment.debtor_id.to_string(),
        creditor_id: payment.creditor_id.to_string(),
        amount: payment.amount,
        applied: outcome.applied,
        recorded_by: payment.recorded_by.to_string(),
        date: payment.date,
    });
    group.balances = balances;
    Ok(outcome)
}

/// Moves every reference to member `from` over to `to`, then rebuilds the balances.
pub fn rename_member(group: &mut Group, from: &str, to: &str) {
    let swap = |id: &mut String| {
        if id.as_str() == from {
            *id = to.to_string();
        }
    };
    for member in &mut group.members {
        swap(&mut member.user_id);
    }
    for expense in &mut group.expenses {
        swap(&mut expense.paid_by);
        if let Some(share) = expense.splits.remove(from) {
            *expense.splits.entry(to.to_string()).or_insert(Money::ZERO) += share;
        }
    }
    for settlement in &mut group.settlements {
        swap(&mut settlement.debtor_id);
        swap(&mut settlement.creditor_id);
    }
    group.balances = recompute_balances(group);
}
