use super::balance_map::BalanceMap;
use crate::core::errors::LedgerError;
use crate::core::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettleOutcome {
    /// What the debtor still owes, never below zero.
    pub remaining: Money,
    /// How much of the payment actually reduced the debt.
    pub applied: Money,
}

/// Applies a payment from `debtor` to `creditor` against the balance map.
pub fn apply_payment(
    balances: &mut BalanceMap,
    debtor: &str,
    creditor: &str,
    payment: Money,
) -> Result<SettleOutcome, LedgerError> {
    if !payment.is_positive() {
        return Err(LedgerError::invalid_input(
            "amount",
            "Invalid Amount",
            "Amount must be greater than 0",
        ));
    }
    let owed = balances
        .get(debtor, creditor)
        .ok_or_else(|| LedgerError::NoBalance {
            debtor: debtor.to_string(),
            creditor: creditor.to_string(),
        })?;

    let remaining = owed - payment;
    if remaining.is_positive() {
        balances.set(debtor, creditor, remaining);
        Ok(SettleOutcome {
            remaining,
            applied: payment,
        })
    } else {
        balances.remove(debtor, creditor);
        Ok(SettleOutcome {
            remaining: Money::ZERO,
            applied: owed,
        })
    }
}
