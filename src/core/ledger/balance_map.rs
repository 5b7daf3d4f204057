use crate::core::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// debtor id -> creditor id -> amount owed.
///
/// Every stored amount is strictly positive. A debtor whose inner map becomes
/// empty is removed from the outer map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceMap(BTreeMap<String, BTreeMap<String, Money>>);

impl BalanceMap {
    pub fn new() -> Self {
        BalanceMap(BTreeMap::new())
    }

    pub fn get(&self, debtor: &str, creditor: &str) -> Option<Money> {
        self.0.get(debtor).and_then(|row| row.get(creditor)).copied()
    }

    /// Adds `amount` to what `debtor` owes `creditor`. Non-positive amounts and
    /// self-debts are ignored.
    pub fn increment(&mut self, debtor: &str, creditor: &str, amount: Money) {
        if debtor == creditor || !amount.is_positive() {
            return;
        }
        *self
            .0
            .entry(debtor.to_string())
            .or_default()
            .entry(creditor.to_string())
            .or_insert(Money::ZERO) += amount;
    }

    /// Overwrites the entry; a non-positive amount removes it.
    pub fn set(&mut self, debtor: &str, creditor: &str, amount: Money) {
        if amount.is_positive() {
            self.0
                .entry(debtor.to_string())
                .or_default()
                .insert(creditor.to_string(), amount);
        } else {
            self.remove(debtor, creditor);
        }
    }

    pub fn remove(&mut self, debtor: &str, creditor: &str) -> Option<Money> {
        let row = self.0.get_mut(debtor)?;
        let removed = row.remove(creditor);
        if row.is_empty() {
            self.0.remove(debtor);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of (debtor, creditor) entries.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, Money)> {
        self.0.iter().flat_map(|(debtor, row)| {
            row.iter()
                .map(move |(creditor, amount)| (debtor.as_str(), creditor.as_str(), *amount))
        })
    }

    /// True when no pair owes each other in both directions.
    pub fn is_simplified(&self) -> bool {
        self.iter()
            .all(|(debtor, creditor, _)| self.get(creditor, debtor).is_none())
    }
}
