use super::balance_map::BalanceMap;
use crate::core::money::Money;
use std::collections::BTreeSet;

/// Nets out reciprocal debts.
///
/// Each unordered pair is visited once. The larger direction keeps the
/// difference, and a pair that nets to zero disappears from the result.
pub fn simplify(raw: &BalanceMap) -> BalanceMap {
    let mut visited: BTreeSet<(&str, &str)> = BTreeSet::new();
    let mut simplified = BalanceMap::new();

    for (debtor, creditor, owed) in raw.iter() {
        let pair = if debtor < creditor {
            (debtor, creditor)
        } else {
            (creditor, debtor)
        };
        if !visited.insert(pair) {
            continue;
        }

        let reverse = raw.get(creditor, debtor).unwrap_or(Money::ZERO);
        let net = owed - reverse;
        if net.is_positive() {
            simplified.set(debtor, creditor, net);
        } else if net.is_negative() {
            simplified.set(creditor, debtor, net.abs());
        }
    }

    simplified
}
