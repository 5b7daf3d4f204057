use crate::core::errors::LedgerError;
use crate::core::models::group::SplitType;
use crate::core::money::Money;
use std::collections::BTreeMap;

/// Computes the owed share of every participant for an expense.
///
/// `participants` is in group order (owner first). For an equal split, any
/// leftover minor units go to the earliest participants so the shares add up
/// to `total` exactly. A custom split must name only participants, hold no
/// negative share and sum to `total`.
pub fn compute_split(
    total: Money,
    participants: &[String],
    split_type: SplitType,
    custom: Option<&BTreeMap<String, Money>>,
) -> Result<BTreeMap<String, Money>, LedgerError> {
    match split_type {
        SplitType::Equal => {
            let shares = total
                .allocate(participants.len())
                .ok_or_else(|| LedgerError::InvalidSplit("equal split needs at least one participant".to_string()))?;
            Ok(participants.iter().cloned().zip(shares).collect())
        }
        SplitType::Custom => {
            let custom = custom
                .filter(|c| !c.is_empty())
                .ok_or_else(|| LedgerError::InvalidSplit("custom split requires per-member amounts".to_string()))?;
            for (member, share) in custom {
                if !participants.contains(member) {
                    return Err(LedgerError::UnknownParticipant(member.clone()));
                }
                if share.is_negative() {
                    return Err(LedgerError::InvalidSplit(format!("share for {} is negative", member)));
                }
                if *share > total {
                    return Err(LedgerError::InvalidSplit(format!(
                        "share for {} exceeds the total of {}",
                        member, total
                    )));
                }
            }
            let sum = custom
                .values()
                .try_fold(Money::ZERO, |acc, share| acc.checked_add(*share))
                .ok_or_else(|| LedgerError::InvalidSplit("shares are too large to add up".to_string()))?;
            if sum != total {
                return Err(LedgerError::InvalidSplit(format!(
                    "shares sum to {} but the total is {}",
                    sum, total
                )));
            }
            Ok(custom.clone())
        }
    }
}
