//! Group ledger engine: balance map, splits, simplification, settlement.
//!
//! Everything here is pure and synchronous; the service layer owns loading,
//! locking and persisting groups.

pub mod balance_map;
pub mod mutator;
pub mod settle;
pub mod simplify;
pub mod split;

pub use balance_map::BalanceMap;
pub use mutator::{Payment, add_expense, recompute_balances, record_settlement, remove_expense, rename_member};
pub use settle::SettleOutcome;
pub use simplify::simplify;
pub use split::compute_split;
