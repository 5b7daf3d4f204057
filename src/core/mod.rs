pub mod errors;
pub mod ledger;
pub mod locks;
pub mod models;
pub mod money;
pub mod services;
