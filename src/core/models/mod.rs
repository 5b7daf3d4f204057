pub mod expense;
pub mod group;
pub mod settlement;
