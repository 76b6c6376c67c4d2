pub mod quote;
pub mod reconcile;
pub mod schedule;
