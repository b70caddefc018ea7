//! Query functions, one module per table.

pub mod audit_events;
pub mod households;
pub mod meals;
pub mod plan_days;
pub mod plans;
