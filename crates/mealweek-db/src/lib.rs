//! Postgres storage for households, meals, weekly plans, and audit events.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
