//! Core domain types and logic.

pub mod error;
pub mod pnl;
pub mod validation;
pub mod trade;
pub mod user;
pub mod listing;
pub mod summary;
pub mod config_validation;
