//! Port traits the domain is consumed through.

pub mod config_port;
pub mod trade_port;
pub mod user_port;
