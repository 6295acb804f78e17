pub mod api;
pub mod auth;
pub mod balance;
pub mod config;
pub mod error;
pub mod expense_ledger;
pub mod lead_status;
pub mod records;
pub mod sales_returns;
pub mod session;
pub mod store;
