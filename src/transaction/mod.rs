//! Income and expense records and their recurring chains.
//!
//! This module contains:
//! - The record models shared by income and expenses
//! - Date stepping, listing windows and query filters
//! - The record store trait and its SQLite implementation
//! - The engine that materializes and projects recurring chains
//! - The route handlers for the ledger API

mod core;
mod endpoints;
mod engine;
mod filter;
mod form;
mod permissions;
mod range;
mod schedule;
mod sqlite;
mod store;

pub use core::{
    NewTransaction, Recurrence, Transaction, TransactionChanges, TransactionKind, normalize_tags,
    parse_iso_date,
};
pub use endpoints::{
    LedgerState, create_transaction_endpoint, delete_transaction_endpoint, get_upcoming,
    list_transactions, update_transaction_endpoint,
};
pub use engine::{MaterializeReport, RecurringEngine};
pub use filter::{AccountScope, SortOrder, TransactionFilter};
pub use form::TransactionForm;
pub use permissions::check_can_modify;
pub use range::{DateWindow, RangePreset, resolve_window};
pub use schedule::{next_occurrence, occurrences};
pub use sqlite::{SQLiteTransactionStore, create_transaction_tables};
pub use store::TransactionStore;
