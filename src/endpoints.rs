//! The API endpoints URIs.
//!
//! Paths with a `{kind}` parameter serve both income and expenses, where
//! `kind` is either "income" or "expense".

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for the income and expense totals.
pub const SUMMARY: &str = "/api/summary";
/// The route to list the caller's accounts and create shared accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to delete a shared account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to list and add the members of an account.
pub const ACCOUNT_MEMBERS: &str = "/api/accounts/{account_id}/members";
/// The route to remove a member from an account.
pub const ACCOUNT_MEMBER: &str = "/api/accounts/{account_id}/members/{user_id}";
/// The route to list and create records of one kind.
pub const LEDGER: &str = "/api/{kind}";
/// The route for the projected occurrences of recurring records.
pub const UPCOMING: &str = "/api/{kind}/upcoming";
/// The route to update or delete a single record.
pub const LEDGER_RECORD: &str = "/api/{kind}/{id}";
