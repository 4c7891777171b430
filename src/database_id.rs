//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of an income or expense record.
pub type TransactionId = DatabaseId;

/// The ID of a personal or shared account.
pub type AccountId = DatabaseId;

/// The ID of a user.
///
/// Users are managed by an external identity provider, the ledger only ever
/// stores their IDs.
pub type UserId = DatabaseId;
