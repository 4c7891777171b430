//! Defines the transaction store trait.

use time::Date;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{NewTransaction, Transaction, TransactionChanges, TransactionFilter, TransactionKind},
};

/// Handles the creation, retrieval and modification of records of one [TransactionKind].
pub trait TransactionStore {
    /// The kind of record this store holds.
    fn kind(&self) -> TransactionKind;

    /// Save a new record, assigning its ID.
    fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Retrieve a record by its ID.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Retrieve the records selected by `filter`.
    fn find(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error>;

    /// Write the fields of `changes` that are `Some` to the record `id`.
    fn update(&self, id: TransactionId, changes: TransactionChanges) -> Result<Transaction, Error>;

    /// Delete the record `id`.
    fn delete(&self, id: TransactionId) -> Result<(), Error>;

    /// Move the frontier of `head`'s chain to a new occurrence on `date`.
    ///
    /// Implementers must demote `head` and create its successor as one
    /// atomic step, and only if `head` is still a head in the store.
    /// Returns `None` without changing anything when another caller already
    /// advanced the chain.
    fn advance_head(&self, head: &Transaction, date: Date) -> Result<Option<Transaction>, Error>;

    /// Demote the head `id` at the end of its chain, leaving the chain without a head.
    ///
    /// Returns `false` if the record was no longer a head.
    fn retire_head(&self, id: TransactionId) -> Result<bool, Error>;
}
