//! Builds the predicates used to select records from a [TransactionStore](super::TransactionStore).

use time::Date;

use crate::{
    account::{Account, AccountKind},
    database_id::{AccountId, UserId},
    transaction::{DateWindow, Transaction},
};

/// Which records a request may see.
///
/// A record is in scope if it belongs to `account_id`, **or** if it is a
/// legacy record (no account) owned by `legacy_owner`. Legacy records predate
/// accounts, so they are only visible from a personal account. When both
/// fields are `None` every record is in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountScope {
    /// Include records that belong to this account.
    pub account_id: Option<AccountId>,
    /// Include records without an account that are owned by this user.
    pub legacy_owner: Option<UserId>,
}

impl AccountScope {
    /// The scope for `user_id` working in `account`.
    pub fn for_account(account: &Account, user_id: UserId) -> Self {
        Self {
            account_id: Some(account.id),
            legacy_owner: (account.kind == AccountKind::Personal).then_some(user_id),
        }
    }

    /// Whether `transaction` is in this scope.
    pub fn contains(&self, transaction: &Transaction) -> bool {
        if self.account_id.is_none() && self.legacy_owner.is_none() {
            return true;
        }

        let in_account = self.account_id.is_some() && transaction.account_id == self.account_id;
        let legacy = transaction.account_id.is_none()
            && self.legacy_owner == Some(transaction.owner_user_id);

        in_account || legacy
    }
}

/// The order to sort records by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// Defines which records [TransactionStore::find](super::TransactionStore::find) returns.
///
/// All conditions are combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// The account and legacy records to search.
    pub scope: AccountScope,
    /// Only include records created by this user.
    pub created_by: Option<UserId>,
    /// Only include records with at least one of these tags. Empty means any tags.
    pub tags: Vec<String>,
    /// Only include records dated within this window.
    pub date_range: Option<DateWindow>,
    /// Only include the heads of monthly or bi-weekly chains.
    pub recurring_heads_only: bool,
    /// Only include records without an end date or whose end date is on or after this date.
    pub active_on: Option<Date>,
    /// Sort by date, ties broken by ID. `None` leaves the order unspecified.
    pub sort_date: Option<SortOrder>,
}

impl TransactionFilter {
    /// A filter that selects everything in `scope`.
    pub fn new(scope: AccountScope) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }

    /// Restrict to records created by `user_id`, if given.
    pub fn created_by(mut self, user_id: Option<UserId>) -> Self {
        self.created_by = user_id;
        self
    }

    /// Restrict to records with any of `tags`.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Restrict to records dated within `window`, if given.
    pub fn within(mut self, window: Option<DateWindow>) -> Self {
        self.date_range = window;
        self
    }

    /// Restrict to the heads of recurring chains.
    pub fn recurring_heads(mut self) -> Self {
        self.recurring_heads_only = true;
        self
    }

    /// Restrict to chains that have not ended before `date`.
    pub fn active_on(mut self, date: Date) -> Self {
        self.active_on = Some(date);
        self
    }

    /// Sort the results by date.
    pub fn sorted(mut self, order: SortOrder) -> Self {
        self.sort_date = Some(order);
        self
    }
}
