//! Defines the core data models for income and expense records.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    Error,
    database_id::{AccountId, TransactionId, UserId},
};

// ============================================================================
// KINDS
// ============================================================================

/// Whether a record is money earned or money spent.
///
/// Income and expenses have exactly the same shape, they only differ in the
/// table they are stored in and the name of their free-text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, labelled by its source (e.g., "Salary").
    Income,
    /// Money spent, labelled by its category (e.g., "Groceries").
    Expense,
}

impl TransactionKind {
    /// Both kinds, income first.
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Income, TransactionKind::Expense];

    /// The name of the table that records of this kind are stored in.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// The name of the free-text label field, used both as the column name
    /// and as the JSON key.
    pub fn subject_field(self) -> &'static str {
        match self {
            Self::Income => "source",
            Self::Expense => "category",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// How often a record repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recurrence {
    /// A one-off record, or a historical occurrence of a recurring chain.
    #[serde(rename = "once")]
    Once,
    /// Repeats on the same day of every calendar month.
    #[serde(rename = "monthly")]
    Monthly,
    /// Repeats every 14 days.
    #[serde(rename = "bi-weekly")]
    BiWeekly,
}

impl Recurrence {
    /// The string used for this recurrence in storage and over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Monthly => "monthly",
            Self::BiWeekly => "bi-weekly",
        }
    }

    /// Whether this recurrence generates further occurrences.
    pub fn is_recurring(self) -> bool {
        self != Self::Once
    }
}

impl FromStr for Recurrence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(Self::Once),
            "monthly" => Ok(Self::Monthly),
            "bi-weekly" => Ok(Self::BiWeekly),
            other => Err(Error::InvalidRecurrence(other.to_owned())),
        }
    }
}

impl ToSql for Recurrence {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Recurrence {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

// ============================================================================
// MODELS
// ============================================================================

/// A persisted income or expense record.
///
/// To create a new record, build a [NewTransaction] and pass it to a
/// [TransactionStore](super::TransactionStore).
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the record.
    pub id: TransactionId,
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// The user whose personal ledger the record belongs to.
    ///
    /// Only used for scoping legacy records that have no `account_id`.
    pub owner_user_id: UserId,
    /// The personal or shared account the record belongs to.
    pub account_id: Option<AccountId>,
    /// The user who created this specific record.
    pub created_by: UserId,
    /// The category name (expenses) or income source name (income).
    pub subject: String,
    /// An optional icon identifier chosen by the user.
    pub icon: Option<String>,
    /// The amount in minor currency units (e.g., cents). Always positive.
    pub amount: i64,
    /// The date of this occurrence.
    pub date: Date,
    /// Free-text labels, in the order they were added.
    pub tags: Vec<String>,
    /// How often the record repeats.
    pub recurring: Recurrence,
    /// The last date on which an occurrence may be generated.
    pub end_date: Option<Date>,
    /// Whether this record is the frontier of its recurring chain.
    pub head: bool,
}

impl Transaction {
    /// The fields of this record without its ID.
    pub fn to_new(&self) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            owner_user_id: self.owner_user_id,
            account_id: self.account_id,
            created_by: self.created_by,
            subject: self.subject.clone(),
            icon: self.icon.clone(),
            amount: self.amount,
            date: self.date,
            tags: self.tags.clone(),
            recurring: self.recurring,
            end_date: self.end_date,
            head: self.head,
        }
    }

    /// The next occurrence of this record's chain on `date`.
    ///
    /// The occurrence is a new head that keeps this record's recurrence and end date.
    pub fn successor(&self, date: Date) -> NewTransaction {
        NewTransaction {
            date,
            head: true,
            ..self.to_new()
        }
    }
}

/// The fields of an income or expense record that has not been saved.
///
/// Projected (upcoming) occurrences are also returned as [NewTransaction]s:
/// they have no ID and therefore cannot be edited or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// The user whose personal ledger the record belongs to.
    pub owner_user_id: UserId,
    /// The personal or shared account the record belongs to.
    pub account_id: Option<AccountId>,
    /// The user who created the record.
    pub created_by: UserId,
    /// The category name (expenses) or income source name (income).
    pub subject: String,
    /// An optional icon identifier chosen by the user.
    pub icon: Option<String>,
    /// The amount in minor currency units (e.g., cents).
    pub amount: i64,
    /// The date of the occurrence.
    pub date: Date,
    /// Free-text labels, in the order they were added.
    pub tags: Vec<String>,
    /// How often the record repeats.
    pub recurring: Recurrence,
    /// The last date on which an occurrence may be generated.
    pub end_date: Option<Date>,
    /// Whether this record is the frontier of its recurring chain.
    pub head: bool,
}

impl NewTransaction {
    /// Create a one-off record owned and created by `user_id`.
    ///
    /// Use struct update syntax to set the optional fields.
    pub fn build(
        kind: TransactionKind,
        user_id: UserId,
        subject: &str,
        amount: i64,
        date: Date,
    ) -> Self {
        Self {
            kind,
            owner_user_id: user_id,
            account_id: None,
            created_by: user_id,
            subject: subject.to_owned(),
            icon: None,
            amount,
            date,
            tags: Vec::new(),
            recurring: Recurrence::Once,
            end_date: None,
            head: false,
        }
    }

    /// Make this record the head of a new recurring chain.
    pub fn recurring(mut self, recurring: Recurrence, end_date: Option<Date>) -> Self {
        self.recurring = recurring;
        self.end_date = end_date;
        self.head = recurring.is_recurring();
        self
    }

    /// Check the record can be saved.
    ///
    /// # Errors
    /// Returns [Error::MissingField] if the subject is blank, or
    /// [Error::InvalidAmount] if the amount is not positive.
    pub fn validate(&self) -> Result<(), Error> {
        validate_subject(self.kind, &self.subject)?;
        validate_amount(self.amount)
    }
}

#[cfg(test)]
impl NewTransaction {
    /// The record as it would be after being saved with `id`.
    pub fn saved_as(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            owner_user_id: self.owner_user_id,
            account_id: self.account_id,
            created_by: self.created_by,
            subject: self.subject,
            icon: self.icon,
            amount: self.amount,
            date: self.date,
            tags: self.tags,
            recurring: self.recurring,
            end_date: self.end_date,
            head: self.head,
        }
    }
}

/// A partial update of a record. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionChanges {
    /// The new label.
    pub subject: Option<String>,
    /// The new icon, `Some(None)` clears it.
    pub icon: Option<Option<String>>,
    /// The new amount in minor currency units.
    pub amount: Option<i64>,
    /// The new occurrence date.
    pub date: Option<Date>,
    /// The new tags.
    pub tags: Option<Vec<String>>,
    /// The new recurrence.
    pub recurring: Option<Recurrence>,
    /// The new end date, `Some(None)` removes the boundary.
    pub end_date: Option<Option<Date>>,
    /// The new head flag.
    pub head: Option<bool>,
}

impl TransactionChanges {
    /// The changes that overwrite every user-editable field with those of `transaction`.
    ///
    /// The owner, account and creator of the edited record are kept.
    pub fn replace_with(transaction: NewTransaction) -> Self {
        Self {
            subject: Some(transaction.subject),
            icon: Some(transaction.icon),
            amount: Some(transaction.amount),
            date: Some(transaction.date),
            tags: Some(transaction.tags),
            recurring: Some(transaction.recurring),
            end_date: Some(transaction.end_date),
            head: Some(transaction.head),
        }
    }

    /// Check the changes can be saved to a record of `kind`.
    pub fn validate(&self, kind: TransactionKind) -> Result<(), Error> {
        if let Some(subject) = &self.subject {
            validate_subject(kind, subject)?;
        }

        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }

        Ok(())
    }
}

fn validate_subject(kind: TransactionKind, subject: &str) -> Result<(), Error> {
    if subject.trim().is_empty() {
        return Err(Error::MissingField(kind.subject_field()));
    }

    Ok(())
}

fn validate_amount(amount: i64) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    Ok(())
}

// ============================================================================
// PARSING HELPERS
// ============================================================================

/// Trim tags, drop empty ones and remove duplicates while keeping the order
/// in which the tags were first given.
pub fn normalize_tags<I, T>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();

    for tag in tags {
        let tag = tag.as_ref().trim();

        if !tag.is_empty() && !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_owned());
        }
    }

    normalized
}

/// Parse an ISO 8601 date such as "2025-01-15".
///
/// Full timestamps are reduced to a calendar date. A timestamp with an offset,
/// such as "2025-01-15T23:00:00-05:00", is converted to UTC first (giving
/// 2025-01-16); one without an offset keeps its date part.
///
/// # Errors
/// Returns [Error::InvalidDate] naming `field` if `text` is not a valid date.
pub fn parse_iso_date(field: &'static str, text: &str) -> Result<Date, Error> {
    let text = text.trim();
    let date_part = match text.split_once('T') {
        Some((date, _)) => match OffsetDateTime::parse(text, &Rfc3339) {
            Ok(timestamp) => return Ok(timestamp.to_offset(UtcOffset::UTC).date()),
            Err(_) => date,
        },
        None => text,
    };

    Date::parse(date_part, format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate(field, text.to_owned()))
}

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Borrowed view of the fields shared by [Transaction] and [NewTransaction].
struct RecordFields<'a> {
    kind: TransactionKind,
    owner_user_id: UserId,
    account_id: Option<AccountId>,
    created_by: UserId,
    subject: &'a str,
    icon: Option<&'a str>,
    amount: i64,
    date: Date,
    tags: &'a [String],
    recurring: Recurrence,
    end_date: Option<Date>,
    head: bool,
}

impl RecordFields<'_> {
    const FIELD_COUNT: usize = 12;

    fn serialize_into<S: SerializeStruct>(&self, state: &mut S) -> Result<(), S::Error> {
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("ownerUserId", &self.owner_user_id)?;
        state.serialize_field("accountId", &self.account_id)?;
        state.serialize_field("createdBy", &self.created_by)?;
        state.serialize_field(self.kind.subject_field(), self.subject)?;
        state.serialize_field("icon", &self.icon)?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("date", &self.date)?;
        state.serialize_field("tags", self.tags)?;
        state.serialize_field("recurring", &self.recurring)?;
        state.serialize_field("endDate", &self.end_date)?;
        state.serialize_field("head", &self.head)
    }
}

impl Transaction {
    fn fields(&self) -> RecordFields<'_> {
        RecordFields {
            kind: self.kind,
            owner_user_id: self.owner_user_id,
            account_id: self.account_id,
            created_by: self.created_by,
            subject: &self.subject,
            icon: self.icon.as_deref(),
            amount: self.amount,
            date: self.date,
            tags: &self.tags,
            recurring: self.recurring,
            end_date: self.end_date,
            head: self.head,
        }
    }
}

impl NewTransaction {
    fn fields(&self) -> RecordFields<'_> {
        RecordFields {
            kind: self.kind,
            owner_user_id: self.owner_user_id,
            account_id: self.account_id,
            created_by: self.created_by,
            subject: &self.subject,
            icon: self.icon.as_deref(),
            amount: self.amount,
            date: self.date,
            tags: &self.tags,
            recurring: self.recurring,
            end_date: self.end_date,
            head: self.head,
        }
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state =
            serializer.serialize_struct("Transaction", RecordFields::FIELD_COUNT + 1)?;
        state.serialize_field("id", &self.id)?;
        self.fields().serialize_into(&mut state)?;
        state.end()
    }
}

impl Serialize for NewTransaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NewTransaction", RecordFields::FIELD_COUNT)?;
        self.fields().serialize_into(&mut state)?;
        state.end()
    }
}
