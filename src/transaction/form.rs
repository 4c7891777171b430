//! The JSON body for creating and editing income and expense records.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error,
    account::RequestContext,
    transaction::{NewTransaction, Recurrence, TransactionKind, normalize_tags, parse_iso_date},
};

/// Tags as either a list or a single comma-separated string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    /// e.g. `["food", "weekly"]`
    List(Vec<String>),
    /// e.g. `"food, weekly"`
    Csv(String),
}

impl TagsInput {
    fn into_tags(self) -> Vec<String> {
        match self {
            Self::List(tags) => normalize_tags(tags),
            Self::Csv(tags) => normalize_tags(tags.split(',')),
        }
    }
}

/// The body for creating or editing a record.
///
/// Every field is optional so that missing fields can be reported by name
/// instead of as a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The income source or expense category. Also accepted as `source` or `category`.
    #[serde(alias = "source", alias = "category")]
    pub subject: Option<String>,
    /// A positive whole number of minor currency units, as a number or a numeric string.
    pub amount: Option<Value>,
    /// The date of the occurrence, e.g. "2025-01-15".
    pub date: Option<String>,
    /// The tags of the record.
    pub tags: Option<TagsInput>,
    /// One of "once", "monthly" or "bi-weekly". Defaults to "once".
    pub recurring: Option<String>,
    /// The last date a recurring record may repeat on. Empty means no end.
    pub end_date: Option<String>,
    /// Set to `false` to save a recurring record that will not repeat.
    pub head: Option<bool>,
    /// An optional icon identifier.
    pub icon: Option<String>,
}

impl TransactionForm {
    /// Validate the form and build a record of `kind` for the caller in `context`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::MissingField] if the subject, amount or date is missing,
    /// - [Error::InvalidAmount] if the amount is not a positive whole number,
    /// - [Error::InvalidDate] if a date cannot be parsed,
    /// - or [Error::InvalidRecurrence] if the recurrence is unknown.
    pub fn to_new(
        &self,
        kind: TransactionKind,
        context: &RequestContext,
    ) -> Result<NewTransaction, Error> {
        let subject = self
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|subject| !subject.is_empty())
            .ok_or(Error::MissingField(kind.subject_field()))?;
        let amount = parse_amount(self.amount.as_ref().ok_or(Error::MissingField("amount"))?)?;
        let date = match non_empty(self.date.as_deref()) {
            Some(date) => parse_iso_date("date", date)?,
            None => return Err(Error::MissingField("date")),
        };
        let recurring = match non_empty(self.recurring.as_deref()) {
            Some(recurring) => recurring.parse::<Recurrence>()?,
            None => Recurrence::Once,
        };
        let end_date = non_empty(self.end_date.as_deref())
            .map(|end_date| parse_iso_date("endDate", end_date))
            .transpose()?;

        let mut transaction = NewTransaction {
            account_id: Some(context.account.id),
            created_by: context.user_id,
            tags: self.tags.clone().map(TagsInput::into_tags).unwrap_or_default(),
            icon: non_empty(self.icon.as_deref()).map(str::to_owned),
            ..NewTransaction::build(kind, context.user_id, subject, amount, date)
        }
        .recurring(recurring, end_date);
        transaction.head = transaction.head && self.head.unwrap_or(true);
        transaction.validate()?;

        Ok(transaction)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Parse an amount given as a JSON number or a numeric string.
fn parse_amount(value: &Value) -> Result<i64, Error> {
    let invalid = || Error::InvalidAmount(value.to_string());

    let amount = match value {
        Value::Number(number) => match number.as_i64() {
            Some(amount) => amount,
            None => number
                .as_f64()
                .filter(|amount| amount.fract() == 0.0 && amount.abs() < i64::MAX as f64)
                .map(|amount| amount as i64)
                .ok_or_else(invalid)?,
        },
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if amount <= 0 {
        return Err(invalid());
    }

    Ok(amount)
}
