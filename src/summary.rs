//! Income and expense totals for a window of dates.
//!
//! Provides the aggregation used by the summary endpoint: total income, total
//! expenses, the balance between them and expenses grouped by tag.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    clock::Clock,
    database_id::UserId,
    transaction::{
        AccountScope, LedgerState, RecurringEngine, Transaction, TransactionFilter,
        TransactionKind, TransactionStore, resolve_window,
    },
};

/// The label for expenses without tags.
pub const UNTAGGED_LABEL: &str = "Untagged";

/// The total amount spent on one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagTotal {
    /// The tag, or [UNTAGGED_LABEL].
    pub tag: String,
    /// The sum of the amounts of expenses with the tag.
    pub total: i64,
}

/// The totals for a set of income and expense records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all income.
    pub total_income: i64,
    /// The sum of all expenses.
    pub total_expenses: i64,
    /// Income minus expenses.
    pub balance: i64,
    /// Expense totals per tag, largest first.
    ///
    /// An expense with several tags counts towards each of them.
    pub expenses_by_tag: Vec<TagTotal>,
}

/// Aggregate `incomes` and `expenses` into a [Summary].
///
/// # Errors
/// Returns [Error::TotalOverflow] if a total does not fit in an `i64`.
pub fn summarize(incomes: &[Transaction], expenses: &[Transaction]) -> Result<Summary, Error> {
    let total_income = total(incomes)?;
    let total_expenses = total(expenses)?;

    let mut by_tag: HashMap<&str, i64> = HashMap::new();

    for expense in expenses {
        if expense.tags.is_empty() {
            add_to(by_tag.entry(UNTAGGED_LABEL).or_insert(0), expense.amount)?;
        }

        for tag in &expense.tags {
            add_to(by_tag.entry(tag.as_str()).or_insert(0), expense.amount)?;
        }
    }

    let mut expenses_by_tag: Vec<TagTotal> = by_tag
        .into_iter()
        .map(|(tag, total)| TagTotal {
            tag: tag.to_owned(),
            total,
        })
        .collect();
    expenses_by_tag.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.tag.cmp(&b.tag)));

    Ok(Summary {
        total_income,
        total_expenses,
        balance: total_income
            .checked_sub(total_expenses)
            .ok_or(Error::TotalOverflow)?,
        expenses_by_tag,
    })
}

fn total(records: &[Transaction]) -> Result<i64, Error> {
    records.iter().try_fold(0_i64, |total, record| {
        total.checked_add(record.amount).ok_or(Error::TotalOverflow)
    })
}

fn add_to(total: &mut i64, amount: i64) -> Result<(), Error> {
    *total = total.checked_add(amount).ok_or(Error::TotalOverflow)?;

    Ok(())
}

/// The query parameters for the summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    /// A named window ending today: "4w", "3m", "6m" or "12m".
    pub range: Option<String>,
    /// The first date of an explicit window.
    pub start: Option<String>,
    /// The last date of an explicit window.
    pub end: Option<String>,
}

/// A route handler that materializes both kinds of records, then returns the
/// totals for the requested window in the caller's account.
pub async fn get_summary(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    headers: HeaderMap,
    Query(query): Query<SummaryQuery>,
) -> Response {
    match summary(&state, user_id, &headers, &query) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_response(),
    }
}

fn summary(
    state: &LedgerState,
    user_id: UserId,
    headers: &HeaderMap,
    query: &SummaryQuery,
) -> Result<Summary, Error> {
    let window = resolve_window(
        query.range.as_deref(),
        query.start.as_deref(),
        query.end.as_deref(),
        state.clock.today(),
    )?;
    let context = state.context(user_id, headers)?;
    let filter = TransactionFilter::new(AccountScope::for_account(&context.account, user_id));

    let records_of = |kind: TransactionKind| -> Result<Vec<Transaction>, Error> {
        let store = state.store(kind);
        RecurringEngine::new(&store, state.clock.as_ref()).materialize(&filter)?;
        store.find(&filter.clone().within(window))
    };

    let incomes = records_of(TransactionKind::Income)?;
    let expenses = records_of(TransactionKind::Expense)?;

    summarize(&incomes, &expenses)
}
