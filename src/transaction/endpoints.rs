//! Route handlers for listing, projecting, creating, editing and deleting records.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
// axum_extra's Query collects repeated keys such as `tags=a&tags=b` into a Vec.
use axum_extra::extract::Query;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{RequestContext, account_id_from_headers, resolve_context},
    clock::Clock,
    database_id::{TransactionId, UserId},
    db::lock,
    transaction::{
        AccountScope, NewTransaction, RangePreset, RecurringEngine, SQLiteTransactionStore,
        SortOrder, Transaction, TransactionChanges, TransactionFilter, TransactionForm,
        TransactionKind, TransactionStore, check_can_modify, normalize_tags, resolve_window,
    },
};

/// The state needed to read and write income and expense records.
#[derive(Clone)]
pub struct LedgerState {
    /// The database connection for managing records and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The source of today's date.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

impl LedgerState {
    /// Resolve the caller's account from the request headers.
    ///
    /// The database lock is released before returning.
    pub fn context(&self, user_id: UserId, headers: &HeaderMap) -> Result<RequestContext, Error> {
        let requested = account_id_from_headers(headers)?;
        let connection = lock(&self.db_connection)?;

        resolve_context(user_id, requested, &connection)
    }

    /// The store for records of `kind`.
    pub fn store(&self, kind: TransactionKind) -> SQLiteTransactionStore {
        SQLiteTransactionStore::new(self.db_connection.clone(), kind)
    }
}

/// The query parameters for listing records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// A named window ending today: "4w", "3m", "6m" or "12m".
    pub range: Option<String>,
    /// The first date of an explicit window. Takes precedence over `range`.
    pub start: Option<String>,
    /// The last date of an explicit window.
    pub end: Option<String>,
    /// Only list records created by this user.
    pub created_by: Option<UserId>,
    /// Only list records with at least one of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The query parameters for projecting upcoming occurrences.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingQuery {
    /// The window starting today to project into: "4w", "3m", "6m" or "12m".
    pub range: Option<String>,
    /// Only project chains created by this user.
    pub created_by: Option<UserId>,
    /// Only project chains with at least one of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn base_filter(
    context: &RequestContext,
    created_by: Option<UserId>,
    tags: &[String],
) -> TransactionFilter {
    TransactionFilter::new(AccountScope::for_account(&context.account, context.user_id))
        .created_by(created_by)
        .tags(normalize_tags(tags))
}

/// A route handler that materializes due occurrences, then lists the records
/// of `kind` in the requested window, newest first.
pub async fn list_transactions(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    Path(kind): Path<TransactionKind>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    match list(&state, user_id, kind, &headers, &query) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

fn list(
    state: &LedgerState,
    user_id: UserId,
    kind: TransactionKind,
    headers: &HeaderMap,
    query: &ListQuery,
) -> Result<Vec<Transaction>, Error> {
    let window = resolve_window(
        query.range.as_deref(),
        query.start.as_deref(),
        query.end.as_deref(),
        state.clock.today(),
    )?;
    let context = state.context(user_id, headers)?;
    let store = state.store(kind);
    let filter = base_filter(&context, query.created_by, &query.tags);

    RecurringEngine::new(&store, state.clock.as_ref()).materialize(&filter)?;

    store.find(&filter.within(window).sorted(SortOrder::Descending))
}

/// A route handler that lists the occurrences of recurring records of `kind`
/// that will fall due within the requested window. Nothing is saved.
pub async fn get_upcoming(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    Path(kind): Path<TransactionKind>,
    headers: HeaderMap,
    Query(query): Query<UpcomingQuery>,
) -> Response {
    match upcoming(&state, user_id, kind, &headers, &query) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

fn upcoming(
    state: &LedgerState,
    user_id: UserId,
    kind: TransactionKind,
    headers: &HeaderMap,
    query: &UpcomingQuery,
) -> Result<Vec<NewTransaction>, Error> {
    let preset: RangePreset = query.range.as_deref().unwrap_or_default().trim().parse()?;
    let context = state.context(user_id, headers)?;
    let store = state.store(kind);
    let filter = base_filter(&context, query.created_by, &query.tags);

    RecurringEngine::new(&store, state.clock.as_ref()).project(&filter, preset)
}

/// A route handler for creating a record of `kind` in the caller's account.
pub async fn create_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    Path(kind): Path<TransactionKind>,
    headers: HeaderMap,
    Json(form): Json<TransactionForm>,
) -> Response {
    let result = state
        .context(user_id, &headers)
        .and_then(|context| form.to_new(kind, &context))
        .and_then(|transaction| state.store(kind).create(transaction));

    match result {
        Ok(transaction) => {
            tracing::debug!("User {user_id} created {kind} {}", transaction.id);
            (StatusCode::CREATED, Json(transaction)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// A route handler for replacing the user-editable fields of a record.
pub async fn update_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    Path((kind, id)): Path<(TransactionKind, TransactionId)>,
    headers: HeaderMap,
    Json(form): Json<TransactionForm>,
) -> Response {
    match update(&state, user_id, kind, id, &headers, &form) {
        Ok(transaction) => Json(transaction).into_response(),
        Err(error) => error.into_response(),
    }
}

fn update(
    state: &LedgerState,
    user_id: UserId,
    kind: TransactionKind,
    id: TransactionId,
    headers: &HeaderMap,
    form: &TransactionForm,
) -> Result<Transaction, Error> {
    let context = state.context(user_id, headers)?;
    let edited = form.to_new(kind, &context)?;
    let store = state.store(kind);
    let existing = store.get(id).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;

    check_can_modify(&existing, &context)?;

    let changes = TransactionChanges::replace_with(edited);
    changes.validate(kind)?;

    store.update(id, changes)
}

/// A route handler for deleting a record.
pub async fn delete_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    Path((kind, id)): Path<(TransactionKind, TransactionId)>,
    headers: HeaderMap,
) -> Response {
    let result = state.context(user_id, &headers).and_then(|context| {
        let store = state.store(kind);
        let existing = store.get(id).map_err(|error| match error {
            Error::NotFound => Error::DeleteMissingTransaction,
            error => error,
        })?;

        check_can_modify(&existing, &context)?;
        store.delete(id)
    });

    match result {
        Ok(()) => {
            tracing::debug!("User {user_id} deleted {kind} {id}");
            Json(json!({ "message": format!("Deleted {kind} {id}") })).into_response()
        }
        Err(error) => error.into_response(),
    }
}
