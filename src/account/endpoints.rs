//! Route handlers for listing, creating and managing accounts and their members.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    account::{
        Account, Member, RequestContext, add_member, create_shared_account,
        get_or_create_personal_account, get_shared_accounts_for_member, list_members,
        remove_member, resolve_context, soft_delete_account,
    },
    database_id::{AccountId, UserId},
    db::lock,
};

/// The state needed to manage accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The accounts a user can work in.
#[derive(Debug, Serialize, PartialEq)]
pub struct MyAccounts {
    /// The user's personal account.
    pub personal: Account,
    /// The shared accounts the user is a member of.
    pub shared: Vec<Account>,
}

/// The body for creating a shared account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The name of the account.
    #[serde(default)]
    pub name: String,
}

/// The body for adding a member to an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberForm {
    /// The user to add.
    pub user_id: UserId,
}

/// A route handler that lists the caller's personal and shared accounts.
pub async fn get_my_accounts(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match lock(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match my_accounts(user_id, &connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

fn my_accounts(user_id: UserId, connection: &Connection) -> Result<MyAccounts, Error> {
    Ok(MyAccounts {
        personal: get_or_create_personal_account(user_id, connection)?,
        shared: get_shared_accounts_for_member(user_id, connection)?,
    })
}

/// A route handler that creates a shared account owned by the caller.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<AccountForm>,
) -> Response {
    let connection = match lock(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match create_shared_account(&form.name, user_id, &connection) {
        Ok(account) => {
            tracing::info!("User {user_id} created shared account {}", account.id);
            (StatusCode::CREATED, Json(json!({ "account": account }))).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// A route handler that lists the members of an account the caller belongs to.
pub async fn get_members(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match lock(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    match resolve_context(user_id, Some(account_id), &connection) {
        Ok(context) => Json::<Vec<Member>>(list_members(&context.account)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler that adds a member to an account owned by the caller.
pub async fn add_member_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Json(form): Json<MemberForm>,
) -> Response {
    let connection = match lock(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let result = owner_context(user_id, account_id, &connection)
        .and_then(|context| add_member(&context.account, form.user_id, &connection));

    match result {
        Ok(account) => {
            tracing::info!("Added user {} to account {account_id}", form.user_id);
            (StatusCode::CREATED, Json(list_members(&account))).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// A route handler that removes a member from an account owned by the caller.
pub async fn remove_member_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Path((account_id, member_id)): Path<(AccountId, UserId)>,
) -> Response {
    let connection = match lock(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let result = owner_context(user_id, account_id, &connection)
        .and_then(|context| remove_member(&context.account, member_id, &connection));

    match result {
        Ok(account) => {
            tracing::info!("Removed user {member_id} from account {account_id}");
            Json(json!({ "message": "Member removed", "members": account.members }))
                .into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// A route handler that deletes a shared account owned by the caller.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match lock(&state.db_connection) {
        Ok(connection) => connection,
        Err(error) => return error.into_response(),
    };

    let result = owner_context(user_id, account_id, &connection)
        .and_then(|context| soft_delete_account(&context.account, &connection));

    match result {
        Ok(()) => {
            tracing::info!("User {user_id} deleted account {account_id}");
            Json(json!({ "message": "Account deleted" })).into_response()
        }
        Err(error) => error.into_response(),
    }
}

fn owner_context(
    user_id: UserId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<RequestContext, Error> {
    let context = resolve_context(user_id, Some(account_id), connection)?;

    if !context.is_owner() {
        return Err(Error::OwnerOnly);
    }

    Ok(context)
}
