//! Resolves who is making a request and which account they are working in.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    Error,
    account::{Account, ensure_owner_is_member, get_account, get_or_create_personal_account},
    database_id::{AccountId, UserId},
};

/// The header that identifies the caller. Set by the authenticating proxy in front of the server.
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// The header that selects the account to work in. Defaults to the caller's personal account.
pub const ACCOUNT_ID_HEADER: HeaderName = HeaderName::from_static("x-account-id");

/// The caller and the account their request applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The user making the request.
    pub user_id: UserId,
    /// The account the request applies to. The user is always a member.
    pub account: Account,
}

impl RequestContext {
    /// Whether the caller owns the current account.
    pub fn is_owner(&self) -> bool {
        self.account.is_owner(self.user_id)
    }
}

/// Middleware that reads the caller's user ID from the `x-user-id` header.
///
/// The ID is placed into the request extensions and then the request is
/// executed normally, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn user_guard(mut request: Request, next: Next) -> Response {
    let user_id = match user_id_from_headers(request.headers()) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(user_id);
    next.run(request).await
}

fn user_id_from_headers(headers: &HeaderMap) -> Result<UserId, Error> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or(Error::MissingUser)
}

/// Get the account requested with the `x-account-id` header, if any.
///
/// # Errors
/// Returns [Error::InvalidAccountId] if the header is not an ID.
pub fn account_id_from_headers(headers: &HeaderMap) -> Result<Option<AccountId>, Error> {
    let Some(value) = headers.get(ACCOUNT_ID_HEADER) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| Error::InvalidAccountId)?.trim();

    if value.is_empty() {
        return Ok(None);
    }

    value.parse().map(Some).map_err(|_| Error::InvalidAccountId)
}

/// Resolve the account `user_id` works in.
///
/// Without a requested account, the user's personal account is used and
/// created if needed. An owner missing from their account's members is added back.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the requested account does not exist or was deleted,
/// - [Error::NotAMember] if the user cannot access the account,
/// - or [Error::SqlError] if there is an SQL error.
pub fn resolve_context(
    user_id: UserId,
    requested: Option<AccountId>,
    connection: &Connection,
) -> Result<RequestContext, Error> {
    let account = match requested {
        Some(account_id) => get_account(account_id, connection)?,
        None => get_or_create_personal_account(user_id, connection)?,
    };

    let account = if account.is_owner(user_id) {
        ensure_owner_is_member(account, connection)?
    } else if account.is_member(user_id) {
        account
    } else {
        return Err(Error::NotAMember);
    };

    Ok(RequestContext { user_id, account })
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{AccountKind, add_member, create_shared_account, soft_delete_account},
        db::initialize,
    };

    use super::{
        ACCOUNT_ID_HEADER, USER_ID_HEADER, account_id_from_headers, resolve_context,
        user_id_from_headers,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn headers(name: axum::http::HeaderName, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn parses_user_id() {
        assert_eq!(user_id_from_headers(&headers(USER_ID_HEADER, " 42 ")), Ok(42));
        assert_eq!(
            user_id_from_headers(&headers(USER_ID_HEADER, "bob")),
            Err(Error::MissingUser)
        );
        assert_eq!(user_id_from_headers(&HeaderMap::new()), Err(Error::MissingUser));
    }

    #[test]
    fn parses_account_id() {
        assert_eq!(account_id_from_headers(&HeaderMap::new()), Ok(None));
        assert_eq!(account_id_from_headers(&headers(ACCOUNT_ID_HEADER, "")), Ok(None));
        assert_eq!(account_id_from_headers(&headers(ACCOUNT_ID_HEADER, "7")), Ok(Some(7)));
        assert_eq!(
            account_id_from_headers(&headers(ACCOUNT_ID_HEADER, "abc")),
            Err(Error::InvalidAccountId)
        );
    }

    #[test]
    fn defaults_to_personal_account() {
        let conn = get_test_connection();

        let context = resolve_context(5, None, &conn).unwrap();

        assert_eq!(context.user_id, 5);
        assert_eq!(context.account.kind, AccountKind::Personal);
        assert!(context.is_owner());
    }

    #[test]
    fn members_can_use_shared_account() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();
        let account = add_member(&account, 2, &conn).unwrap();

        let context = resolve_context(2, Some(account.id), &conn).unwrap();

        assert_eq!(context.account, account);
        assert!(!context.is_owner());
    }

    #[test]
    fn non_members_are_rejected() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();

        assert_eq!(
            resolve_context(2, Some(account.id), &conn),
            Err(Error::NotAMember)
        );
    }

    #[test]
    fn deleted_or_missing_accounts_are_not_found() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();
        soft_delete_account(&account, &conn).unwrap();

        assert_eq!(
            resolve_context(1, Some(account.id), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(resolve_context(1, Some(999), &conn), Err(Error::NotFound));
    }

    #[test]
    fn owner_is_added_back_to_members() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();
        conn.execute("DELETE FROM account_member", ()).unwrap();

        let context = resolve_context(1, Some(account.id), &conn).unwrap();

        assert_eq!(context.account.members, vec![1]);
    }
}
