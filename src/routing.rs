//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
};

use crate::{
    AppState, Error,
    account::{
        add_member_endpoint, create_account_endpoint, delete_account_endpoint, get_members,
        get_my_accounts, remove_member_endpoint, user_guard,
    },
    endpoints,
    logging::logging_middleware,
    summary::get_summary,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_upcoming,
        list_transactions, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except [endpoints::COFFEE] requires the `X-User-Id` header.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::COFFEE, get(get_coffee));

    let protected_routes = Router::new()
        .route(endpoints::SUMMARY, get(get_summary))
        .route(
            endpoints::ACCOUNTS,
            get(get_my_accounts).post(create_account_endpoint),
        )
        .route(endpoints::ACCOUNT, delete(delete_account_endpoint))
        .route(
            endpoints::ACCOUNT_MEMBERS,
            get(get_members).post(add_member_endpoint),
        )
        .route(endpoints::ACCOUNT_MEMBER, delete(remove_member_endpoint))
        .route(
            endpoints::LEDGER,
            get(list_transactions).post(create_transaction_endpoint),
        )
        .route(endpoints::UPCOMING, get(get_upcoming))
        .route(
            endpoints::LEDGER_RECORD,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .layer(middleware::from_fn(user_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::{account::context::USER_ID_HEADER, build_router, test_utils::get_test_app_state};

    fn get_test_server() -> TestServer {
        TestServer::new(build_router(get_test_app_state()))
    }

    #[tokio::test]
    async fn coffee_does_not_need_a_user() {
        let response = get_test_server().get("/api/coffee").await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
        response.assert_text("I'm a teapot");
    }

    #[tokio::test]
    async fn ledger_routes_need_a_user() {
        let response = get_test_server().get("/api/income").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = get_test_server()
            .get("/api/income/1/extra")
            .add_header(USER_ID_HEADER, "1")
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn accounts_route_is_not_a_ledger_kind() {
        let response = get_test_server()
            .get("/api/accounts")
            .add_header(USER_ID_HEADER, "1")
            .await;

        response.assert_status_ok();
    }
}
