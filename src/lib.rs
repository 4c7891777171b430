//! A shared ledger of income and expenses with recurring chains.
//!
//! Records belong to a personal or shared account. A recurring record is the
//! head of a chain: whenever the ledger is read, every occurrence of the chain
//! that is due by today is written as a concrete record, and the head moves to
//! the newest one.
//!
//! This library provides a JSON API for the ledger.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod account;
mod app_state;
mod clock;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod routing;
mod summary;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use clock::{Clock, FixedClock, LocalClock};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::TransactionKind;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The `range` query parameter is not one of the named windows.
    #[error("unknown range \"{0}\", expected one of 4w, 3m, 6m or 12m")]
    InvalidRange(String),

    /// An explicit window whose end is not after its start.
    #[error("the end date {end} must be after the start date {start}")]
    InvalidDateRange {
        /// The first date of the window.
        start: Date,
        /// The last date of the window.
        end: Date,
    },

    /// A date field could not be parsed as `YYYY-MM-DD`.
    ///
    /// Holds the name of the field and the text that was sent.
    #[error("invalid {0} \"{1}\", expected a date formatted as YYYY-MM-DD")]
    InvalidDate(&'static str, String),

    /// An amount that is not a positive whole number.
    #[error("invalid amount \"{0}\", expected a positive whole number")]
    InvalidAmount(String),

    /// A required field was not sent.
    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    /// A recurrence other than once, monthly or bi-weekly.
    #[error("invalid recurrence \"{0}\", expected one of once, monthly or bi-weekly")]
    InvalidRecurrence(String),

    /// A sum of amounts is too large to represent.
    #[error("the total of the amounts is too large")]
    TotalOverflow,

    /// The account header is not an integer.
    #[error("the account ID must be an integer")]
    InvalidAccountId,

    /// An empty string was used to name a shared account.
    #[error("account name cannot be empty")]
    EmptyAccountName,

    /// The owner of an account cannot be removed from its members.
    #[error("the owner cannot be removed from the account")]
    CannotRemoveOwner,

    /// Only shared accounts can have members other than the owner.
    #[error("cannot invite to a personal account, create a shared account first")]
    CannotInviteToPersonalAccount,

    /// Personal accounts exist for as long as their owner does.
    #[error("personal accounts cannot be deleted")]
    CannotDeletePersonalAccount,

    /// The request did not identify the user.
    #[error("the request does not identify a user")]
    MissingUser,

    /// The user asked for an account they do not belong to.
    #[error("you are not a member of this account")]
    NotAMember,

    /// The record is outside of the account the request is acting in.
    #[error("the record does not belong to this account")]
    Forbidden,

    /// Only the account owner or the record's creator may change a record.
    #[error("only the account owner or the record's creator may change it")]
    NotAllowed,

    /// Only the account owner may manage the account.
    #[error("only the account owner may do this")]
    OwnerOnly,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// A record of one kind was handed to the store for the other kind.
    #[error("expected a record of kind {expected}, got {found}")]
    KindMismatch {
        /// The kind the store holds.
        expected: TransactionKind,
        /// The kind of the record.
        found: TransactionKind,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Stepping from this date leaves the range of representable dates.
    #[error("the date after {0} cannot be represented")]
    DateOutOfRange(Date),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// A request or response body was too large to buffer.
    #[error("the body is too large")]
    BodyTooLarge,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRange(_)
            | Error::InvalidDateRange { .. }
            | Error::InvalidDate(_, _)
            | Error::InvalidAmount(_)
            | Error::MissingField(_)
            | Error::InvalidRecurrence(_)
            | Error::InvalidAccountId
            | Error::TotalOverflow
            | Error::EmptyAccountName
            | Error::CannotRemoveOwner
            | Error::CannotInviteToPersonalAccount
            | Error::CannotDeletePersonalAccount => StatusCode::BAD_REQUEST,
            Error::MissingUser => StatusCode::UNAUTHORIZED,
            Error::NotAMember | Error::Forbidden | Error::NotAllowed | Error::OwnerOnly => {
                StatusCode::FORBIDDEN
            }
            Error::NotFound | Error::UpdateMissingTransaction | Error::DeleteMissingTransaction => {
                StatusCode::NOT_FOUND
            }
            Error::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server side errors are not intended to be shown to the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
