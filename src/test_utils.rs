#![allow(missing_docs)]

use std::sync::Arc;

use rusqlite::Connection;
use time::{Date, macros::date};

use crate::{AppState, clock::FixedClock};

/// An [AppState] backed by an in-memory database whose clock is stopped on 2025-01-01.
pub(crate) fn get_test_app_state() -> AppState {
    get_test_app_state_on(date!(2025 - 01 - 01))
}

/// An [AppState] backed by an in-memory database whose clock is stopped on `today`.
pub(crate) fn get_test_app_state_on(today: Date) -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(connection, Arc::new(FixedClock::on(today)))
        .expect("Could not initialize test app state.")
}
