//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{
    Connection, Row, params, params_from_iter,
    types::{Type, Value},
};
use time::Date;

use crate::{
    Error,
    database_id::TransactionId,
    db::lock,
    transaction::{
        NewTransaction, SortOrder, Transaction, TransactionChanges, TransactionFilter,
        TransactionKind, TransactionStore,
    },
};

/// Stores records of one [TransactionKind] in a SQLite database.
///
/// Income and expenses live in separate tables with the same layout, apart
/// from the name of the subject column.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
    kind: TransactionKind,
}

impl SQLiteTransactionStore {
    /// Create a new store for records of `kind` in the SQLite `connection`.
    ///
    /// The tables must already exist, see [crate::initialize_db].
    pub fn new(connection: Arc<Mutex<Connection>>, kind: TransactionKind) -> Self {
        Self { connection, kind }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        lock(&self.connection)
    }

    fn check_kind(&self, transaction: &NewTransaction) -> Result<(), Error> {
        if transaction.kind != self.kind {
            return Err(Error::KindMismatch {
                expected: self.kind,
                found: transaction.kind,
            });
        }

        Ok(())
    }
}

impl TransactionStore for SQLiteTransactionStore {
    fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Create a new record in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::KindMismatch] if `transaction` is not of this store's kind,
    /// - [Error::JSONSerializationError] if the tags could not be encoded,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        self.check_kind(&transaction)?;
        let connection = self.lock()?;

        insert_transaction(&transaction, &connection)
    }

    /// Retrieve a record by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a record of this kind,
    /// - or [Error::SqlError] there is some other SQL error.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        let kind = self.kind;
        let query = format!(
            "SELECT {} FROM {} WHERE id = :id",
            select_columns(kind),
            kind.table_name()
        );

        let transaction = self
            .lock()?
            .prepare(&query)?
            .query_row(&[(":id", &id)], |row| map_transaction_row(kind, row))?;

        Ok(transaction)
    }

    /// Query for records in the database.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] there is a SQL error.
    fn find(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, Error> {
        let kind = self.kind;
        let table = kind.table_name();
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        let mut scope_parts = vec![];
        if let Some(account_id) = filter.scope.account_id {
            let account_param = push_parameter(&mut query_parameters, Value::Integer(account_id));
            scope_parts.push(format!("account_id = {account_param}"));
        }
        if let Some(owner) = filter.scope.legacy_owner {
            let owner_param = push_parameter(&mut query_parameters, Value::Integer(owner));
            scope_parts.push(format!(
                "(account_id IS NULL AND owner_user_id = {owner_param})"
            ));
        }
        if !scope_parts.is_empty() {
            where_clause_parts.push(format!("({})", scope_parts.join(" OR ")));
        }

        if let Some(created_by) = filter.created_by {
            let param = push_parameter(&mut query_parameters, Value::Integer(created_by));
            where_clause_parts.push(format!("created_by = {param}"));
        }

        if !filter.tags.is_empty() {
            let tag_params: Vec<String> = filter
                .tags
                .iter()
                .map(|tag| push_parameter(&mut query_parameters, Value::Text(tag.clone())))
                .collect();
            where_clause_parts.push(format!(
                "EXISTS (SELECT 1 FROM json_each({table}.tags) WHERE json_each.value IN ({}))",
                tag_params.join(", ")
            ));
        }

        if let Some(window) = filter.date_range {
            let start = push_parameter(&mut query_parameters, Value::Text(window.start.to_string()));
            let end = push_parameter(&mut query_parameters, Value::Text(window.end.to_string()));
            where_clause_parts.push(format!("date BETWEEN {start} AND {end}"));
        }

        if filter.recurring_heads_only {
            where_clause_parts.push("head = 1 AND recurring IN ('monthly', 'bi-weekly')".to_owned());
        }

        if let Some(date) = filter.active_on {
            let param = push_parameter(&mut query_parameters, Value::Text(date.to_string()));
            where_clause_parts.push(format!("(end_date IS NULL OR end_date >= {param})"));
        }

        let mut query_string_parts = vec![format!("SELECT {} FROM {table}", select_columns(kind))];

        if !where_clause_parts.is_empty() {
            query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
        }

        // Sort by date, and then ID to keep the order stable for records on the same day.
        match filter.sort_date {
            Some(SortOrder::Ascending) => query_string_parts.push("ORDER BY date ASC, id ASC".to_owned()),
            Some(SortOrder::Descending) => {
                query_string_parts.push("ORDER BY date DESC, id DESC".to_owned())
            }
            None => {}
        }

        let query_string = query_string_parts.join(" ");

        self.lock()?
            .prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), |row| {
                map_transaction_row(kind, row)
            })?
            .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
            .collect()
    }

    /// Update the fields of a record that are set in `changes`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingTransaction] if `id` does not refer to a record of this kind,
    /// - [Error::JSONSerializationError] if the tags could not be encoded,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&self, id: TransactionId, changes: TransactionChanges) -> Result<Transaction, Error> {
        let kind = self.kind;
        let mut assignments = vec![];
        let mut values = vec![];

        if let Some(subject) = changes.subject {
            let param = push_parameter(&mut values, Value::Text(subject));
            assignments.push(format!("{} = {param}", kind.subject_field()));
        }
        if let Some(icon) = changes.icon {
            let param = push_parameter(&mut values, icon.map_or(Value::Null, Value::Text));
            assignments.push(format!("icon = {param}"));
        }
        if let Some(amount) = changes.amount {
            let param = push_parameter(&mut values, Value::Integer(amount));
            assignments.push(format!("amount = {param}"));
        }
        if let Some(date) = changes.date {
            let param = push_parameter(&mut values, Value::Text(date.to_string()));
            assignments.push(format!("date = {param}"));
        }
        if let Some(tags) = changes.tags {
            let param = push_parameter(&mut values, Value::Text(encode_tags(&tags)?));
            assignments.push(format!("tags = {param}"));
        }
        if let Some(recurring) = changes.recurring {
            let param = push_parameter(&mut values, Value::Text(recurring.as_str().to_owned()));
            assignments.push(format!("recurring = {param}"));
        }
        if let Some(end_date) = changes.end_date {
            let param = push_parameter(
                &mut values,
                end_date.map_or(Value::Null, |date| Value::Text(date.to_string())),
            );
            assignments.push(format!("end_date = {param}"));
        }
        if let Some(head) = changes.head {
            let param = push_parameter(&mut values, Value::Integer(i64::from(head)));
            assignments.push(format!("head = {param}"));
        }

        if assignments.is_empty() {
            return self.get(id).map_err(|error| match error {
                Error::NotFound => Error::UpdateMissingTransaction,
                error => error,
            });
        }

        assignments.push("updated_at = CURRENT_TIMESTAMP".to_owned());
        let id_param = push_parameter(&mut values, Value::Integer(id));
        let query = format!(
            "UPDATE {} SET {} WHERE id = {id_param} RETURNING {}",
            kind.table_name(),
            assignments.join(", "),
            select_columns(kind)
        );

        self.lock()?
            .prepare(&query)?
            .query_row(params_from_iter(values.iter()), |row| {
                map_transaction_row(kind, row)
            })
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
                error => error.into(),
            })
    }

    /// Delete a record by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingTransaction] if `id` does not refer to a record of this kind,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&self, id: TransactionId) -> Result<(), Error> {
        let query = format!("DELETE FROM {} WHERE id = ?1", self.kind.table_name());
        let rows_affected = self.lock()?.execute(&query, [id])?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingTransaction);
        }

        Ok(())
    }

    /// Demote `head` and insert its successor on `date` in one database transaction.
    ///
    /// The demotion only matches rows that are still heads, so when two callers
    /// race on the same chain, only the first creates the next occurrence.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error, in which case
    /// neither the demotion nor the insert is saved.
    fn advance_head(&self, head: &Transaction, date: Date) -> Result<Option<Transaction>, Error> {
        let successor = head.successor(date);
        self.check_kind(&successor)?;

        let connection = self.lock()?;
        let sql_transaction = connection.unchecked_transaction()?;

        let demoted = demote_head(head.id, self.kind, &sql_transaction)?;
        if !demoted {
            // Dropping the transaction rolls it back.
            return Ok(None);
        }

        let successor = insert_transaction(&successor, &sql_transaction)?;
        sql_transaction.commit()?;

        Ok(Some(successor))
    }

    fn retire_head(&self, id: TransactionId) -> Result<bool, Error> {
        let connection = self.lock()?;

        demote_head(id, self.kind, &connection)
    }
}

/// Create the income and expense tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in TransactionKind::ALL {
        let table = kind.table_name();

        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_user_id INTEGER NOT NULL,
                    account_id INTEGER,
                    created_by INTEGER NOT NULL,
                    {subject} TEXT NOT NULL,
                    icon TEXT,
                    amount INTEGER NOT NULL CHECK (amount > 0),
                    date TEXT NOT NULL,
                    tags TEXT NOT NULL DEFAULT '[]',
                    recurring TEXT NOT NULL DEFAULT 'once',
                    end_date TEXT,
                    head INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
                subject = kind.subject_field()
            ),
            (),
        )?;

        // Listing queries filter by account and date.
        connection.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_account_date ON {table}(account_id, date);"
            ),
            (),
        )?;

        // The materializer looks up chain heads on every read.
        connection.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_head ON {table}(head, recurring);"
            ),
            (),
        )?;
    }

    Ok(())
}

fn insert_transaction(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let kind = transaction.kind;
    let query = format!(
        "INSERT INTO {} (owner_user_id, account_id, created_by, {}, icon, amount, date, tags, recurring, end_date, head)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         RETURNING {}",
        kind.table_name(),
        kind.subject_field(),
        select_columns(kind)
    );

    let transaction = connection.prepare(&query)?.query_row(
        params![
            transaction.owner_user_id,
            transaction.account_id,
            transaction.created_by,
            transaction.subject,
            transaction.icon,
            transaction.amount,
            transaction.date,
            encode_tags(&transaction.tags)?,
            transaction.recurring,
            transaction.end_date,
            transaction.head,
        ],
        |row| map_transaction_row(kind, row),
    )?;

    Ok(transaction)
}

/// Returns whether a head was demoted.
fn demote_head(
    id: TransactionId,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        &format!(
            "UPDATE {} SET head = 0, recurring = 'once', updated_at = CURRENT_TIMESTAMP
             WHERE id = ?1 AND head = 1",
            kind.table_name()
        ),
        [id],
    )?;

    Ok(rows_affected == 1)
}

fn select_columns(kind: TransactionKind) -> String {
    format!(
        "id, owner_user_id, account_id, created_by, {}, icon, amount, date, tags, recurring, end_date, head",
        kind.subject_field()
    )
}

/// Map a database row to a record of `kind`.
///
/// The row must contain the columns in the order given by `select_columns`.
fn map_transaction_row(kind: TransactionKind, row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_tags: String = row.get(8)?;
    let tags = serde_json::from_str(&raw_tags)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        kind,
        owner_user_id: row.get(1)?,
        account_id: row.get(2)?,
        created_by: row.get(3)?,
        subject: row.get(4)?,
        icon: row.get(5)?,
        amount: row.get(6)?,
        date: row.get(7)?,
        tags,
        recurring: row.get(9)?,
        end_date: row.get(10)?,
        head: row.get(11)?,
    })
}

fn encode_tags(tags: &[String]) -> Result<String, Error> {
    serde_json::to_string(tags).map_err(|error| Error::JSONSerializationError(error.to_string()))
}

/// Append `value` to `parameters` and return its positional placeholder, e.g. "?3".
fn push_parameter(parameters: &mut Vec<Value>, value: Value) -> String {
    parameters.push(value);
    format!("?{}", parameters.len())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error,
        db::initialize,
        transaction::{
            AccountScope, DateWindow, NewTransaction, Recurrence, SortOrder, TransactionChanges,
            TransactionFilter, TransactionKind, TransactionStore,
        },
    };

    use super::SQLiteTransactionStore;

    fn get_test_store(kind: TransactionKind) -> SQLiteTransactionStore {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        SQLiteTransactionStore::new(Arc::new(Mutex::new(conn)), kind)
    }

    fn expense(user_id: i64, account_id: Option<i64>, date: Date) -> NewTransaction {
        NewTransaction {
            account_id,
            ..NewTransaction::build(TransactionKind::Expense, user_id, "Groceries", 4_250, date)
        }
    }

    #[test]
    fn create_succeeds() {
        let store = get_test_store(TransactionKind::Expense);
        let new = NewTransaction {
            tags: vec!["food".to_owned(), "weekly".to_owned()],
            icon: Some("cart".to_owned()),
            ..expense(1, Some(2), date!(2025 - 01 - 15))
        };

        let created = store.create(new.clone()).unwrap();

        assert_eq!(created, new.saved_as(created.id));
        assert_eq!(store.get(created.id), Ok(created));
    }

    #[test]
    fn create_fails_for_other_kind() {
        let store = get_test_store(TransactionKind::Income);

        let result = store.create(expense(1, None, date!(2025 - 01 - 15)));

        assert_eq!(
            result,
            Err(Error::KindMismatch {
                expected: TransactionKind::Income,
                found: TransactionKind::Expense
            })
        );
    }

    #[test]
    fn get_fails_on_missing_id() {
        let store = get_test_store(TransactionKind::Income);

        assert_eq!(store.get(42), Err(Error::NotFound));
    }

    #[test]
    fn kinds_are_stored_separately() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let incomes = SQLiteTransactionStore::new(conn.clone(), TransactionKind::Income);
        let expenses = SQLiteTransactionStore::new(conn, TransactionKind::Expense);

        let salary = incomes
            .create(NewTransaction::build(
                TransactionKind::Income,
                1,
                "Salary",
                500_000,
                date!(2025 - 01 - 15),
            ))
            .unwrap();

        assert_eq!(salary.subject, "Salary");
        assert_eq!(expenses.find(&TransactionFilter::default()), Ok(vec![]));
    }

    #[test]
    fn find_combines_account_and_legacy_records_with_or() {
        let store = get_test_store(TransactionKind::Expense);
        let in_account = store.create(expense(2, Some(10), date!(2025 - 01 - 01))).unwrap();
        let legacy = store.create(expense(1, None, date!(2025 - 01 - 02))).unwrap();
        store.create(expense(2, None, date!(2025 - 01 - 03))).unwrap();
        store.create(expense(1, Some(11), date!(2025 - 01 - 04))).unwrap();

        let scope = AccountScope {
            account_id: Some(10),
            legacy_owner: Some(1),
        };
        let got = store
            .find(&TransactionFilter::new(scope).sorted(SortOrder::Ascending))
            .unwrap();

        assert_eq!(got, vec![in_account, legacy]);
    }

    #[test]
    fn find_filters_by_creator() {
        let store = get_test_store(TransactionKind::Expense);
        let mine = store
            .create(NewTransaction {
                created_by: 3,
                ..expense(1, Some(10), date!(2025 - 01 - 01))
            })
            .unwrap();
        store.create(expense(1, Some(10), date!(2025 - 01 - 01))).unwrap();

        let filter = TransactionFilter::new(AccountScope::default()).created_by(Some(3));

        assert_eq!(store.find(&filter), Ok(vec![mine]));
    }

    #[test]
    fn find_matches_any_of_the_tags() {
        let store = get_test_store(TransactionKind::Expense);
        let food = store
            .create(NewTransaction {
                tags: vec!["food".to_owned()],
                ..expense(1, None, date!(2025 - 01 - 01))
            })
            .unwrap();
        let rent = store
            .create(NewTransaction {
                tags: vec!["home".to_owned(), "rent".to_owned()],
                ..expense(1, None, date!(2025 - 01 - 02))
            })
            .unwrap();
        store
            .create(NewTransaction {
                tags: vec!["fun".to_owned()],
                ..expense(1, None, date!(2025 - 01 - 03))
            })
            .unwrap();
        store.create(expense(1, None, date!(2025 - 01 - 04))).unwrap();

        let filter = TransactionFilter::default()
            .tags(vec!["rent".to_owned(), "food".to_owned()])
            .sorted(SortOrder::Ascending);

        assert_eq!(store.find(&filter), Ok(vec![food, rent]));
    }

    #[test]
    fn find_date_window_is_inclusive_and_sorted() {
        let store = get_test_store(TransactionKind::Expense);
        let mut created = Vec::new();
        for day in 1..=5 {
            let date = Date::from_calendar_date(2025, time::Month::March, day).unwrap();
            created.push(store.create(expense(1, None, date)).unwrap());
        }

        let filter = TransactionFilter::default()
            .within(Some(DateWindow {
                start: date!(2025 - 03 - 02),
                end: date!(2025 - 03 - 04),
            }))
            .sorted(SortOrder::Descending);
        let got = store.find(&filter).unwrap();

        let want: Vec<_> = created[1..4].iter().rev().cloned().collect();
        assert_eq!(got, want);
    }

    #[test]
    fn find_recurring_heads_that_are_still_active() {
        let store = get_test_store(TransactionKind::Expense);
        let unbounded = store
            .create(expense(1, None, date!(2025 - 01 - 01)).recurring(Recurrence::Monthly, None))
            .unwrap();
        let ends_later = store
            .create(
                expense(1, None, date!(2025 - 01 - 02))
                    .recurring(Recurrence::BiWeekly, Some(date!(2025 - 06 - 01))),
            )
            .unwrap();
        store
            .create(
                expense(1, None, date!(2025 - 01 - 03))
                    .recurring(Recurrence::Monthly, Some(date!(2025 - 02 - 01))),
            )
            .unwrap();
        store.create(expense(1, None, date!(2025 - 01 - 04))).unwrap();
        store
            .create(NewTransaction {
                head: true,
                ..expense(1, None, date!(2025 - 01 - 05))
            })
            .unwrap();

        let filter = TransactionFilter::default()
            .recurring_heads()
            .active_on(date!(2025 - 03 - 01))
            .sorted(SortOrder::Ascending);

        assert_eq!(store.find(&filter), Ok(vec![unbounded, ends_later]));
    }

    #[test]
    fn update_writes_only_given_fields() {
        let store = get_test_store(TransactionKind::Expense);
        let original = store
            .create(NewTransaction {
                tags: vec!["food".to_owned()],
                ..expense(1, None, date!(2025 - 01 - 01))
            })
            .unwrap();

        let updated = store
            .update(
                original.id,
                TransactionChanges {
                    amount: Some(999),
                    end_date: Some(Some(date!(2025 - 12 - 31))),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.amount, 999);
        assert_eq!(updated.end_date, Some(date!(2025 - 12 - 31)));
        assert_eq!(updated.tags, original.tags);
        assert_eq!(updated.subject, original.subject);
        assert_eq!(store.get(original.id), Ok(updated));
    }

    #[test]
    fn update_fails_on_missing_id() {
        let store = get_test_store(TransactionKind::Expense);

        assert_eq!(
            store.update(
                1,
                TransactionChanges {
                    head: Some(false),
                    ..Default::default()
                }
            ),
            Err(Error::UpdateMissingTransaction)
        );
        assert_eq!(
            store.update(1, TransactionChanges::default()),
            Err(Error::UpdateMissingTransaction)
        );
    }

    #[test]
    fn delete_removes_record() {
        let store = get_test_store(TransactionKind::Income);
        let income = store
            .create(NewTransaction::build(
                TransactionKind::Income,
                1,
                "Gift",
                2_000,
                date!(2025 - 01 - 01),
            ))
            .unwrap();

        assert_eq!(store.delete(income.id), Ok(()));
        assert_eq!(store.get(income.id), Err(Error::NotFound));
        assert_eq!(store.delete(income.id), Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn advance_head_demotes_and_creates_successor() {
        let store = get_test_store(TransactionKind::Expense);
        let head = store
            .create(expense(1, Some(4), date!(2025 - 01 - 15)).recurring(Recurrence::Monthly, None))
            .unwrap();

        let successor = store
            .advance_head(&head, date!(2025 - 02 - 15))
            .unwrap()
            .expect("head should advance");

        assert!(successor.head);
        assert_eq!(successor.recurring, Recurrence::Monthly);
        assert_eq!(successor.date, date!(2025 - 02 - 15));
        assert_eq!(successor.account_id, Some(4));

        let demoted = store.get(head.id).unwrap();
        assert!(!demoted.head);
        assert_eq!(demoted.recurring, Recurrence::Once);
    }

    #[test]
    fn advance_head_does_nothing_for_a_stale_head() {
        let store = get_test_store(TransactionKind::Expense);
        let head = store
            .create(expense(1, None, date!(2025 - 01 - 15)).recurring(Recurrence::Monthly, None))
            .unwrap();
        store.advance_head(&head, date!(2025 - 02 - 15)).unwrap();

        let second_attempt = store.advance_head(&head, date!(2025 - 02 - 15));

        assert_eq!(second_attempt, Ok(None));
        assert_eq!(store.find(&TransactionFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn retire_head_only_demotes_heads() {
        let store = get_test_store(TransactionKind::Expense);
        let head = store
            .create(expense(1, None, date!(2025 - 01 - 15)).recurring(Recurrence::Monthly, None))
            .unwrap();

        assert_eq!(store.retire_head(head.id), Ok(true));
        assert_eq!(store.retire_head(head.id), Ok(false));

        let retired = store.get(head.id).unwrap();
        assert!(!retired.head);
        assert_eq!(retired.recurring, Recurrence::Once);
    }
}
