//! Personal and shared accounts, and their members.

use rusqlite::{
    Connection, OptionalExtension, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::Serialize;

use crate::{
    Error,
    database_id::{AccountId, UserId},
};

/// The name given to personal accounts created on demand.
pub const PERSONAL_ACCOUNT_NAME: &str = "Personal";

/// Whether an account belongs to one user or is shared with others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// The single account every user has for their own records.
    Personal,
    /// An account an owner shares with other members.
    Shared,
}

impl AccountKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Shared => "shared",
        }
    }
}

impl ToSql for AccountKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AccountKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "personal" => Ok(Self::Personal),
            "shared" => Ok(Self::Shared),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A ledger that income and expense records can belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// Whether the account is personal or shared.
    pub kind: AccountKind,
    /// The display name of the account.
    pub name: String,
    /// The user that created the account.
    pub owner: UserId,
    /// The users that may read and write the account's records, including the owner.
    pub members: Vec<UserId>,
}

impl Account {
    /// Whether `user_id` owns this account.
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner == user_id
    }

    /// Whether `user_id` may access this account.
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.is_owner(user_id) || self.members.contains(&user_id)
    }
}

/// A member's role in an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// The user who created the account.
    Owner,
    /// Any other member.
    Member,
}

/// A user with access to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// The ID of the user.
    pub user_id: UserId,
    /// Whether the user owns the account.
    pub role: MemberRole,
}

/// List the members of `account`, owner first.
///
/// The owner is listed even if they are missing from the stored members.
pub fn list_members(account: &Account) -> Vec<Member> {
    let mut members = vec![Member {
        user_id: account.owner,
        role: MemberRole::Owner,
    }];

    for &user_id in &account.members {
        if !members.iter().any(|member| member.user_id == user_id) {
            members.push(Member {
                user_id,
                role: MemberRole::Member,
            });
        }
    }

    members
}

/// Create the tables for accounts and their members.
///
/// # Errors
/// Returns an error if the tables cannot be created.
pub fn create_account_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK (kind IN ('personal', 'shared')),
            name TEXT NOT NULL,
            owner INTEGER NOT NULL,
            deleted_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_member (
            account_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            PRIMARY KEY (account_id, user_id),
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_owner_kind ON account(owner, kind);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_member_user ON account_member(user_id);",
        (),
    )?;

    Ok(())
}

/// Create a shared account owned by `owner`, with the owner as its only member.
///
/// # Errors
/// Returns [Error::EmptyAccountName] if `name` is blank, or [Error::SqlError]
/// if there is an SQL error.
pub fn create_shared_account(
    name: &str,
    owner: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    insert_account(AccountKind::Shared, name, owner, connection)
}

/// Get the personal account of `user_id`, creating it if it does not exist yet.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_or_create_personal_account(
    user_id: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    let existing: Option<AccountId> = connection
        .query_row(
            "SELECT id FROM account
             WHERE owner = ?1 AND kind = 'personal' AND deleted_at IS NULL
             ORDER BY id LIMIT 1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => get_account(id, connection),
        None => {
            tracing::debug!("Creating personal account for user {user_id}");
            insert_account(AccountKind::Personal, PERSONAL_ACCOUNT_NAME, user_id, connection)
        }
    }
}

/// Get an account that has not been deleted.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or was deleted,
/// or [Error::SqlError] if there is some other SQL error.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    let (id, kind, name, owner) = connection.query_row(
        "SELECT id, kind, name, owner FROM account WHERE id = ?1 AND deleted_at IS NULL",
        [id],
        map_account_row,
    )?;
    let members = get_member_ids(id, connection)?;

    Ok(Account {
        id,
        kind,
        name,
        owner,
        members,
    })
}

/// Get the shared accounts that `user_id` is a member of, oldest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_shared_accounts_for_member(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    let ids = connection
        .prepare(
            "SELECT DISTINCT account.id FROM account
             LEFT JOIN account_member ON account_member.account_id = account.id
             WHERE account.kind = 'shared' AND account.deleted_at IS NULL
               AND (account_member.user_id = ?1 OR account.owner = ?1)
             ORDER BY account.id",
        )?
        .query_map([user_id], |row| row.get(0))?
        .collect::<Result<Vec<AccountId>, _>>()?;

    ids.into_iter().map(|id| get_account(id, connection)).collect()
}

/// Add `user_id` to the members of a shared `account`. Adding an existing member does nothing.
///
/// # Errors
/// Returns [Error::CannotInviteToPersonalAccount] for personal accounts, or
/// [Error::SqlError] if there is an SQL error.
pub fn add_member(
    account: &Account,
    user_id: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    if account.kind == AccountKind::Personal {
        return Err(Error::CannotInviteToPersonalAccount);
    }

    insert_member(account.id, user_id, connection)?;

    get_account(account.id, connection)
}

/// Remove `user_id` from the members of `account`.
///
/// # Errors
/// Returns [Error::CannotRemoveOwner] if `user_id` owns the account, or
/// [Error::SqlError] if there is an SQL error.
pub fn remove_member(
    account: &Account,
    user_id: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    if account.is_owner(user_id) {
        return Err(Error::CannotRemoveOwner);
    }

    connection.execute(
        "DELETE FROM account_member WHERE account_id = ?1 AND user_id = ?2",
        (account.id, user_id),
    )?;

    get_account(account.id, connection)
}

/// Mark a shared account as deleted. Its records are kept but can no longer be reached.
///
/// # Errors
/// Returns [Error::CannotDeletePersonalAccount] for personal accounts, or
/// [Error::SqlError] if there is an SQL error.
pub fn soft_delete_account(account: &Account, connection: &Connection) -> Result<(), Error> {
    if account.kind == AccountKind::Personal {
        return Err(Error::CannotDeletePersonalAccount);
    }

    connection.execute(
        "UPDATE account SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?1",
        [account.id],
    )?;

    Ok(())
}

/// Make sure the owner of `account` is one of its stored members.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn ensure_owner_is_member(account: Account, connection: &Connection) -> Result<Account, Error> {
    if account.members.contains(&account.owner) {
        return Ok(account);
    }

    tracing::warn!(
        "Owner {} was missing from the members of account {}, adding them back",
        account.owner,
        account.id
    );
    insert_member(account.id, account.owner, connection)?;

    get_account(account.id, connection)
}

fn insert_member(
    account_id: AccountId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT OR IGNORE INTO account_member (account_id, user_id) VALUES (?1, ?2)",
        (account_id, user_id),
    )?;

    Ok(())
}

fn insert_account(
    kind: AccountKind,
    name: &str,
    owner: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    let id: AccountId = connection.query_row(
        "INSERT INTO account (kind, name, owner) VALUES (?1, ?2, ?3) RETURNING id",
        (kind, name, owner),
        |row| row.get(0),
    )?;

    connection.execute(
        "INSERT INTO account_member (account_id, user_id) VALUES (?1, ?2)",
        (id, owner),
    )?;

    Ok(Account {
        id,
        kind,
        name: name.to_owned(),
        owner,
        members: vec![owner],
    })
}

fn get_member_ids(id: AccountId, connection: &Connection) -> Result<Vec<UserId>, Error> {
    connection
        .prepare("SELECT user_id FROM account_member WHERE account_id = ?1 ORDER BY rowid")?
        .query_map([id], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(Error::from))
        .collect()
}

type AccountRow = (AccountId, AccountKind, String, UserId);

fn map_account_row(row: &Row) -> Result<AccountRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{
        Account, AccountKind, Member, MemberRole, add_member, create_shared_account,
        ensure_owner_is_member, get_account, get_or_create_personal_account,
        get_shared_accounts_for_member, list_members, remove_member, soft_delete_account,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn personal_account_is_created_once() {
        let conn = get_test_connection();

        let first = get_or_create_personal_account(1, &conn).unwrap();
        let second = get_or_create_personal_account(1, &conn).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.kind, AccountKind::Personal);
        assert_eq!(first.members, vec![1]);
        assert_ne!(get_or_create_personal_account(2, &conn).unwrap().id, first.id);
    }

    #[test]
    fn shared_account_requires_a_name() {
        let conn = get_test_connection();

        assert_eq!(
            create_shared_account("  ", 1, &conn),
            Err(Error::EmptyAccountName)
        );

        let account = create_shared_account(" Flat ", 1, &conn).unwrap();
        assert_eq!(account.name, "Flat");
        assert_eq!(get_account(account.id, &conn), Ok(account));
    }

    #[test]
    fn get_account_fails_on_missing_id() {
        let conn = get_test_connection();

        assert_eq!(get_account(99, &conn), Err(Error::NotFound));
    }

    #[test]
    fn members_can_be_added_and_removed() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();

        let account = add_member(&account, 2, &conn).unwrap();
        let account = add_member(&account, 2, &conn).unwrap();
        assert_eq!(account.members, vec![1, 2]);
        assert!(account.is_member(2));

        let account = remove_member(&account, 2, &conn).unwrap();
        assert_eq!(account.members, vec![1]);
        assert!(!account.is_member(2));
    }

    #[test]
    fn personal_accounts_cannot_have_members_added() {
        let conn = get_test_connection();
        let account = get_or_create_personal_account(1, &conn).unwrap();

        assert_eq!(
            add_member(&account, 2, &conn),
            Err(Error::CannotInviteToPersonalAccount)
        );
        assert_eq!(get_account(account.id, &conn).unwrap().members, vec![1]);
    }

    #[test]
    fn missing_owner_is_added_back_to_personal_account() {
        let conn = get_test_connection();
        let account = get_or_create_personal_account(1, &conn).unwrap();
        conn.execute("DELETE FROM account_member WHERE user_id = 1", ())
            .unwrap();
        let account = get_account(account.id, &conn).unwrap();

        let account = ensure_owner_is_member(account, &conn).unwrap();

        assert_eq!(account.members, vec![1]);
    }

    #[test]
    fn owner_cannot_be_removed() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();

        assert_eq!(
            remove_member(&account, 1, &conn),
            Err(Error::CannotRemoveOwner)
        );
    }

    #[test]
    fn shared_accounts_are_listed_for_members() {
        let conn = get_test_connection();
        let flat = create_shared_account("Flat", 1, &conn).unwrap();
        let flat = add_member(&flat, 2, &conn).unwrap();
        create_shared_account("Club", 3, &conn).unwrap();
        get_or_create_personal_account(2, &conn).unwrap();

        assert_eq!(get_shared_accounts_for_member(2, &conn), Ok(vec![flat]));
    }

    #[test]
    fn deleted_accounts_are_hidden() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();

        soft_delete_account(&account, &conn).unwrap();

        assert_eq!(get_account(account.id, &conn), Err(Error::NotFound));
        assert_eq!(get_shared_accounts_for_member(1, &conn), Ok(vec![]));
    }

    #[test]
    fn personal_accounts_cannot_be_deleted() {
        let conn = get_test_connection();
        let account = get_or_create_personal_account(1, &conn).unwrap();

        assert_eq!(
            soft_delete_account(&account, &conn),
            Err(Error::CannotDeletePersonalAccount)
        );
    }

    #[test]
    fn missing_owner_is_added_back_to_members() {
        let conn = get_test_connection();
        let account = create_shared_account("Flat", 1, &conn).unwrap();
        conn.execute("DELETE FROM account_member WHERE user_id = 1", ())
            .unwrap();
        let account = get_account(account.id, &conn).unwrap();
        assert!(account.members.is_empty());

        let account = ensure_owner_is_member(account, &conn).unwrap();

        assert_eq!(account.members, vec![1]);
    }

    #[test]
    fn list_members_puts_owner_first() {
        let account = Account {
            id: 1,
            kind: AccountKind::Shared,
            name: "Flat".to_owned(),
            owner: 3,
            members: vec![4, 3, 5],
        };

        assert_eq!(
            list_members(&account),
            vec![
                Member {
                    user_id: 3,
                    role: MemberRole::Owner
                },
                Member {
                    user_id: 4,
                    role: MemberRole::Member
                },
                Member {
                    user_id: 5,
                    role: MemberRole::Member
                },
            ]
        );
    }
}
