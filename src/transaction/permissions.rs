//! Decides who may edit or delete a record.

use crate::{
    Error,
    account::RequestContext,
    transaction::{AccountScope, Transaction},
};

/// Check that the caller described by `context` may modify `transaction`.
///
/// The record must be visible from the current account. The account owner
/// may modify any record in it, other members only the records they created.
///
/// # Errors
/// Returns [Error::Forbidden] if the record is outside the current account,
/// or [Error::NotAllowed] if a member tries to modify someone else's record.
pub fn check_can_modify(transaction: &Transaction, context: &RequestContext) -> Result<(), Error> {
    let scope = AccountScope::for_account(&context.account, context.user_id);

    if !scope.contains(transaction) {
        return Err(Error::Forbidden);
    }

    if !context.is_owner() && transaction.created_by != context.user_id {
        return Err(Error::NotAllowed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, AccountKind, RequestContext},
        transaction::{NewTransaction, Transaction, TransactionKind},
    };

    use super::check_can_modify;

    fn context(user_id: i64, kind: AccountKind) -> RequestContext {
        RequestContext {
            user_id,
            account: Account {
                id: 10,
                kind,
                name: "Test".to_owned(),
                owner: 1,
                members: vec![1, 2],
            },
        }
    }

    fn record(account_id: Option<i64>, owner: i64, created_by: i64) -> Transaction {
        NewTransaction {
            account_id,
            created_by,
            ..NewTransaction::build(
                TransactionKind::Expense,
                owner,
                "Food",
                100,
                date!(2025 - 01 - 01),
            )
        }
        .saved_as(1)
    }

    #[test]
    fn owner_may_modify_any_record_in_account() {
        let context = context(1, AccountKind::Shared);

        assert_eq!(check_can_modify(&record(Some(10), 2, 2), &context), Ok(()));
    }

    #[test]
    fn member_may_only_modify_own_records() {
        let context = context(2, AccountKind::Shared);

        assert_eq!(check_can_modify(&record(Some(10), 1, 2), &context), Ok(()));
        assert_eq!(
            check_can_modify(&record(Some(10), 1, 1), &context),
            Err(Error::NotAllowed)
        );
    }

    #[test]
    fn records_in_other_accounts_are_forbidden() {
        let context = context(1, AccountKind::Shared);

        assert_eq!(
            check_can_modify(&record(Some(11), 1, 1), &context),
            Err(Error::Forbidden)
        );
        assert_eq!(
            check_can_modify(&record(None, 1, 1), &context),
            Err(Error::Forbidden)
        );
    }

    #[test]
    fn legacy_records_are_modifiable_from_personal_account() {
        let context = context(1, AccountKind::Personal);

        assert_eq!(check_can_modify(&record(None, 1, 1), &context), Ok(()));
        assert_eq!(
            check_can_modify(&record(None, 2, 2), &context),
            Err(Error::Forbidden)
        );
    }
}
