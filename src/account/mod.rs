//! Personal and shared accounts, their members and the per-request account context.

pub mod context;
mod core;
mod endpoints;

pub use context::{RequestContext, account_id_from_headers, resolve_context, user_guard};
pub use core::{
    Account, AccountKind, Member, MemberRole, add_member, create_account_tables,
    create_shared_account, ensure_owner_is_member, get_account, get_or_create_personal_account,
    get_shared_accounts_for_member, list_members, remove_member, soft_delete_account,
};
pub use endpoints::{
    AccountState, add_member_endpoint, create_account_endpoint, delete_account_endpoint,
    get_members, get_my_accounts, remove_member_endpoint,
};
