//! Access rules evaluated by the store
//!
//! A user owns `users/{id}` and everything under it. Owners read and write
//! their namespace; admins may read any namespace but write only their own.

use crate::auth::Session;
use crate::error::{Error, Result};

/// Record paths, mirroring the per-user document layout
pub mod paths {
    pub fn user(user_id: &str) -> String {
        format!("users/{}", user_id)
    }

    pub fn transactions(user_id: &str) -> String {
        format!("users/{}/transactions", user_id)
    }

    pub fn transaction(user_id: &str, id: &str) -> String {
        format!("users/{}/transactions/{}", user_id, id)
    }

    pub fn budgets(user_id: &str) -> String {
        format!("users/{}/budgets", user_id)
    }

    pub fn budget(user_id: &str, category: &str) -> String {
        format!("users/{}/budgets/{}", user_id, category)
    }

    /// Every user's records
    pub const ALL_USERS: &str = "users";
}

fn denied(actor: &Session, action: &str, path: &str) -> Error {
    Error::PermissionDenied(format!(
        "{} may not {} {}",
        actor.user_id().unwrap_or("anonymous"),
        action,
        path
    ))
}

pub fn check_write(actor: &Session, owner: &str, path: &str) -> Result<()> {
    if actor.can_write(owner) {
        Ok(())
    } else {
        Err(denied(actor, "write", path))
    }
}

pub fn check_read(actor: &Session, owner: &str, path: &str) -> Result<()> {
    if actor.can_read(owner) {
        Ok(())
    } else {
        Err(denied(actor, "read", path))
    }
}

/// Cross-user reads need the admin claim
pub fn check_admin_read(actor: &Session, path: &str) -> Result<()> {
    if actor.is_authenticated() && actor.is_admin() {
        Ok(())
    } else {
        Err(denied(actor, "read", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_reads_and_writes() {
        let alice = Session::user("alice", None);
        let path = paths::transactions("alice");
        assert!(check_read(&alice, "alice", &path).is_ok());
        assert!(check_write(&alice, "alice", &path).is_ok());
    }

    #[test]
    fn test_other_users_are_denied() {
        let bob = Session::user("bob", None);
        let path = paths::budgets("alice");
        let err = check_write(&bob, "alice", &path).unwrap_err();
        match err {
            Error::PermissionDenied(msg) => assert!(msg.contains("users/alice/budgets")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(check_read(&bob, "alice", &path).is_err());
        assert!(check_admin_read(&bob, paths::ALL_USERS).is_err());
    }

    #[test]
    fn test_admin_reads_everything_writes_own() {
        let admin = Session::admin("root", None);
        assert!(check_read(&admin, "alice", &paths::transactions("alice")).is_ok());
        assert!(check_admin_read(&admin, paths::ALL_USERS).is_ok());
        assert!(check_write(&admin, "alice", &paths::transactions("alice")).is_err());
    }

    #[test]
    fn test_paths() {
        assert_eq!(paths::transaction("u", "t"), "users/u/transactions/t");
        assert_eq!(paths::budget("u", "Groceries"), "users/u/budgets/Groceries");
        assert_eq!(paths::user("u"), "users/u");
    }
}
