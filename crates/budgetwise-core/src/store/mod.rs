//! Store accessor
//!
//! The only entry point the rest of the app uses to read or write records.
//!
//! Writes are split in two:
//! - Synchronous checks (the caller has an identity, the input is valid)
//!   fail the call itself.
//! - The write runs on the blocking pool. Access rules are evaluated there,
//!   by the store, and any rejection or storage error is published on the
//!   [`StoreEvents`] channel instead of being returned.
//!
//! A returned [`WriteTicket`] therefore means "scheduled", not "persisted".
//! Await [`WriteTicket::persisted`] or subscribe to the channel to find out.
//!
//! Concurrent writes to the same record are last-write-wins.

pub mod events;
pub mod rules;

pub use events::{
    StoreEvent, StoreEvents, StoreFailure, StoreOperation, StoreWrite, DEFAULT_EVENT_CAPACITY,
};
pub use rules::paths;

use chrono::Utc;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::Session;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    Budget, BudgetInput, ProfileInput, Transaction, TransactionInput, UserProfile,
};

/// Handle to a scheduled write
#[derive(Debug)]
pub struct WriteTicket {
    /// Record id (transaction id, budget category, or user id)
    pub id: String,
    pub path: String,
    handle: JoinHandle<bool>,
}

impl WriteTicket {
    /// Wait for the write to finish; true if it reached the store
    pub async fn persisted(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct BudgetStore {
    db: Database,
    events: StoreEvents,
}

impl BudgetStore {
    pub fn new(db: Database) -> Self {
        Self::with_events(db, StoreEvents::default())
    }

    pub fn with_events(db: Database, events: StoreEvents) -> Self {
        Self { db, events }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn events(&self) -> &StoreEvents {
        &self.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Record a new transaction in `users/{user_id}/transactions`
    pub fn add_transaction(
        &self,
        session: &Session,
        user_id: &str,
        input: TransactionInput,
    ) -> Result<WriteTicket> {
        require_identity(session, user_id)?;
        input.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let path = paths::transaction(user_id, &id);
        let request_data = serde_json::to_value(&input).ok();
        let transaction = input.into_transaction(id.clone(), user_id, Utc::now());

        self.schedule(
            session,
            user_id,
            id,
            path,
            StoreOperation::Create,
            request_data,
            move |db| db.insert_transaction(&transaction),
        )
    }

    /// Replace every field of an existing transaction
    pub fn update_transaction(
        &self,
        session: &Session,
        user_id: &str,
        transaction_id: &str,
        input: TransactionInput,
    ) -> Result<WriteTicket> {
        require_identity(session, user_id)?;
        input.validate()?;

        let path = paths::transaction(user_id, transaction_id);
        let request_data = serde_json::to_value(&input).ok();
        let owner = user_id.to_string();
        let id = transaction_id.to_string();
        let missing_path = path.clone();

        self.schedule(
            session,
            user_id,
            transaction_id.to_string(),
            path,
            StoreOperation::Update,
            request_data,
            move |db| {
                // created_at is not part of the UPDATE, so the stored value survives
                let replacement = input.into_transaction(id, &owner, Utc::now());
                if db.replace_transaction(&replacement)? {
                    Ok(())
                } else {
                    Err(Error::NotFound(missing_path))
                }
            },
        )
    }

    /// Create or replace the budget for one category
    pub fn upsert_budget(
        &self,
        session: &Session,
        user_id: &str,
        input: BudgetInput,
    ) -> Result<WriteTicket> {
        require_identity(session, user_id)?;
        input.validate()?;

        let id = input.category.as_str().to_string();
        let path = paths::budget(user_id, &id);
        let request_data = serde_json::to_value(&input).ok();
        let budget = Budget {
            id: id.clone(),
            user_id: user_id.to_string(),
            category: input.category,
            amount: input.amount,
            updated_at: Utc::now(),
        };

        self.schedule(
            session,
            user_id,
            id,
            path,
            StoreOperation::Write,
            request_data,
            move |db| db.upsert_budget(&budget),
        )
    }

    /// Create or merge the caller's own profile
    pub fn upsert_user_profile(
        &self,
        session: &Session,
        input: ProfileInput,
    ) -> Result<WriteTicket> {
        let user_id = session.require_user()?.to_string();
        if let Some(email) = input.email.as_deref() {
            if !email.contains('@') {
                return Err(Error::InvalidData(format!("Invalid email: {}", email)));
            }
        }

        let path = paths::user(&user_id);
        let request_data = serde_json::to_value(&input).ok();
        let owner = user_id.clone();

        self.schedule(
            session,
            &user_id,
            user_id.clone(),
            path,
            StoreOperation::Write,
            request_data,
            move |db| db.upsert_user(&owner, input.email.as_deref(), Utc::now()),
        )
    }

    /// Account deletion is not offered
    pub fn request_account_deletion(&self, session: &Session) -> Result<()> {
        let user_id = session.require_user()?;
        warn!(user_id = %user_id, "Account deletion requested but not implemented");
        Err(Error::NotImplemented("account deletion".to_string()))
    }

    /// A user's transactions, newest first
    pub fn transactions(
        &self,
        session: &Session,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let path = paths::transactions(user_id);
        self.guard_read(session, StoreOperation::List, &path, || {
            rules::check_read(session, user_id, &path)
        })?;
        self.db.list_transactions(user_id, limit)
    }

    pub fn budgets(&self, session: &Session, user_id: &str) -> Result<Vec<Budget>> {
        let path = paths::budgets(user_id);
        self.guard_read(session, StoreOperation::List, &path, || {
            rules::check_read(session, user_id, &path)
        })?;
        self.db.list_budgets(user_id)
    }

    pub fn profile(&self, session: &Session, user_id: &str) -> Result<Option<UserProfile>> {
        let path = paths::user(user_id);
        self.guard_read(session, StoreOperation::Read, &path, || {
            rules::check_read(session, user_id, &path)
        })?;
        self.db.get_user(user_id)
    }

    /// Every profile (admin only)
    pub fn users(&self, session: &Session) -> Result<Vec<UserProfile>> {
        self.guard_read(session, StoreOperation::List, paths::ALL_USERS, || {
            rules::check_admin_read(session, paths::ALL_USERS)
        })?;
        self.db.list_users()
    }

    /// Every user's transactions, newest first (admin only)
    pub fn all_transactions(
        &self,
        session: &Session,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        self.guard_read(session, StoreOperation::List, paths::ALL_USERS, || {
            rules::check_admin_read(session, paths::ALL_USERS)
        })?;
        self.db.list_all_transactions(limit)
    }

    /// Evaluate a read rule; denials are returned and also published
    fn guard_read(
        &self,
        session: &Session,
        operation: StoreOperation,
        path: &str,
        rule: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        rule().inspect_err(|e| {
            self.events.publish(StoreEvent::Failed(StoreFailure {
                path: path.to_string(),
                operation,
                user_id: session.user_id().map(str::to_string),
                request_data: None,
                kind: e.kind().to_string(),
                message: e.to_string(),
                at: Utc::now(),
            }));
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn schedule<F>(
        &self,
        session: &Session,
        owner: &str,
        id: String,
        path: String,
        operation: StoreOperation,
        request_data: Option<serde_json::Value>,
        write: F,
    ) -> Result<WriteTicket>
    where
        F: FnOnce(&Database) -> Result<()> + Send + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|_| Error::Config("store writes require a Tokio runtime".to_string()))?;

        let db = self.db.clone();
        let events = self.events.clone();
        let actor = session.clone();
        let owner = owner.to_string();
        let task_path = path.clone();

        let handle = runtime.spawn_blocking(move || {
            let outcome = rules::check_write(&actor, &owner, &task_path).and_then(|_| write(&db));
            match outcome {
                Ok(()) => {
                    debug!(path = %task_path, operation = operation.as_str(), "Store write persisted");
                    events.publish(StoreEvent::Persisted(StoreWrite {
                        path: task_path,
                        operation,
                        user_id: owner,
                        at: Utc::now(),
                    }));
                    true
                }
                Err(e) => {
                    warn!(path = %task_path, operation = operation.as_str(), error = %e, "Store write failed");
                    events.publish(StoreEvent::Failed(StoreFailure {
                        path: task_path,
                        operation,
                        user_id: actor.user_id().map(str::to_string),
                        request_data,
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                        at: Utc::now(),
                    }));
                    false
                }
            }
        });

        Ok(WriteTicket { id, path, handle })
    }
}

fn require_identity(session: &Session, user_id: &str) -> Result<()> {
    session.require_user()?;
    if user_id.trim().is_empty() {
        return Err(Error::AuthenticationRequired);
    }
    Ok(())
}

/// Body returned to API callers for a scheduled write
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledWrite {
    pub id: String,
    pub path: String,
}

impl From<&WriteTicket> for ScheduledWrite {
    fn from(ticket: &WriteTicket) -> Self {
        Self {
            id: ticket.id.clone(),
            path: ticket.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Category;
    use crate::models::TransactionType;
    use crate::test_utils::{dec, expense_input};

    fn store() -> BudgetStore {
        BudgetStore::new(Database::in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_add_transaction_persists() {
        let store = store();
        let alice = Session::user("alice", None);
        let mut events = store.subscribe();

        let ticket = store
            .add_transaction(&alice, "alice", expense_input("42.10", Category::Groceries))
            .unwrap();
        assert!(ticket.path.starts_with("users/alice/transactions/"));
        let id = ticket.id.clone();
        assert!(ticket.persisted().await);

        let transactions = store.transactions(&alice, "alice", None).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].id, id);
        assert_eq!(transactions[0].amount, dec("42.10"));

        match events.recv().await.unwrap() {
            StoreEvent::Persisted(write) => {
                assert_eq!(write.operation, StoreOperation::Create);
                assert_eq!(write.user_id, "alice");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_write_fails_synchronously() {
        let store = store();
        let result = store.add_transaction(
            &Session::anonymous(),
            "alice",
            expense_input("1", Category::Other),
        );
        assert!(matches!(result, Err(Error::AuthenticationRequired)));

        let alice = Session::user("alice", None);
        let result = store.add_transaction(&alice, "", expense_input("1", Category::Other));
        assert!(matches!(result, Err(Error::AuthenticationRequired)));
    }

    #[tokio::test]
    async fn test_invalid_input_fails_synchronously() {
        let store = store();
        let alice = Session::user("alice", None);
        let result = store.add_transaction(&alice, "alice", expense_input("0", Category::Other));
        assert!(matches!(result, Err(Error::InvalidData(_))));

        let result = store.upsert_budget(
            &alice,
            "alice",
            BudgetInput {
                category: Category::Income,
                amount: dec("10"),
            },
        );
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_permission_denied_is_reported_on_channel_not_inline() {
        let store = store();
        let mut events = store.subscribe();
        let mallory = Session::user("mallory", None);

        // The call itself succeeds
        let ticket = store
            .add_transaction(&mallory, "alice", expense_input("13", Category::Gifts))
            .unwrap();
        assert!(!ticket.persisted().await);

        match events.recv().await.unwrap() {
            StoreEvent::Failed(failure) => {
                assert_eq!(failure.kind, "permission_denied");
                assert_eq!(failure.operation, StoreOperation::Create);
                assert_eq!(failure.user_id.as_deref(), Some("mallory"));
                assert!(failure.path.starts_with("users/alice/transactions/"));
                assert_eq!(failure.request_data.unwrap()["merchant"], "Corner Market");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let admin = Session::admin("root", None);
        assert!(store.transactions(&admin, "alice", None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_and_keeps_created_at() {
        let store = store();
        let alice = Session::user("alice", None);
        let ticket = store
            .add_transaction(&alice, "alice", expense_input("10", Category::Transport))
            .unwrap();
        let id = ticket.id.clone();
        assert!(ticket.persisted().await);
        let before = store.transactions(&alice, "alice", None).unwrap()[0].clone();

        let mut replacement = expense_input("25", Category::Travel);
        replacement.merchant = "Airline".to_string();
        replacement.transaction_type = TransactionType::Expense;
        let ticket = store
            .update_transaction(&alice, "alice", &id, replacement)
            .unwrap();
        assert!(ticket.persisted().await);

        let after = store.transactions(&alice, "alice", None).unwrap()[0].clone();
        assert_eq!(after.id, id);
        assert_eq!(after.amount, dec("25"));
        assert_eq!(after.category, Category::Travel);
        assert_eq!(after.merchant, "Airline");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_transaction_fails_on_channel() {
        let store = store();
        let mut events = store.subscribe();
        let alice = Session::user("alice", None);
        let ticket = store
            .update_transaction(&alice, "alice", "ghost", expense_input("5", Category::Other))
            .unwrap();
        assert!(!ticket.persisted().await);

        match events.recv().await.unwrap() {
            StoreEvent::Failed(failure) => {
                assert_eq!(failure.kind, "not_found");
                assert_eq!(failure.operation, StoreOperation::Update);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_cannot_reach_another_users_record() {
        let store = store();
        let alice = Session::user("alice", None);
        let bob = Session::user("bob", None);
        let ticket = store
            .add_transaction(&bob, "bob", expense_input("40", Category::Health))
            .unwrap();
        let bobs_id = ticket.id.clone();
        assert!(ticket.persisted().await);

        let mut events = store.subscribe();
        let ticket = store
            .update_transaction(&alice, "alice", &bobs_id, expense_input("1", Category::Other))
            .unwrap();
        assert!(!ticket.persisted().await);

        match events.recv().await.unwrap() {
            StoreEvent::Failed(failure) => {
                assert_eq!(failure.kind, "not_found");
                assert_eq!(failure.path, format!("users/alice/transactions/{}", bobs_id));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(store.transactions(&alice, "alice", None).unwrap().is_empty());
        let bobs = store.transactions(&bob, "bob", None).unwrap();
        assert_eq!(bobs[0].amount, dec("40"));
    }

    #[tokio::test]
    async fn test_budget_upsert_keyed_by_category() {
        let store = store();
        let alice = Session::user("alice", None);
        for amount in ["100", "150"] {
            let ticket = store
                .upsert_budget(
                    &alice,
                    "alice",
                    BudgetInput {
                        category: Category::Groceries,
                        amount: dec(amount),
                    },
                )
                .unwrap();
            assert_eq!(ticket.id, "Groceries");
            assert!(ticket.persisted().await);
        }

        let budgets = store.budgets(&alice, "alice").unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount, dec("150"));
    }

    #[tokio::test]
    async fn test_reads_are_scoped() {
        let store = store();
        let mut events = store.subscribe();
        let bob = Session::user("bob", None);

        let result = store.budgets(&bob, "alice");
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
        assert!(events.recv().await.unwrap().is_failure());

        assert!(matches!(
            store.users(&bob),
            Err(Error::PermissionDenied(_))
        ));
        assert!(store.users(&Session::admin("root", None)).is_ok());
    }

    #[tokio::test]
    async fn test_profile_upsert_and_account_deletion_stub() {
        let store = store();
        let alice = Session::user("alice", Some("alice@example.com".to_string()));
        let ticket = store
            .upsert_user_profile(
                &alice,
                ProfileInput {
                    email: Some("alice@example.com".to_string()),
                },
            )
            .unwrap();
        assert!(ticket.persisted().await);
        let profile = store.profile(&alice, "alice").unwrap().unwrap();
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));

        assert!(matches!(
            store.upsert_user_profile(
                &alice,
                ProfileInput {
                    email: Some("not-an-email".to_string())
                }
            ),
            Err(Error::InvalidData(_))
        ));

        assert!(matches!(
            store.request_account_deletion(&alice),
            Err(Error::NotImplemented(_))
        ));
    }

    #[test]
    fn test_writes_outside_runtime_are_rejected() {
        let store = store();
        let alice = Session::user("alice", None);
        let result = store.add_transaction(&alice, "alice", expense_input("1", Category::Other));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
