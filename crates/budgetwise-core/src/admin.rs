//! Cross-user views for admins
//!
//! Read-only. Every function goes through the store's admin read rule, so a
//! session without the admin claim gets `PermissionDenied`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::aggregation;
use crate::auth::Session;
use crate::error::Result;
use crate::models::{AdminOverview, BudgetWithSpent, Transaction, UserProfile, UserSummary};
use crate::store::BudgetStore;

/// One user's records as shown on the management page
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub id: String,
    pub profile: Option<UserProfile>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<BudgetWithSpent>,
}

/// Profiles plus anyone who has transactions but never saved a profile
fn known_users(profiles: Vec<UserProfile>, transactions: &[Transaction]) -> Vec<UserProfile> {
    let mut users: BTreeMap<String, UserProfile> =
        profiles.into_iter().map(|p| (p.id.clone(), p)).collect();
    for tx in transactions {
        users
            .entry(tx.user_id.clone())
            .and_modify(|p| {
                if tx.created_at < p.created_at {
                    p.created_at = tx.created_at;
                }
            })
            .or_insert_with(|| UserProfile {
                id: tx.user_id.clone(),
                email: None,
                created_at: tx.created_at,
                updated_at: tx.created_at,
            });
    }
    users.into_values().collect()
}

pub fn overview(store: &BudgetStore, session: &Session) -> Result<AdminOverview> {
    let profiles = store.users(session)?;
    let transactions = store.all_transactions(session, None)?;
    let users = known_users(profiles, &transactions);
    Ok(aggregation::admin_overview(users.len(), &transactions))
}

/// One row per user, sorted by id
pub fn user_summaries(store: &BudgetStore, session: &Session) -> Result<Vec<UserSummary>> {
    let profiles = store.users(session)?;
    let transactions = store.all_transactions(session, None)?;

    let mut by_user: HashMap<&str, Vec<Transaction>> = HashMap::new();
    for tx in &transactions {
        by_user.entry(tx.user_id.as_str()).or_default().push(tx.clone());
    }

    Ok(known_users(profiles, &transactions)
        .iter()
        .map(|profile| {
            let owned = by_user
                .get(profile.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            aggregation::user_summary(profile, owned)
        })
        .collect())
}

pub fn user_detail(store: &BudgetStore, session: &Session, user_id: &str) -> Result<UserDetail> {
    session.require_admin()?;
    let profile = store.profile(session, user_id)?;
    let transactions = store.transactions(session, user_id, None)?;
    let budgets = store.budgets(session, user_id)?;
    let budgets = aggregation::budgets_with_spent(&transactions, &budgets);

    Ok(UserDetail {
        id: user_id.to_string(),
        profile,
        transactions,
        budgets,
    })
}

/// Most recent transactions across every user
pub fn latest_transactions(
    store: &BudgetStore,
    session: &Session,
    limit: usize,
) -> Result<Vec<Transaction>> {
    store.all_transactions(session, Some(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Category;
    use crate::db::Database;
    use crate::error::Error;
    use crate::models::ProfileInput;
    use crate::test_utils::{dec, expense_input};

    async fn seeded() -> BudgetStore {
        let store = BudgetStore::new(Database::in_memory().unwrap());
        let alice = Session::user("alice", Some("alice@example.com".to_string()));
        let bob = Session::user("bob", None);

        let ticket = store
            .upsert_user_profile(
                &alice,
                ProfileInput {
                    email: Some("alice@example.com".to_string()),
                },
            )
            .unwrap();
        assert!(ticket.persisted().await);

        for (session, owner, amount) in [(&alice, "alice", "20"), (&alice, "alice", "5"), (&bob, "bob", "7")] {
            let ticket = store
                .add_transaction(session, owner, expense_input(amount, Category::Shopping))
                .unwrap();
            assert!(ticket.persisted().await);
        }
        store
    }

    #[tokio::test]
    async fn test_overview_counts_every_user() {
        let store = seeded().await;
        let admin = Session::admin("root", None);
        let overview = overview(&store, &admin).unwrap();
        assert_eq!(overview.total_users, 2);
        assert_eq!(overview.total_transactions, 3);
        assert_eq!(overview.total_expenses, dec("32"));
    }

    #[tokio::test]
    async fn test_user_summaries() {
        let store = seeded().await;
        let admin = Session::admin("root", None);
        let rows = user_summaries(&store, &admin).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "alice");
        assert_eq!(rows[0].email.as_deref(), Some("alice@example.com"));
        assert_eq!(rows[0].transaction_count, 2);
        assert_eq!(rows[0].balance, dec("-25"));
        assert_eq!(rows[1].id, "bob");
        assert!(rows[1].email.is_none());
    }

    #[tokio::test]
    async fn test_user_detail_and_latest() {
        let store = seeded().await;
        let admin = Session::admin("root", None);
        let detail = user_detail(&store, &admin, "alice").unwrap();
        assert_eq!(detail.transactions.len(), 2);
        assert!(detail.profile.is_some());

        let latest = latest_transactions(&store, &admin, 2).unwrap();
        assert_eq!(latest.len(), 2);
    }

    #[tokio::test]
    async fn test_non_admin_is_denied() {
        let store = seeded().await;
        let alice = Session::user("alice", None);
        assert!(matches!(overview(&store, &alice), Err(Error::PermissionDenied(_))));
        assert!(matches!(
            user_summaries(&store, &alice),
            Err(Error::PermissionDenied(_))
        ));
        assert!(user_detail(&store, &alice, "alice").is_err());
    }
}
