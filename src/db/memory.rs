//! In-process account store for tests and local runs without PostgreSQL.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::Account;
use crate::db::operations::AccountStore;
use crate::error::DatabaseError;

/// [`AccountStore`] backed by a `HashMap`, with the same email uniqueness
/// rule as the `accounts` table.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &Account) -> Result<Account, DatabaseError> {
        // Check and insert under one write lock so concurrent duplicates cannot both land.
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account.id) || accounts.values().any(|a| a.email == account.email) {
            return Err(DatabaseError::Duplicate);
        }

        accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }
}
