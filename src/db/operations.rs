use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{Account, AccountRow};
use crate::error::DatabaseError;

/// Persistence capability for accounts. Injected into the auth service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persists a new account. Fails with [`DatabaseError::Duplicate`] when
    /// the email is already taken.
    async fn insert(&self, account: &Account) -> Result<Account, DatabaseError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;
}

const ACCOUNT_COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, account_category, created_at, updated_at";

/// PostgreSQL-backed [`AccountStore`].
#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Installs the `accounts` schema.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AccountStore for DbOperations {
    async fn insert(&self, account: &Account) -> Result<Account, DatabaseError> {
        let query = format!(
            r#"
            INSERT INTO accounts (id, first_name, last_name, email, password_hash, account_category, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let row: AccountRow = sqlx::query_as(&query)
            .bind(account.id)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.category.as_str())
            .bind(account.created_at)
            .bind(account.updated_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        row.try_into()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);

        let row: Option<AccountRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let query = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);

        let row: Option<AccountRow> = sqlx::query_as(&query)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(TryInto::try_into).transpose()
    }
}
