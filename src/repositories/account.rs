use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;

use crate::{
    error::{AppError, Result},
    models::account::{Account, NewAccount},
};

/// Storage contract for accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts an account; a taken email is `AppError::Conflict`.
    async fn save(&self, account: NewAccount) -> Result<Account>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;
}

/// PostgreSQL implementation over the `account` table.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: Pool,
}

impl PgAccountRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn save(&self, account: NewAccount) -> Result<Account> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached(
                r#"
                INSERT INTO account (email, password_hash, first_name, last_name, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, email, password_hash, first_name, last_name, created_at, last_modified_at
                "#,
            )
            .await?;

        let row = client
            .query_one(
                &statement,
                &[
                    &account.email,
                    &account.password_hash,
                    &account.first_name,
                    &account.last_name,
                    &account.created_at,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    AppError::Conflict("Email is already registered".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(Account::from(&row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached(
                r#"
                SELECT id, email, password_hash, first_name, last_name, created_at, last_modified_at
                FROM account
                WHERE email = $1
                "#,
            )
            .await?;

        let row = client.query_opt(&statement, &[&email]).await?;
        Ok(row.as_ref().map(Account::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let client = self.pool.get().await?;
        let statement = client
            .prepare_cached(
                r#"
                SELECT id, email, password_hash, first_name, last_name, created_at, last_modified_at
                FROM account
                WHERE id = $1
                "#,
            )
            .await?;

        let row = client.query_opt(&statement, &[&id]).await?;
        Ok(row.as_ref().map(Account::from))
    }
}
