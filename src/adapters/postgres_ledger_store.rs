//! Postgres implementation of the ledger ports.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::FRIENDSHIP_ACCEPTED;
use crate::domain::Transaction;
use crate::ports::{FriendshipGate, RepositoryError, RepositoryResult, TransactionStore};

/// Postgres-backed transaction store and friendship gate.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PostgresLedgerStore {
    async fn find_by_participant(&self, user: Uuid) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE from_user = $1 OR to_user = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn find_by_pair(&self, a: Uuid, b: Uuid) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE (from_user = $1 AND to_user = $2)
               OR (from_user = $2 AND to_user = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    async fn append(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, from_user, to_user, amount, kind, description,
                payment_method, proof_image, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tx.id)
        .bind(tx.from)
        .bind(tx.to)
        .bind(&tx.amount)
        .bind(tx.kind.as_str())
        .bind(&tx.description)
        .bind(tx.payment_method.as_str())
        .bind(&tx.proof_image)
        .bind(tx.status.as_str())
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }
}

#[async_trait]
impl FriendshipGate for PostgresLedgerStore {
    async fn is_connected(&self, a: Uuid, b: Uuid) -> RepositoryResult<bool> {
        let connected = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM friendships
                WHERE ((requester = $1 AND recipient = $2)
                    OR (requester = $2 AND recipient = $1))
                  AND status = $3
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(FRIENDSHIP_ACCEPTED)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(connected)
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    from_user: Uuid,
    to_user: Uuid,
    amount: sqlx::types::BigDecimal,
    kind: String,
    description: String,
    payment_method: String,
    proof_image: Option<String>,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        Ok(Transaction {
            id: self.id,
            from: self.from_user,
            to: self.to_user,
            amount: self.amount,
            kind: self.kind.parse().map_err(RepositoryError::Decode)?,
            description: self.description,
            payment_method: self
                .payment_method
                .parse()
                .map_err(RepositoryError::Decode)?,
            proof_image: self.proof_image,
            status: self.status.parse().map_err(RepositoryError::Decode)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
