//! Collaborator interfaces consumed by the ledger core. The core reads and
//! writes transactions only through these traits, so there is exactly one
//! source of truth for balance inputs.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::Transaction;
use crate::error::AppError;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Decode(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => AppError::Database(e),
            RepositoryError::Decode(msg) => AppError::Internal(msg),
        }
    }
}

/// Persistence surface for transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Every transaction where `user` is sender or receiver, any status.
    async fn find_by_participant(&self, user: Uuid) -> RepositoryResult<Vec<Transaction>>;

    /// Every transaction between `a` and `b`, in either direction, any status.
    async fn find_by_pair(&self, a: Uuid, b: Uuid) -> RepositoryResult<Vec<Transaction>>;

    /// Persist one new transaction. Existing rows are never mutated here.
    async fn append(&self, tx: &Transaction) -> RepositoryResult<Transaction>;
}

/// Predicate over the friendship relation, required before any transaction
/// may be created or settled between two users.
#[async_trait]
pub trait FriendshipGate: Send + Sync {
    async fn is_connected(&self, a: Uuid, b: Uuid) -> RepositoryResult<bool>;
}
