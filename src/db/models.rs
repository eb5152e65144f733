use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::BigDecimal;
use uuid::Uuid;

pub const FRIENDSHIP_PENDING: &str = "pending";
pub const FRIENDSHIP_ACCEPTED: &str = "accepted";
pub const FRIENDSHIP_REJECTED: &str = "rejected";

/// Account row. `password_hash` stays server-side; response payloads are
/// built from dedicated DTOs.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Directed friendship record; the relation itself is undirected, unique
/// per ordered (requester, recipient) pair.
#[derive(Debug, Clone, FromRow)]
pub struct Friendship {
    pub id: Uuid,
    pub requester: Uuid,
    pub recipient: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    pub fn request(requester: Uuid, recipient: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            requester,
            recipient,
            status: FRIENDSHIP_PENDING.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FRIENDSHIP_PENDING
    }

    pub fn is_accepted(&self) -> bool {
        self.status == FRIENDSHIP_ACCEPTED
    }
}

/// Accepted friendship joined with the counterpart user's details.
#[derive(Debug, Clone, FromRow)]
pub struct FriendDetail {
    pub friendship_id: Uuid,
    pub friend_id: Uuid,
    pub name: String,
    pub email: String,
    pub connected_at: DateTime<Utc>,
}

/// Pending friend request joined with the counterpart user's details.
#[derive(Debug, Clone, FromRow)]
pub struct FriendRequestDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Raw transaction row as the request layer reads it for CRUD and
/// permission checks. The ledger core gets typed domain transactions
/// through the store port instead.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub amount: BigDecimal,
    pub kind: String,
    pub description: String,
    pub payment_method: String,
    pub proof_image: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction row joined with both participants' names and emails, for
/// enriched history listings.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionWithUsers {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub amount: BigDecimal,
    pub kind: String,
    pub description: String,
    pub payment_method: String,
    pub proof_image: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub from_name: String,
    pub from_email: String,
    pub to_name: String,
    pub to_email: String,
}
