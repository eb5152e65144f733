use sqlx::types::BigDecimal;
use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::db::models::{
    FriendDetail, FriendRequestDetail, Friendship, TransactionRecord, TransactionWithUsers, User,
    FRIENDSHIP_ACCEPTED, FRIENDSHIP_PENDING,
};

// --- User queries ---

pub async fn insert_user(pool: &PgPool, user: &User) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

// --- Friendship queries ---

/// Any relation between the two users, in either direction, any status.
pub async fn find_relation_between(pool: &PgPool, a: Uuid, b: Uuid) -> Result<Option<Friendship>> {
    sqlx::query_as::<_, Friendship>(
        r#"
        SELECT * FROM friendships
        WHERE (requester = $1 AND recipient = $2)
           OR (requester = $2 AND recipient = $1)
        LIMIT 1
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_optional(pool)
    .await
}

pub async fn insert_friendship(pool: &PgPool, friendship: &Friendship) -> Result<Friendship> {
    sqlx::query_as::<_, Friendship>(
        r#"
        INSERT INTO friendships (id, requester, recipient, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(friendship.id)
    .bind(friendship.requester)
    .bind(friendship.recipient)
    .bind(&friendship.status)
    .bind(friendship.created_at)
    .bind(friendship.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn find_friendship(pool: &PgPool, id: Uuid) -> Result<Option<Friendship>> {
    sqlx::query_as::<_, Friendship>("SELECT * FROM friendships WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn set_friendship_status(pool: &PgPool, id: Uuid, status: &str) -> Result<Friendship> {
    sqlx::query_as::<_, Friendship>(
        "UPDATE friendships SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(pool)
    .await
}

pub async fn delete_friendship(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM friendships WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove an accepted friendship between the two users. Returns the number
/// of rows removed (0 when they were not friends).
pub async fn delete_accepted_between(pool: &PgPool, a: Uuid, b: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM friendships
        WHERE ((requester = $1 AND recipient = $2) OR (requester = $2 AND recipient = $1))
          AND status = $3
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(FRIENDSHIP_ACCEPTED)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_accepted_friends(pool: &PgPool, user: Uuid) -> Result<Vec<FriendDetail>> {
    sqlx::query_as::<_, FriendDetail>(
        r#"
        SELECT f.id AS friendship_id,
               u.id AS friend_id,
               u.name,
               u.email,
               f.updated_at AS connected_at
        FROM friendships f
        JOIN users u
          ON u.id = CASE WHEN f.requester = $1 THEN f.recipient ELSE f.requester END
        WHERE (f.requester = $1 OR f.recipient = $1)
          AND f.status = $2
        ORDER BY f.updated_at DESC
        "#,
    )
    .bind(user)
    .bind(FRIENDSHIP_ACCEPTED)
    .fetch_all(pool)
    .await
}

pub async fn list_incoming_requests(pool: &PgPool, user: Uuid) -> Result<Vec<FriendRequestDetail>> {
    sqlx::query_as::<_, FriendRequestDetail>(
        r#"
        SELECT f.id, u.id AS user_id, u.name, u.email, f.created_at
        FROM friendships f
        JOIN users u ON u.id = f.requester
        WHERE f.recipient = $1 AND f.status = $2
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user)
    .bind(FRIENDSHIP_PENDING)
    .fetch_all(pool)
    .await
}

pub async fn list_outgoing_requests(pool: &PgPool, user: Uuid) -> Result<Vec<FriendRequestDetail>> {
    sqlx::query_as::<_, FriendRequestDetail>(
        r#"
        SELECT f.id, u.id AS user_id, u.name, u.email, f.created_at
        FROM friendships f
        JOIN users u ON u.id = f.recipient
        WHERE f.requester = $1 AND f.status = $2
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user)
    .bind(FRIENDSHIP_PENDING)
    .fetch_all(pool)
    .await
}

// --- Transaction queries (request-layer CRUD; the ledger core reads and
// --- writes through ports::TransactionStore instead) ---

const TRANSACTION_WITH_USERS: &str = r#"
    SELECT t.id, t.from_user, t.to_user, t.amount, t.kind, t.description,
           t.payment_method, t.proof_image, t.status, t.created_at, t.updated_at,
           fu.name AS from_name, fu.email AS from_email,
           tu.name AS to_name, tu.email AS to_email
    FROM transactions t
    JOIN users fu ON fu.id = t.from_user
    JOIN users tu ON tu.id = t.to_user
"#;

pub async fn page_transactions_for_user(
    pool: &PgPool,
    user: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<TransactionWithUsers>> {
    let sql = format!(
        "{TRANSACTION_WITH_USERS} WHERE t.from_user = $1 OR t.to_user = $1 \
         ORDER BY t.created_at DESC LIMIT $2 OFFSET $3"
    );
    sqlx::query_as::<_, TransactionWithUsers>(&sql)
        .bind(user)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn page_transactions_for_pair(
    pool: &PgPool,
    user: Uuid,
    friend: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<TransactionWithUsers>> {
    let sql = format!(
        "{TRANSACTION_WITH_USERS} WHERE (t.from_user = $1 AND t.to_user = $2) \
         OR (t.from_user = $2 AND t.to_user = $1) \
         ORDER BY t.created_at DESC LIMIT $3 OFFSET $4"
    );
    sqlx::query_as::<_, TransactionWithUsers>(&sql)
        .bind(user)
        .bind(friend)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_transactions_for_user(pool: &PgPool, user: Uuid) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM transactions WHERE from_user = $1 OR to_user = $1",
    )
    .bind(user)
    .fetch_one(pool)
    .await
}

pub async fn count_transactions_for_pair(pool: &PgPool, user: Uuid, friend: Uuid) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM transactions
        WHERE (from_user = $1 AND to_user = $2) OR (from_user = $2 AND to_user = $1)
        "#,
    )
    .bind(user)
    .bind(friend)
    .fetch_one(pool)
    .await
}

pub async fn find_transaction(pool: &PgPool, id: Uuid) -> Result<Option<TransactionRecord>> {
    sqlx::query_as::<_, TransactionRecord>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_transaction_with_users(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<TransactionWithUsers>> {
    let sql = format!("{TRANSACTION_WITH_USERS} WHERE t.id = $1");
    sqlx::query_as::<_, TransactionWithUsers>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Creator-side edit of amount and/or description; untouched fields keep
/// their values, `updated_at` always advances.
pub async fn update_transaction(
    pool: &PgPool,
    id: Uuid,
    amount: Option<BigDecimal>,
    description: Option<String>,
) -> Result<TransactionRecord> {
    sqlx::query_as::<_, TransactionRecord>(
        r#"
        UPDATE transactions
        SET amount = COALESCE($2, amount),
            description = COALESCE($3, description),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(amount)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn delete_transaction(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM transactions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
