use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::db::models::{TransactionWithUsers, User};
use crate::db::queries;
use crate::domain::{PaymentMethod, Transaction, TransactionKind, TransactionStatus};
use crate::error::AppError;
use crate::handlers::UserSummary;
use crate::validation;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub friend_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: Uuid,
    pub from_user: UserSummary,
    pub to_user: UserSummary,
    pub amount: BigDecimal,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub payment_method: String,
    pub proof_image: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionWithUsers> for TransactionDto {
    fn from(row: TransactionWithUsers) -> Self {
        Self {
            id: row.id,
            from_user: UserSummary {
                id: row.from_user,
                name: row.from_name,
                email: row.from_email,
            },
            to_user: UserSummary {
                id: row.to_user,
                name: row.to_name,
                email: row.to_email,
            },
            amount: row.amount,
            kind: row.kind,
            description: row.description,
            payment_method: row.payment_method,
            proof_image: row.proof_image,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TransactionDto {
    /// Build from a freshly created domain transaction plus the two
    /// participants we already have in hand.
    fn from_domain(tx: &Transaction, from: &User, to: &User) -> Self {
        Self {
            id: tx.id,
            from_user: UserSummary::from(from),
            to_user: UserSummary::from(to),
            amount: tx.amount.clone(),
            kind: tx.kind.to_string(),
            description: tx.description.clone(),
            payment_method: tx.payment_method.to_string(),
            proof_image: tx.proof_image.clone(),
            status: tx.status.to_string(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionDto>,
    pub total: i64,
    pub has_more: bool,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let (rows, total) = match params.friend_id {
        Some(friend_id) => {
            let rows =
                queries::page_transactions_for_pair(&state.db, user.id, friend_id, limit, offset)
                    .await?;
            let total = queries::count_transactions_for_pair(&state.db, user.id, friend_id).await?;
            (rows, total)
        }
        None => {
            let rows = queries::page_transactions_for_user(&state.db, user.id, limit, offset).await?;
            let total = queries::count_transactions_for_user(&state.db, user.id).await?;
            (rows, total)
        }
    };

    Ok(Json(TransactionListResponse {
        transactions: rows.into_iter().map(TransactionDto::from).collect(),
        total,
        has_more: offset + limit < total,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub friend_id: Uuid,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub payment_method: PaymentMethod,
    pub proof_image: Option<String>,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub message: String,
    pub transaction: TransactionDto,
}

pub async fn create_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let amount = validation::parse_amount(&payload.amount)?;
    let description = validation::validate_description(&payload.description)?;
    let proof_image = validation::validate_proof_image(payload.proof_image.as_deref())?;

    if payload.friend_id == user.id {
        return Err(AppError::BadRequest(
            "Cannot create transaction with yourself".to_string(),
        ));
    }

    let friend = queries::find_user_by_id(&state.db, payload.friend_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Friend not found".to_string()))?;

    if !state.gate.is_connected(user.id, friend.id).await? {
        return Err(AppError::NotConnected);
    }

    let tx = Transaction::new(
        user.id,
        friend.id,
        amount,
        payload.kind,
        description,
        payload.payment_method,
        proof_image,
    );
    let tx = state.store.append(&tx).await?;

    tracing::info!(
        transaction_id = %tx.id,
        from = %tx.from,
        to = %tx.to,
        kind = %tx.kind,
        "transaction created"
    );

    Ok(Json(TransactionResponse {
        message: "Transaction created successfully".to_string(),
        transaction: TransactionDto::from_domain(&tx, &user, &friend),
    }))
}

#[derive(Serialize)]
pub struct TransactionDetailResponse {
    pub transaction: TransactionDto,
}

pub async fn get_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = queries::find_transaction_with_users(&state.db, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

    if row.from_user != user.id && row.to_user != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to view this transaction".to_string(),
        ));
    }

    Ok(Json(TransactionDetailResponse {
        transaction: TransactionDto::from(row),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    pub amount: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedTransactionDto {
    pub id: Uuid,
    pub amount: BigDecimal,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct UpdateTransactionResponse {
    pub message: String,
    pub transaction: UpdatedTransactionDto,
}

pub async fn update_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = queries::find_transaction(&state.db, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

    // Only the creator can edit the transaction.
    if record.from_user != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to edit this transaction".to_string(),
        ));
    }

    if record.status == TransactionStatus::Cancelled.as_str() {
        return Err(AppError::Conflict(
            "Cannot edit a cancelled transaction".to_string(),
        ));
    }

    let amount = payload
        .amount
        .as_deref()
        .map(validation::parse_amount)
        .transpose()?;
    let description = payload
        .description
        .as_deref()
        .map(validation::validate_description)
        .transpose()?;

    let updated =
        queries::update_transaction(&state.db, record.id, amount, description).await?;

    Ok(Json(UpdateTransactionResponse {
        message: "Transaction updated successfully".to_string(),
        transaction: UpdatedTransactionDto {
            id: updated.id,
            amount: updated.amount,
            description: updated.description,
            updated_at: updated.updated_at,
        },
    }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = queries::find_transaction(&state.db, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

    // Only the creator can delete the transaction.
    if record.from_user != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this transaction".to_string(),
        ));
    }

    queries::delete_transaction(&state.db, record.id).await?;

    tracing::info!(transaction_id = %record.id, "transaction deleted");

    Ok(Json(MessageResponse {
        message: "Transaction deleted successfully".to_string(),
    }))
}
