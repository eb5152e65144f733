use axum::{Json, extract::State, response::IntoResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::db::queries;
use crate::domain::Transaction;
use crate::error::AppError;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub friend_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementTransactionDto {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub payment_method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Transaction> for SettlementTransactionDto {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            from: tx.from,
            to: tx.to,
            amount: tx.amount.clone(),
            kind: tx.kind.to_string(),
            description: tx.description.clone(),
            payment_method: tx.payment_method.to_string(),
            status: tx.status.to_string(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementDto {
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub paid_by: String,
    pub received_by: String,
    pub transaction: SettlementTransactionDto,
}

#[derive(Serialize, ToSchema)]
pub struct SettleResponse {
    pub message: String,
    pub settlement: SettlementDto,
}

/// Settle the outstanding balance with a friend by appending the single
/// payment that zeroes it.
#[utoipa::path(
    post,
    path = "/api/transactions/settle",
    request_body = SettleRequest,
    responses(
        (status = 200, description = "Balance settled", body = SettleResponse),
        (status = 400, description = "No outstanding balance to settle"),
        (status = 403, description = "Users are not friends"),
        (status = 404, description = "Friend not found"),
        (status = 409, description = "A settlement for this pair is already in progress")
    ),
    tag = "Balances"
)]
pub async fn settle(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SettleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let friend = queries::find_user_by_id(&state.db, payload.friend_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Friend not found".to_string()))?;

    let settlement = state.settlements.settle(user.id, friend.id).await?;

    let (paid_by, received_by) = if settlement.paid_by == user.id {
        (user.name.clone(), friend.name.clone())
    } else {
        (friend.name.clone(), user.name.clone())
    };

    Ok(Json(SettleResponse {
        message: "Balance settled successfully".to_string(),
        settlement: SettlementDto {
            amount: settlement.amount,
            paid_by,
            received_by,
            transaction: SettlementTransactionDto::from(&settlement.transaction),
        },
    }))
}
