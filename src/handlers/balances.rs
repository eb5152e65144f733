use axum::{Json, extract::State, response::IntoResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::db::queries;
use crate::domain::BalanceStatus;
use crate::error::AppError;
use crate::handlers::UserSummary;
use crate::ledger::engine;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub friend: UserSummary,
    #[schema(value_type = String)]
    pub balance: BigDecimal,
    pub status: BalanceStatus,
    pub transaction_count: usize,
    pub last_transaction: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummaryDto {
    #[schema(value_type = String)]
    pub total_receivable: BigDecimal,
    #[schema(value_type = String)]
    pub total_payable: BigDecimal,
    #[schema(value_type = String)]
    pub net_balance: BigDecimal,
}

#[derive(Serialize, ToSchema)]
pub struct BalancesResponse {
    pub balances: Vec<BalanceEntry>,
    pub summary: BalanceSummaryDto,
}

/// Balances with every accepted friend, derived on the fly from the
/// completed-transaction set.
#[utoipa::path(
    get,
    path = "/api/transactions/balances",
    responses(
        (status = 200, description = "Per-friend balances and aggregate summary", body = BalancesResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Balances"
)]
pub async fn list_balances(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let friends = queries::list_accepted_friends(&state.db, user.id).await?;
    let transactions = state.store.find_by_participant(user.id).await?;

    let friend_ids: Vec<Uuid> = friends.iter().map(|f| f.friend_id).collect();
    let (balances, summary) = engine::compute_balances(user.id, &friend_ids, &transactions);

    let balances = friends
        .into_iter()
        .zip(balances)
        .map(|(friend, balance)| BalanceEntry {
            friend: UserSummary {
                id: friend.friend_id,
                name: friend.name,
                email: friend.email,
            },
            balance: balance.amount,
            status: balance.status,
            transaction_count: balance.transaction_count,
            last_transaction: balance.last_transaction_at,
        })
        .collect();

    Ok(Json(BalancesResponse {
        balances,
        summary: BalanceSummaryDto {
            total_receivable: summary.total_receivable,
            total_payable: summary.total_payable,
            net_balance: summary.net_balance,
        },
    }))
}
