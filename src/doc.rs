//! Generated OpenAPI document for the HTTP surface.

use axum::Json;
use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::balances::list_balances,
        handlers::settlement::settle,
    ),
    components(schemas(
        handlers::HealthStatus,
        handlers::DbPoolStats,
        handlers::UserSummary,
        handlers::balances::BalancesResponse,
        handlers::balances::BalanceEntry,
        handlers::balances::BalanceSummaryDto,
        handlers::settlement::SettleRequest,
        handlers::settlement::SettleResponse,
        handlers::settlement::SettlementDto,
        handlers::settlement::SettlementTransactionDto,
        crate::domain::BalanceStatus,
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Balances", description = "Balance derivation and settlement")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
