//! Derived balance value objects. Never persisted; recomputed from the
//! completed-transaction set on every query.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Reading of a signed balance from the reference user's perspective.
/// Positive balances mean the counterparty owes the reference user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    OwesYou,
    YouOwe,
    Settled,
}

/// Net position against a single counterparty, rounded to cents.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub counterparty: Uuid,
    pub amount: BigDecimal,
    pub status: BalanceStatus,
    pub transaction_count: usize,
    pub last_transaction_at: Option<DateTime<Utc>>,
}

/// Aggregate position across all counterparties, rounded to cents.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSummary {
    pub total_receivable: BigDecimal,
    pub total_payable: BigDecimal,
    pub net_balance: BigDecimal,
}
