//! Transaction domain entity.
//! Framework-agnostic representation of one directed money event
//! between two users.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Description written onto every synthetic settlement transaction.
pub const SETTLEMENT_DESCRIPTION: &str = "Balance settlement";

/// Closed set of transaction kinds. A loan creates a receivable for the
/// sender; a payment discharges a receivable held by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Loan,
    Payment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Loan => "loan",
            TransactionKind::Payment => "payment",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loan" => Ok(TransactionKind::Loan),
            "payment" => Ok(TransactionKind::Payment),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PaymentMethod::Online),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Only `Completed` transactions participate in balance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Domain entity representing a transaction. `from != to` and `amount > 0`
/// are enforced upstream at creation and by database constraints.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    pub amount: BigDecimal,
    pub kind: TransactionKind,
    pub description: String,
    pub payment_method: PaymentMethod,
    pub proof_image: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        from: Uuid,
        to: Uuid,
        amount: BigDecimal,
        kind: TransactionKind,
        description: String,
        payment_method: PaymentMethod,
        proof_image: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            amount,
            kind,
            description,
            payment_method,
            proof_image,
            status: TransactionStatus::Completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// The synthetic payment that zeroes out a pair's balance.
    pub fn settlement(from: Uuid, to: Uuid, amount: BigDecimal) -> Self {
        Self::new(
            from,
            to,
            amount,
            TransactionKind::Payment,
            SETTLEMENT_DESCRIPTION.to_string(),
            PaymentMethod::Online,
            None,
        )
    }

    pub fn involves(&self, user: Uuid) -> bool {
        self.from == user || self.to == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transaction_defaults_to_completed() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(100),
            TransactionKind::Loan,
            "Lunch money".to_string(),
            PaymentMethod::Cash,
            None,
        );

        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.created_at, tx.updated_at);
    }

    #[test]
    fn settlement_is_a_completed_payment() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let tx = Transaction::settlement(from, to, BigDecimal::from(300));

        assert_eq!(tx.kind, TransactionKind::Payment);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.description, SETTLEMENT_DESCRIPTION);
        assert_eq!(tx.from, from);
        assert_eq!(tx.to, to);
    }

    #[test]
    fn kind_round_trips_through_strings() {
        assert_eq!("loan".parse::<TransactionKind>(), Ok(TransactionKind::Loan));
        assert_eq!(TransactionKind::Payment.as_str(), "payment");
        assert!("transfer".parse::<TransactionKind>().is_err());
    }
}
