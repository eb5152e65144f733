pub mod balance;
pub mod transaction;

pub use balance::{Balance, BalanceStatus, BalanceSummary};
pub use transaction::{
    PaymentMethod, Transaction, TransactionKind, TransactionStatus, SETTLEMENT_DESCRIPTION,
};
