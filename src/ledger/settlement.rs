//! Settlement operation: read the pair's balance, then append the single
//! synthetic payment that zeroes it. The read and the write form one unit
//! serialized per unordered pair, so two racing requests cannot both
//! observe the same non-zero balance and double-settle.

use bigdecimal::BigDecimal;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::Transaction;
use crate::error::AppError;
use crate::ledger::engine;
use crate::ports::{FriendshipGate, TransactionStore};

/// Outcome of a successful settlement.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub transaction: Transaction,
    pub amount: BigDecimal,
    pub paid_by: Uuid,
    pub received_by: Uuid,
}

pub struct SettlementService {
    store: Arc<dyn TransactionStore>,
    gate: Arc<dyn FriendshipGate>,
    in_flight: Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
}

impl SettlementService {
    pub fn new(store: Arc<dyn TransactionStore>, gate: Arc<dyn FriendshipGate>) -> Self {
        Self {
            store,
            gate,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Settle the outstanding balance between `user` and `counterparty`.
    ///
    /// Exactly one transaction is appended on success; on any failure the
    /// store is untouched. A second settlement racing this one on the same
    /// pair is rejected with `ConcurrentSettlement` rather than applied.
    pub async fn settle(&self, user: Uuid, counterparty: Uuid) -> Result<Settlement, AppError> {
        if user == counterparty {
            return Err(AppError::BadRequest(
                "Cannot settle a balance with yourself".to_string(),
            ));
        }

        if !self.gate.is_connected(user, counterparty).await? {
            return Err(AppError::NotConnected);
        }

        let _guard = PairGuard::acquire(&self.in_flight, user, counterparty)
            .ok_or(AppError::ConcurrentSettlement)?;

        let transactions = self.store.find_by_pair(user, counterparty).await?;
        let plan = engine::plan_settlement(user, counterparty, &transactions)
            .ok_or(AppError::NothingToSettle)?;

        let settlement_tx =
            Transaction::settlement(plan.from, plan.to, plan.amount.clone());
        let appended = self.store.append(&settlement_tx).await?;

        tracing::info!(
            payer = %plan.from,
            payee = %plan.to,
            amount = %plan.amount,
            transaction_id = %appended.id,
            "balance settled"
        );

        Ok(Settlement {
            transaction: appended,
            amount: plan.amount,
            paid_by: plan.from,
            received_by: plan.to,
        })
    }
}

/// Marks an unordered pair as having a settlement in flight; the mark is
/// dropped with the guard, on success and on error alike.
struct PairGuard {
    set: Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
    key: (Uuid, Uuid),
}

impl PairGuard {
    fn acquire(set: &Arc<Mutex<HashSet<(Uuid, Uuid)>>>, a: Uuid, b: Uuid) -> Option<Self> {
        let key = if a < b { (a, b) } else { (b, a) };
        let mut in_flight = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(key) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            key,
        })
    }
}

impl Drop for PairGuard {
    fn drop(&mut self) {
        let mut in_flight = self
            .set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentMethod, TransactionKind, SETTLEMENT_DESCRIPTION};
    use crate::ports::{RepositoryResult, TransactionStore};
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::time::Duration;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal literal")
    }

    /// Store double backed by a vec, with an optional artificial delay on
    /// reads so tests can hold a settlement in flight.
    struct InMemoryStore {
        transactions: Mutex<Vec<Transaction>>,
        read_delay: Option<Duration>,
    }

    impl InMemoryStore {
        fn new(transactions: Vec<Transaction>) -> Self {
            Self {
                transactions: Mutex::new(transactions),
                read_delay: None,
            }
        }

        fn with_read_delay(transactions: Vec<Transaction>, delay: Duration) -> Self {
            Self {
                transactions: Mutex::new(transactions),
                read_delay: Some(delay),
            }
        }

        fn snapshot(&self) -> Vec<Transaction> {
            self.transactions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransactionStore for InMemoryStore {
        async fn find_by_participant(&self, user: Uuid) -> RepositoryResult<Vec<Transaction>> {
            Ok(self
                .snapshot()
                .into_iter()
                .filter(|tx| tx.involves(user))
                .collect())
        }

        async fn find_by_pair(&self, a: Uuid, b: Uuid) -> RepositoryResult<Vec<Transaction>> {
            if let Some(delay) = self.read_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self
                .snapshot()
                .into_iter()
                .filter(|tx| tx.involves(a) && tx.involves(b))
                .collect())
        }

        async fn append(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
            self.transactions.lock().unwrap().push(tx.clone());
            Ok(tx.clone())
        }
    }

    struct EveryoneConnected;

    #[async_trait]
    impl FriendshipGate for EveryoneConnected {
        async fn is_connected(&self, _a: Uuid, _b: Uuid) -> RepositoryResult<bool> {
            Ok(true)
        }
    }

    struct NobodyConnected;

    #[async_trait]
    impl FriendshipGate for NobodyConnected {
        async fn is_connected(&self, _a: Uuid, _b: Uuid) -> RepositoryResult<bool> {
            Ok(false)
        }
    }

    fn loan(from: Uuid, to: Uuid, amount: &str) -> Transaction {
        Transaction::new(
            from,
            to,
            dec(amount),
            TransactionKind::Loan,
            "test".to_string(),
            PaymentMethod::Cash,
            None,
        )
    }

    fn service(store: Arc<InMemoryStore>) -> SettlementService {
        SettlementService::new(store, Arc::new(EveryoneConnected))
    }

    #[tokio::test]
    async fn settlement_zeroes_the_pair_balance() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(InMemoryStore::new(vec![loan(a, b, "300")]));

        let settlement = service(Arc::clone(&store)).settle(a, b).await.unwrap();

        assert_eq!(settlement.amount, dec("300.00"));
        assert_eq!(settlement.paid_by, b);
        assert_eq!(settlement.received_by, a);
        assert_eq!(settlement.transaction.description, SETTLEMENT_DESCRIPTION);
        assert_eq!(settlement.transaction.kind, TransactionKind::Payment);

        let after = store.snapshot();
        assert_eq!(after.len(), 2);
        let balance = engine::pair_balance(a, b, &after);
        assert!(balance.abs() < engine::settle_tolerance());
    }

    #[tokio::test]
    async fn debtor_side_settlement_pays_out() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // b lent to a, so a owes and a pays.
        let store = Arc::new(InMemoryStore::new(vec![loan(b, a, "120.50")]));

        let settlement = service(store).settle(a, b).await.unwrap();

        assert_eq!(settlement.paid_by, a);
        assert_eq!(settlement.received_by, b);
        assert_eq!(settlement.amount, dec("120.50"));
    }

    #[tokio::test]
    async fn settled_pair_is_rejected_and_store_unchanged() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(InMemoryStore::new(vec![]));

        let result = service(Arc::clone(&store)).settle(a, b).await;

        assert!(matches!(result, Err(AppError::NothingToSettle)));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn settlement_requires_friendship() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(InMemoryStore::new(vec![loan(a, b, "50")]));
        let service = SettlementService::new(store.clone(), Arc::new(NobodyConnected));

        let result = service.settle(a, b).await;

        assert!(matches!(result, Err(AppError::NotConnected)));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn self_settlement_is_rejected() {
        let a = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new(vec![]));

        let result = service(store).settle(a, a).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn concurrent_settlement_on_same_pair_is_rejected() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(InMemoryStore::with_read_delay(
            vec![loan(a, b, "300")],
            Duration::from_millis(200),
        ));
        let service = Arc::new(service(Arc::clone(&store)));

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.settle(a, b).await })
        };
        // Give the first request time to take the pair guard and park in
        // the slow read.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = service.settle(b, a).await;

        assert!(matches!(second, Err(AppError::ConcurrentSettlement)));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.amount, dec("300.00"));
        // Exactly one settlement was appended.
        assert_eq!(store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn pair_guard_is_released_after_failure() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let store = Arc::new(InMemoryStore::new(vec![]));
        let service = service(Arc::clone(&store));

        assert!(matches!(
            service.settle(a, b).await,
            Err(AppError::NothingToSettle)
        ));

        // The guard from the failed attempt must not linger.
        store.transactions.lock().unwrap().push(loan(a, b, "75"));
        let settlement = service.settle(a, b).await.unwrap();
        assert_eq!(settlement.amount, dec("75.00"));
    }
}
