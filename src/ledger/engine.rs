//! Balance engine.
//!
//! Collapses a set of directional loan/payment transactions into signed
//! per-counterparty balances and an aggregate summary. This is the only
//! place in the codebase where the owes/owed sign convention lives: from
//! the reference user's perspective a positive balance means the
//! counterparty owes them.
//!
//! The whole module is a pure function of its inputs. Only `completed`
//! transactions contribute; aggregation is plain summation, so the result
//! is independent of transaction order; rounding to cents happens once at
//! the output boundary, never on intermediate sums.

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::{Balance, BalanceStatus, BalanceSummary, Transaction, TransactionKind,
    TransactionStatus};

/// Balances within one cent of zero are reported as settled, absorbing any
/// representational drift from upstream sources.
pub fn settle_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// Round half away from zero to two decimal places, keeping a fixed
/// two-digit scale for display.
pub fn round_to_cents(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}

/// Signed contribution of one transaction to `balance(user, counterparty)`.
///
/// A loan sent by `user` creates a receivable (+); a loan received creates
/// a debt (-). Payments move the balance the opposite way relative to the
/// same sender, because a payment discharges a receivable rather than
/// creating one. Returns `None` for transactions that are not completed or
/// do not touch `user`.
pub fn contribution(user: Uuid, tx: &Transaction) -> Option<BigDecimal> {
    if tx.status != TransactionStatus::Completed {
        return None;
    }
    // from == to is impossible by upstream invariant; skip rather than panic.
    if tx.from == tx.to {
        return None;
    }

    match (tx.kind, tx.from == user, tx.to == user) {
        (TransactionKind::Loan, true, _) => Some(tx.amount.clone()),
        (TransactionKind::Loan, _, true) => Some(-tx.amount.clone()),
        (TransactionKind::Payment, true, _) => Some(-tx.amount.clone()),
        (TransactionKind::Payment, _, true) => Some(tx.amount.clone()),
        _ => None,
    }
}

fn between_pair(tx: &Transaction, a: Uuid, b: Uuid) -> bool {
    (tx.from == a && tx.to == b) || (tx.from == b && tx.to == a)
}

/// Raw (unrounded) signed balance between `user` and `counterparty` over
/// the given transaction set.
pub fn pair_balance(user: Uuid, counterparty: Uuid, txs: &[Transaction]) -> BigDecimal {
    txs.iter()
        .filter(|tx| between_pair(tx, user, counterparty))
        .filter_map(|tx| contribution(user, tx))
        .fold(BigDecimal::from(0), |acc, c| acc + c)
}

/// Status of a (rounded) balance amount from the reference user's side.
pub fn status_for(amount: &BigDecimal) -> BalanceStatus {
    if amount.abs() < settle_tolerance() {
        BalanceStatus::Settled
    } else if *amount > BigDecimal::from(0) {
        BalanceStatus::OwesYou
    } else {
        BalanceStatus::YouOwe
    }
}

/// Full balance value object for one counterparty.
pub fn balance_with(user: Uuid, counterparty: Uuid, txs: &[Transaction]) -> Balance {
    let completed: Vec<&Transaction> = txs
        .iter()
        .filter(|tx| {
            tx.status == TransactionStatus::Completed && between_pair(tx, user, counterparty)
        })
        .collect();

    let raw = completed
        .iter()
        .filter_map(|tx| contribution(user, tx))
        .fold(BigDecimal::from(0), |acc, c| acc + c);

    let amount = round_to_cents(&raw);
    let status = status_for(&amount);
    let last_transaction_at = completed.iter().map(|tx| tx.created_at).max();

    Balance {
        counterparty,
        amount,
        status,
        transaction_count: completed.len(),
        last_transaction_at,
    }
}

/// One balance per counterparty (in the order given, so counterparties
/// without transactions still show up as settled zeros) plus the summary.
pub fn compute_balances(
    user: Uuid,
    counterparties: &[Uuid],
    txs: &[Transaction],
) -> (Vec<Balance>, BalanceSummary) {
    let balances: Vec<Balance> = counterparties
        .iter()
        .map(|&counterparty| balance_with(user, counterparty, txs))
        .collect();
    let summary = summarize(&balances);
    (balances, summary)
}

/// Aggregate receivable/payable totals across per-counterparty balances.
pub fn summarize(balances: &[Balance]) -> BalanceSummary {
    let zero = BigDecimal::from(0);
    let mut total_receivable = zero.clone();
    let mut total_payable = zero.clone();

    for balance in balances {
        if balance.amount > zero {
            total_receivable = &total_receivable + &balance.amount;
        } else if balance.amount < zero {
            total_payable = &total_payable + &balance.amount.abs();
        }
    }

    let net_balance = &total_receivable - &total_payable;

    BalanceSummary {
        total_receivable: round_to_cents(&total_receivable),
        total_payable: round_to_cents(&total_payable),
        net_balance: round_to_cents(&net_balance),
    }
}

/// The single transaction that would bring `balance(user, counterparty)`
/// to zero, or `None` when the pair is already settled within tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    pub from: Uuid,
    pub to: Uuid,
    pub amount: BigDecimal,
}

pub fn plan_settlement(
    user: Uuid,
    counterparty: Uuid,
    txs: &[Transaction],
) -> Option<SettlementPlan> {
    let balance = pair_balance(user, counterparty, txs);
    if balance.abs() < settle_tolerance() {
        return None;
    }

    let amount = round_to_cents(&balance.abs());
    // Negative balance: the reference user is the debtor and pays out.
    let (from, to) = if balance < BigDecimal::from(0) {
        (user, counterparty)
    } else {
        (counterparty, user)
    };

    Some(SettlementPlan { from, to, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentMethod, TransactionStatus};
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal literal")
    }

    fn tx(from: Uuid, to: Uuid, amount: &str, kind: TransactionKind) -> Transaction {
        Transaction::new(
            from,
            to,
            dec(amount),
            kind,
            "test".to_string(),
            PaymentMethod::Cash,
            None,
        )
    }

    #[test]
    fn loan_from_user_creates_receivable() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let txs = vec![tx(a, b, "500", TransactionKind::Loan)];

        assert_eq!(pair_balance(a, b, &txs), dec("500"));
        assert_eq!(pair_balance(b, a, &txs), dec("-500"));
    }

    #[test]
    fn payment_moves_balance_opposite_to_loan_for_same_sender() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let loan = tx(a, b, "500", TransactionKind::Loan);
        let payment = tx(a, b, "500", TransactionKind::Payment);

        assert_eq!(contribution(a, &loan), Some(dec("500")));
        assert_eq!(contribution(a, &payment), Some(dec("-500")));
    }

    #[test]
    fn loan_then_equal_payment_settles() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let txs = vec![
            tx(a, b, "250.75", TransactionKind::Loan),
            tx(a, b, "250.75", TransactionKind::Payment),
        ];

        let balance = balance_with(a, b, &txs);
        assert_eq!(balance.amount, dec("0.00"));
        assert_eq!(balance.status, BalanceStatus::Settled);
    }

    #[test]
    fn balances_are_antisymmetric() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let txs = vec![
            tx(a, b, "500", TransactionKind::Loan),
            tx(b, a, "200", TransactionKind::Payment),
            tx(b, a, "120.50", TransactionKind::Loan),
        ];

        let ab = pair_balance(a, b, &txs);
        let ba = pair_balance(b, a, &txs);
        assert_eq!(ab, -ba);
    }

    #[test]
    fn order_of_transactions_does_not_matter() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut txs = vec![
            tx(a, b, "500", TransactionKind::Loan),
            tx(b, a, "200", TransactionKind::Payment),
            tx(a, b, "33.33", TransactionKind::Payment),
            tx(b, a, "75.10", TransactionKind::Loan),
        ];
        let forward = pair_balance(a, b, &txs);

        txs.reverse();
        let reversed = pair_balance(a, b, &txs);
        txs.swap(0, 2);
        let shuffled = pair_balance(a, b, &txs);

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn pending_and_cancelled_transactions_are_ignored() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut pending = tx(a, b, "100", TransactionKind::Loan);
        pending.status = TransactionStatus::Pending;
        let mut cancelled = tx(a, b, "40", TransactionKind::Loan);
        cancelled.status = TransactionStatus::Cancelled;
        let txs = vec![pending, cancelled, tx(a, b, "25", TransactionKind::Loan)];

        let balance = balance_with(a, b, &txs);
        assert_eq!(balance.amount, dec("25.00"));
        assert_eq!(balance.transaction_count, 1);
    }

    #[test]
    fn transactions_with_other_users_do_not_leak_into_pair() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let txs = vec![
            tx(a, b, "500", TransactionKind::Loan),
            tx(a, c, "999", TransactionKind::Loan),
            tx(c, b, "999", TransactionKind::Loan),
        ];

        assert_eq!(pair_balance(a, b, &txs), dec("500"));
    }

    #[test]
    fn example_from_the_ledger_rules() {
        // A lends B 500, B pays A 200 -> A is owed 300.
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let txs = vec![
            tx(a, b, "500", TransactionKind::Loan),
            tx(b, a, "200", TransactionKind::Payment),
        ];

        let balance = balance_with(a, b, &txs);
        assert_eq!(balance.amount, dec("300.00"));
        assert_eq!(balance.status, BalanceStatus::OwesYou);
        assert_eq!(balance.transaction_count, 2);
        assert!(balance.last_transaction_at.is_some());
    }

    #[test]
    fn rounding_happens_once_at_the_boundary() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // Three contributions that each round individually but whose sum is
        // exact in cents.
        let txs = vec![
            tx(a, b, "0.01", TransactionKind::Loan),
            tx(a, b, "0.01", TransactionKind::Loan),
            tx(a, b, "0.01", TransactionKind::Loan),
        ];

        assert_eq!(balance_with(a, b, &txs).amount, dec("0.03"));
    }

    #[test]
    fn round_to_cents_rounds_half_away_from_zero() {
        assert_eq!(round_to_cents(&dec("1.005")), dec("1.01"));
        assert_eq!(round_to_cents(&dec("-1.005")), dec("-1.01"));
        assert_eq!(round_to_cents(&dec("2.344")), dec("2.34"));
        assert_eq!(round_to_cents(&dec("300")), dec("300.00"));
    }

    #[test]
    fn sub_cent_balance_reports_settled() {
        assert_eq!(status_for(&dec("0.005")), BalanceStatus::Settled);
        assert_eq!(status_for(&dec("-0.009")), BalanceStatus::Settled);
        assert_eq!(status_for(&dec("0.01")), BalanceStatus::OwesYou);
        assert_eq!(status_for(&dec("-0.01")), BalanceStatus::YouOwe);
    }

    #[test]
    fn summary_is_consistent_with_per_friend_balances() {
        let user = Uuid::new_v4();
        let (b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let txs = vec![
            tx(user, b, "500", TransactionKind::Loan),
            tx(c, user, "120.50", TransactionKind::Loan),
            tx(user, d, "75.25", TransactionKind::Loan),
            tx(d, user, "25.25", TransactionKind::Payment),
        ];

        let (balances, summary) = compute_balances(user, &[b, c, d], &txs);

        assert_eq!(summary.total_receivable, dec("550.00"));
        assert_eq!(summary.total_payable, dec("120.50"));
        assert_eq!(summary.net_balance, dec("429.50"));

        let net_from_balances = balances
            .iter()
            .fold(BigDecimal::from(0), |acc, bal| acc + &bal.amount);
        assert_eq!(round_to_cents(&net_from_balances), summary.net_balance);
    }

    #[test]
    fn friends_without_transactions_get_zero_balances() {
        let user = Uuid::new_v4();
        let quiet_friend = Uuid::new_v4();

        let (balances, summary) = compute_balances(user, &[quiet_friend], &[]);

        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].amount, dec("0.00"));
        assert_eq!(balances[0].status, BalanceStatus::Settled);
        assert_eq!(balances[0].transaction_count, 0);
        assert_eq!(balances[0].last_transaction_at, None);
        assert_eq!(summary.net_balance, dec("0.00"));
    }

    #[test]
    fn settlement_plan_pays_the_creditor() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        // A is owed 300: settlement flows from B to A.
        let owed = vec![
            tx(a, b, "500", TransactionKind::Loan),
            tx(b, a, "200", TransactionKind::Payment),
        ];
        let plan = plan_settlement(a, b, &owed).expect("outstanding balance");
        assert_eq!(plan.from, b);
        assert_eq!(plan.to, a);
        assert_eq!(plan.amount, dec("300.00"));

        // A owes 150: settlement flows from A to B.
        let owing = vec![tx(b, a, "150", TransactionKind::Loan)];
        let plan = plan_settlement(a, b, &owing).expect("outstanding balance");
        assert_eq!(plan.from, a);
        assert_eq!(plan.to, b);
        assert_eq!(plan.amount, dec("150.00"));
    }

    #[test]
    fn settlement_plan_rejects_settled_pairs() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let txs = vec![
            tx(a, b, "100", TransactionKind::Loan),
            tx(a, b, "100", TransactionKind::Payment),
        ];

        assert_eq!(plan_settlement(a, b, &txs), None);
        assert_eq!(plan_settlement(a, b, &[]), None);
    }

    #[test]
    fn applying_the_settlement_plan_zeroes_the_balance() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut txs = vec![
            tx(a, b, "500", TransactionKind::Loan),
            tx(b, a, "120.75", TransactionKind::Payment),
            tx(b, a, "60.25", TransactionKind::Loan),
        ];

        let plan = plan_settlement(a, b, &txs).expect("outstanding balance");
        txs.push(Transaction::settlement(plan.from, plan.to, plan.amount));

        let after = pair_balance(a, b, &txs);
        assert!(after.abs() < settle_tolerance());
        assert_eq!(plan_settlement(a, b, &txs), None);
    }
}
