/// Credit ledger
///
/// Every enhancement call costs one credit. The ledger is the only place the
/// balance changes during an enhancement, through three operations:
///
/// - `balance`: read the current balance (`None` when the account is unknown)
/// - `reserve`: atomically take one credit if the balance is positive
/// - `refund`: give a reserved credit back after a failed vendor call
///
/// [`PgLedger`] backs production; [`MemoryLedger`] keeps balances in a map
/// and is used by tests and local runs without a database.
///
/// # Example
///
/// ```
/// use pixelscribe_shared::credits::{CreditLedger, MemoryLedger};
/// use pixelscribe_shared::models::account::DebitOutcome;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = MemoryLedger::new();
/// let account_id = Uuid::new_v4();
/// ledger.set_balance(account_id, 1).await;
///
/// assert_eq!(ledger.reserve(account_id).await?, DebitOutcome::Debited { remaining: 0 });
/// assert_eq!(ledger.reserve(account_id).await?, DebitOutcome::Insufficient { balance: 0 });
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::account::{Account, DebitOutcome};

/// Ledger error
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Underlying store failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Balance storage used by the enhancement proxy
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance, `None` if the account does not exist
    async fn balance(&self, account_id: Uuid) -> Result<Option<i32>, LedgerError>;

    /// Takes one credit if the balance is positive, as a single atomic step
    async fn reserve(&self, account_id: Uuid) -> Result<DebitOutcome, LedgerError>;

    /// Returns one previously reserved credit; yields the new balance
    async fn refund(&self, account_id: Uuid) -> Result<Option<i32>, LedgerError>;
}

/// Shared handle to a ledger implementation
pub type DynCreditLedger = Arc<dyn CreditLedger>;

/// PostgreSQL-backed ledger operating on the `accounts` table
#[derive(Clone)]
pub struct PgLedger {
    db: PgPool,
}

impl PgLedger {
    /// Creates a ledger over the given pool
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CreditLedger for PgLedger {
    async fn balance(&self, account_id: Uuid) -> Result<Option<i32>, LedgerError> {
        Ok(Account::balance(&self.db, account_id).await?)
    }

    async fn reserve(&self, account_id: Uuid) -> Result<DebitOutcome, LedgerError> {
        Ok(Account::try_debit(&self.db, account_id).await?)
    }

    async fn refund(&self, account_id: Uuid) -> Result<Option<i32>, LedgerError> {
        Ok(Account::credit(&self.db, account_id, 1).await?)
    }
}

/// In-memory ledger
///
/// A single mutex guards the whole map, which gives `reserve` the same
/// all-or-nothing behaviour as the conditional `UPDATE` in [`PgLedger`].
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    balances: Arc<Mutex<HashMap<Uuid, i32>>>,
}

impl MemoryLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites an account balance
    pub async fn set_balance(&self, account_id: Uuid, balance: i32) {
        self.balances.lock().await.insert(account_id, balance);
    }
}

#[async_trait]
impl CreditLedger for MemoryLedger {
    async fn balance(&self, account_id: Uuid) -> Result<Option<i32>, LedgerError> {
        Ok(self.balances.lock().await.get(&account_id).copied())
    }

    async fn reserve(&self, account_id: Uuid) -> Result<DebitOutcome, LedgerError> {
        let mut balances = self.balances.lock().await;

        Ok(match balances.get_mut(&account_id) {
            None => DebitOutcome::NotFound,
            Some(balance) if *balance <= 0 => DebitOutcome::Insufficient { balance: *balance },
            Some(balance) => {
                *balance -= 1;
                DebitOutcome::Debited { remaining: *balance }
            }
        })
    }

    async fn refund(&self, account_id: Uuid) -> Result<Option<i32>, LedgerError> {
        let mut balances = self.balances.lock().await;

        Ok(balances.get_mut(&account_id).map(|balance| {
            *balance += 1;
            *balance
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_account() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();

        assert_eq!(ledger.balance(id).await.unwrap(), None);
        assert_eq!(ledger.reserve(id).await.unwrap(), DebitOutcome::NotFound);
        assert_eq!(ledger.refund(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reserve_and_refund() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();
        ledger.set_balance(id, 2).await;

        assert_eq!(
            ledger.reserve(id).await.unwrap(),
            DebitOutcome::Debited { remaining: 1 }
        );
        assert_eq!(ledger.refund(id).await.unwrap(), Some(2));
        assert_eq!(ledger.balance(id).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_reserve_never_goes_negative() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();
        ledger.set_balance(id, 0).await;

        assert_eq!(
            ledger.reserve(id).await.unwrap(),
            DebitOutcome::Insufficient { balance: 0 }
        );
        assert_eq!(ledger.balance(id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_concurrent_reservations_are_exclusive() {
        let ledger = MemoryLedger::new();
        let id = Uuid::new_v4();
        ledger.set_balance(id, 3).await;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.reserve(id).await.unwrap() })
            })
            .collect();

        let mut debited = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), DebitOutcome::Debited { .. }) {
                debited += 1;
            }
        }

        assert_eq!(debited, 3);
        assert_eq!(ledger.balance(id).await.unwrap(), Some(0));
    }
}
