/// Account model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     credit_balance INTEGER NOT NULL DEFAULT 5 CHECK (credit_balance >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The balance is only ever changed by single-statement updates
/// ([`Account::try_debit`], [`Account::credit`]); there is no
/// read-modify-write path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, credit_balance, created_at, updated_at";

/// A PixelScribe account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Login email (case-insensitive via CITEXT)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Remaining enhancement credits
    pub credit_balance: i32,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// Display name
    pub name: String,

    /// Login email
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Starting credit balance
    pub credit_balance: i32,
}

/// Outcome of a conditional debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// One credit was taken; carries the balance after the debit
    Debited { remaining: i32 },

    /// Balance was already zero; carries the unchanged balance
    Insufficient { balance: i32 },

    /// No account with that id
    NotFound,
}

impl Account {
    /// Inserts a new account
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint database error (`accounts_email_key`)
    /// when the email is taken.
    pub async fn create(pool: &PgPool, data: CreateAccount) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (name, email, password_hash, credit_balance)
             VALUES ($1, $2, $3, $4)
             RETURNING {ACCOUNT_COLUMNS}"
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.credit_balance)
            .fetch_one(pool)
            .await
    }

    /// Finds an account by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");

        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an account by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");

        sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Reads the current balance without loading the rest of the row
    pub async fn balance(pool: &PgPool, id: Uuid) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT credit_balance FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Takes one credit if and only if the balance is positive
    ///
    /// The check and the decrement are one statement, so concurrent callers
    /// can never push the balance below zero.
    pub async fn try_debit(pool: &PgPool, id: Uuid) -> Result<DebitOutcome, sqlx::Error> {
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET credit_balance = credit_balance - 1, updated_at = NOW()
            WHERE id = $1 AND credit_balance > 0
            RETURNING credit_balance
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(DebitOutcome::Debited { remaining });
        }

        // Nothing updated: either the account is gone or it is out of credit
        Ok(match Self::balance(pool, id).await? {
            Some(balance) => DebitOutcome::Insufficient { balance },
            None => DebitOutcome::NotFound,
        })
    }

    /// Adds `amount` credits and returns the new balance
    pub async fn credit(pool: &PgPool, id: Uuid, amount: i32) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET credit_balance = credit_balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING credit_balance
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(pool)
        .await
    }
}
