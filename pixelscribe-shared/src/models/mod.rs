/// Database models
///
/// - `account`: User accounts, credentials and the credit balance
///
/// # Example
///
/// ```no_run
/// use pixelscribe_shared::models::account::{Account, CreateAccount};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let account = Account::create(
///     &pool,
///     CreateAccount {
///         name: "Ada".to_string(),
///         email: "ada@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         credit_balance: 5,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
