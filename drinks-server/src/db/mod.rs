//! Drink persistence
//!
//! [`DrinkStore`] is the only way handlers touch stored drinks:
//! - [`PgDrinkStore`] - PostgreSQL via sqlx
//! - [`MemoryDrinkStore`] - process-local map for development and tests

pub mod memory;
pub mod postgres;

pub use memory::MemoryDrinkStore;
pub use postgres::PgDrinkStore;

use async_trait::async_trait;
use shared::{Drink, Ingredient, NewDrink, RecipeError};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    /// Uniqueness or other integrity rule rejected the write
    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.kind() != sqlx::error::ErrorKind::Other => {
                RepoError::Constraint(db.message().to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepoError::Connection(err.to_string()),
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Drink persistence
///
/// Writes are atomic per call: a failed insert/update/delete leaves the
/// stored drinks untouched.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// All drinks, ascending by id
    async fn list_all(&self) -> RepoResult<Vec<Drink>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Drink>>;

    /// Persist a new drink and return it with its assigned id
    async fn insert(&self, drink: NewDrink) -> RepoResult<Drink>;

    /// Overwrite title and recipe of an existing drink
    async fn update(&self, drink: &Drink) -> RepoResult<()>;

    async fn delete(&self, id: i64) -> RepoResult<()>;
}

/// Menu seeded by `RESET_DATABASE`
pub fn starter_drinks() -> Result<Vec<NewDrink>, RecipeError> {
    let water = NewDrink::new(
        "water",
        &[Ingredient {
            name: "water".to_string(),
            color: "blue".to_string(),
            parts: 1.into(),
        }],
    )?;
    Ok(vec![water])
}
