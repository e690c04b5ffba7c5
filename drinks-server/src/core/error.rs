use thiserror::Error;

use crate::auth::KeySetError;
use crate::db::RepoError;

/// Startup / bootstrap failures
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store error: {0}")]
    Store(#[from] RepoError),

    #[error("recipe error: {0}")]
    Recipe(#[from] shared::RecipeError),

    #[error("key set error: {0}")]
    KeySet(#[from] KeySetError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
