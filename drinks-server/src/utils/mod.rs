//! Utilities - error translation, logging and input validation

pub mod error;
pub mod logger;
pub mod validation;

pub use error::{AppError, AppResult};
