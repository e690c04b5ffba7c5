//! Drinks Server - drinks menu HTTP API
//!
//! Public menu listing plus permission-gated detail, create, update and
//! delete routes, authenticated with identity-provider bearer tokens.
//!
//! # Module layout
//!
//! ```text
//! drinks-server/src/
//! ├── core/    # config, state, server, bootstrap errors
//! ├── auth/    # token verification, permission guard
//! ├── db/      # drink store (PostgreSQL / in-memory)
//! ├── api/     # routes and handlers
//! └── utils/   # error translation, logging, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod utils;

pub use auth::{ClaimSet, TokenVerifier};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

pub use utils::logger::init_logger;

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($severity:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            severity = $severity,
            event = $event,
            $($key = $value),*
        );
    };
}
