//! # Famiglia
//!
//! HTTP backend for "The Godfather: Office Mafia", a live office event
//! where players run missions, trade money and shop on a time-limited
//! black market on behalf of their crime family.
//!
//! The crate wires the layers together and serves them with axum:
//!
//! ```text
//! famiglia (HTTP)  →  famiglia-session (tokens, login, identity)
//!                  →  famiglia-game    (rules)
//!                  →  famiglia-store   (storage ports, in-memory backend)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use famiglia::prelude::*;
//!
//! # async fn run() -> Result<(), FamigliaError> {
//! let server = FamigliaServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod extract;
pub mod routes;
mod server;

pub use config::{ServerConfig, env};
pub use error::FamigliaError;
pub use extract::{Caller, bearer_token};
pub use server::{AppState, FamigliaServer, FamigliaServerBuilder, ServerStorage, router};

/// Convenience re-exports for binaries and tests.
pub mod prelude {
    pub use crate::{AppState, FamigliaError, FamigliaServer, ServerConfig, router};
    pub use famiglia_game::{FixedClock, Game, GameError, GameSettings, SystemClock};
    pub use famiglia_session::{AdminCredentials, AuthError, Identity, TokenConfig};
    pub use famiglia_store::{MemoryStorage, Resilient, RetryPolicy, StoreError};
}
