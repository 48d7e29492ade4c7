//! HTTP routes, one module per URL prefix.
//!
//! Each module exposes `router()`, which the server merges into one
//! `Router`. Handlers stay thin: extract, call into the `Game` or the
//! session services, wrap the result in `Json`.

pub mod admin;
pub mod auth;
pub mod blackmarket;
pub mod families;
pub mod missions;
pub mod players;
pub mod root;
pub mod trades;

use std::sync::Arc;

use crate::AppState;

/// Router type every route module returns before state is attached.
pub type AppRouter<S> = axum::Router<Arc<AppState<S>>>;
