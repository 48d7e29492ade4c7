//! Authentication for Famiglia.
//!
//! This crate answers two questions:
//!
//! 1. **May this person log in, and as what?** The [`LoginFlow`] state
//!    machine (`Unassigned → AssignedUnclaimed → Claimed`) plus the admin
//!    bypass.
//! 2. **Who sent this request?** The [`TokenService`] validates bearer
//!    tokens and the [`Authenticator`] turns them into an [`Identity`].
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (above)   ← extracts the bearer token, calls authenticate()
//!     ↕
//! Session layer (this crate)   ← tokens, identity, login
//!     ↕
//! Store + Protocol (below)   ← player records
//! ```

mod error;
mod identity;
mod login;
mod token;

pub use error::AuthError;
pub use identity::{
    ADMIN_BALANCE, ADMIN_FAMILY, ADMIN_PLAYER_ID, AdminCredentials, Authenticator, Identity,
    TokenAuthenticator,
};
pub use login::{BEARER, ClaimState, LoginFlow, LoginOutcome};
pub use token::{Claims, Subject, TokenConfig, TokenKind, TokenPair, TokenService};
