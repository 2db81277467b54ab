//! Session management for Lobby.
//!
//! After the directory confirms a user's credentials, the gateway asks the
//! [`SessionRegistry`] for an opaque token and hands it to the browser as
//! a cookie. Every later request presents that token; the registry turns
//! it back into a username and pushes its expiry out (sliding expiration).
//!
//! # How it fits in the stack
//!
//! ```text
//! Gateway (above)        ← issues on login, validates per request, revokes on logout
//!     ↕
//! Session Layer (this crate)
//! ```
//!
//! The session registry and the hub's connection registry each own their
//! own lock and are never held together.

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Session, SessionConfig};
