//! Connection registry and broadcast fan-out for Lobby.
//!
//! One shared room: every joined connection receives every event, in the
//! order the events were enqueued.
//!
//! # Key types
//!
//! - [`Hub`]: cloneable handle: `join`, `leave`, `send`
//! - [`spawn_hub`]: starts the dispatcher task and returns a `Hub`
//! - [`HubConfig`]: write timeout for slow or dead connections
//!
//! A write that fails (or times out) removes that connection, closes it,
//! and announces it as `Left`; it never stops delivery to anyone else.

mod config;
mod error;
mod hub;

pub use config::HubConfig;
pub use error::HubError;
pub use hub::{Hub, spawn_hub};
