//! Error types for the hub.

/// Errors returned by [`Hub`](crate::Hub) operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The dispatcher task is gone, so nothing can be broadcast.
    #[error("hub dispatcher has stopped")]
    Closed,
}
