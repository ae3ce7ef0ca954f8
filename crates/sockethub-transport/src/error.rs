/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A send was attempted while no connection is open.
    ///
    /// Returned instead of silently dropping the frame so the caller
    /// can surface it.
    #[error("not connected")]
    NotConnected,

    /// The address can't be used to open a connection.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The open attempt could not be started.
    #[error("open failed: {0}")]
    OpenFailed(String),

    /// The connection was closed underneath us.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}
