use svcbus_core::Error as CoreError;

/// Failure modes of a [`crate::Transport`] implementation.
///
/// A `#[non_exhaustive]` `thiserror` enum so a new broker driver can add a
/// variant without breaking existing matches.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// `connect` failed to establish a session with the broker.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// `send` failed to hand the envelope to the broker.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// `recv` failed while waiting for an envelope.
    #[error("recv failed: {0}")]
    RecvFailed(String),

    /// The connection was lost; any request in flight on it must be failed.
    #[error("transport lost: {0}")]
    TransportLost(String),

    /// `recv`'s deadline elapsed with no message.
    #[error("recv timed out")]
    Timeout,

    /// An underlying I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The body could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<TransportError> for CoreError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => CoreError::Timeout,
            TransportError::Serialization(msg) => CoreError::Protocol(msg),
            other => CoreError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_core_timeout() {
        let core: CoreError = TransportError::Timeout.into();
        assert!(matches!(core, CoreError::Timeout));
    }

    #[test]
    fn transport_lost_maps_to_core_transport() {
        let core: CoreError = TransportError::TransportLost("socket closed".into()).into();
        assert!(matches!(core, CoreError::Transport(_)));
    }

    #[test]
    fn serialization_maps_to_core_protocol() {
        let core: CoreError = TransportError::Serialization("bad frame".into()).into();
        assert!(matches!(core, CoreError::Protocol(_)));
    }
}
