use std::time::Duration;

use crate::{Address, Envelope, TransportError};

/// The abstract bus connection every broker driver implements.
///
/// Synchronous with a blocking-timeout `recv`, matching the
/// single-threaded, cooperative-concurrency model a dispatcher runs under
/// — there is no `async fn` here, and no driver is shipped from this
/// crate. Implementations live in whatever crate integrates a concrete
/// broker; `svcbus-transport` only owns the contract and (under
/// `#[cfg(test)]`/`test-util`) a loopback test double.
pub trait Transport: Send {
    /// Establishes the underlying connection. Idempotent per thread of
    /// execution: calling `connect` again on an already-connected
    /// transport is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectFailed`] if the broker rejects the
    /// connection or credentials.
    fn connect(&mut self, credentials: &str) -> Result<(), TransportError>;

    /// The local peer address this transport was assigned on connect.
    ///
    /// Returns `None` before `connect` has succeeded.
    fn local_address(&self) -> Option<Address>;

    /// Publishes `body` to `to`, tagged with the session's `thread` and,
    /// if the caller has one to propagate, the correlation `xid`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SendFailed`] if the broker could not
    /// accept the message; the caller's request is not marked failed
    /// automatically — that decision belongs to the caller (it may
    /// retry).
    fn send(&mut self, to: &Address, thread: &str, xid: Option<&str>, body: Vec<u8>) -> Result<(), TransportError>;

    /// Blocks for up to `timeout` waiting for the next envelope addressed
    /// to this transport's local address.
    ///
    /// Returns `Ok(None)` if the deadline elapses with nothing queued.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::RecvFailed`] or
    /// [`TransportError::TransportLost`] on an underlying connection
    /// failure — per the failure model, a caller seeing either must treat
    /// every pending request on this transport as cancelled.
    fn recv(&mut self, timeout: Duration) -> Result<Option<Envelope>, TransportError>;

    /// Tears the connection down. Idempotent: disconnecting an
    /// already-disconnected transport is a no-op.
    fn disconnect(&mut self) -> Result<(), TransportError>;
}
