//! An in-memory loopback broker for exercising [`crate::Transport`]
//! end-to-end without a real broker.
//!
//! This is test scaffolding only — compiled under `#[cfg(test)]` or the
//! `test-util` feature, never part of the default build, and never
//! documented as a product transport. Routing state lives behind a
//! `std::sync::Mutex` that is never held across a blocking receive;
//! delivery itself rides a per-peer `mpsc` channel so `recv`'s blocking
//! wait costs nothing to the registry.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{Address, Envelope, Transport, TransportError};

#[derive(Default)]
struct BrokerState {
    peers: HashMap<Address, mpsc::Sender<Envelope>>,
    services: HashMap<String, Vec<Address>>,
    next_idx: HashMap<String, usize>,
}

/// A shared in-process broker. Clone to hand out more connections; every
/// clone shares the same routing table.
#[derive(Clone, Default)]
pub struct LoopbackBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl LoopbackBroker {
    /// Builds a fresh, empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection to this broker, assigning it a peer address
    /// derived from `label` (tests pass a readable name; uniqueness is
    /// guaranteed by an appended counter, not by the label alone).
    #[must_use]
    pub fn connect(&self, label: &str) -> LoopbackTransport {
        LoopbackTransport {
            broker: self.state.clone(),
            local: None,
            label: label.to_string(),
            inbox: None,
        }
    }
}

/// One connection into a [`LoopbackBroker`].
pub struct LoopbackTransport {
    broker: Arc<Mutex<BrokerState>>,
    local: Option<Address>,
    label: String,
    inbox: Option<mpsc::Receiver<Envelope>>,
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

impl LoopbackTransport {
    /// Registers this connection as a worker for `service`, making it a
    /// round-robin candidate for `service:<service>` sends. Requires
    /// `connect` to have already run.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectFailed`] if called before
    /// `connect`.
    pub fn register_service(&self, service: &str) -> Result<(), TransportError> {
        let local = self
            .local
            .clone()
            .ok_or_else(|| TransportError::ConnectFailed("not connected".to_string()))?;
        let mut state = self.broker.lock().expect("loopback broker mutex poisoned");
        state.services.entry(service.to_string()).or_default().push(local);
        Ok(())
    }
}

impl Transport for LoopbackTransport {
    fn connect(&mut self, credentials: &str) -> Result<(), TransportError> {
        if self.local.is_some() {
            return Ok(());
        }
        let opaque = if credentials.is_empty() {
            format!("{}.{}", self.label, fastrand::u64(..))
        } else {
            credentials.to_string()
        };
        let local = Address::peer(opaque);
        let (tx, rx) = mpsc::channel();
        {
            let mut state = self.broker.lock().expect("loopback broker mutex poisoned");
            state.peers.insert(local.clone(), tx);
        }
        self.local = Some(local);
        self.inbox = Some(rx);
        Ok(())
    }

    fn local_address(&self) -> Option<Address> {
        self.local.clone()
    }

    fn send(&mut self, to: &Address, thread: &str, xid: Option<&str>, body: Vec<u8>) -> Result<(), TransportError> {
        let Some(local) = self.local.clone() else {
            return Err(TransportError::SendFailed("not connected".to_string()));
        };
        let sender = {
            let mut state = self.broker.lock().expect("loopback broker mutex poisoned");
            let target = match to {
                Address::Peer(_) => to.clone(),
                Address::Service(name) => {
                    let candidates = state
                        .services
                        .get(name)
                        .cloned()
                        .ok_or_else(|| TransportError::SendFailed(format!("no worker for {to}")))?;
                    if candidates.is_empty() {
                        return Err(TransportError::SendFailed(format!("no worker for {to}")));
                    }
                    let idx = state.next_idx.entry(name.clone()).or_insert(0);
                    let chosen = candidates[*idx % candidates.len()].clone();
                    *idx = (*idx + 1) % candidates.len();
                    chosen
                }
            };
            state
                .peers
                .get(&target)
                .cloned()
                .ok_or_else(|| TransportError::SendFailed(format!("unknown address {target}")))?
        };
        sender
            .send(Envelope::new(local, thread, xid.map(str::to_string), body))
            .map_err(|_| TransportError::TransportLost("peer disconnected".to_string()))
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<Envelope>, TransportError> {
        let Some(inbox) = self.inbox.as_ref() else {
            return Err(TransportError::RecvFailed("not connected".to_string()));
        };
        match inbox.recv_timeout(timeout) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(TransportError::TransportLost("broker channel closed".to_string()))
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        if let Some(local) = self.local.take() {
            let mut state = self.broker.lock().expect("loopback broker mutex poisoned");
            state.peers.remove(&local);
            for workers in state.services.values_mut() {
                workers.retain(|addr| addr != &local);
            }
        }
        self.inbox = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_to_peer_send_recv_round_trips() {
        let broker = LoopbackBroker::new();
        let mut alice = broker.connect("alice");
        let mut bob = broker.connect("bob");
        alice.connect("").unwrap();
        bob.connect("").unwrap();

        let bob_addr = bob.local_address().unwrap();
        alice.send(&bob_addr, "t-1", None, b"hello".to_vec()).unwrap();

        let env = bob.recv(Duration::from_millis(200)).unwrap().unwrap();
        assert_eq!(env.body, b"hello");
        assert_eq!(env.from, alice.local_address().unwrap());
    }

    #[test]
    fn recv_times_out_with_none() {
        let broker = LoopbackBroker::new();
        let mut alice = broker.connect("alice");
        alice.connect("").unwrap();
        assert_eq!(alice.recv(Duration::from_millis(20)).unwrap(), None);
    }

    #[test]
    fn service_address_load_balances_round_robin() {
        let broker = LoopbackBroker::new();
        let mut client = broker.connect("client");
        client.connect("").unwrap();

        let mut w1 = broker.connect("w1");
        let mut w2 = broker.connect("w2");
        w1.connect("").unwrap();
        w2.connect("").unwrap();
        w1.register_service("math").unwrap();
        w2.register_service("math").unwrap();

        let svc = Address::service("math");
        client.send(&svc, "t-1", None, b"one".to_vec()).unwrap();
        client.send(&svc, "t-2", None, b"two".to_vec()).unwrap();

        assert!(w1.recv(Duration::from_millis(200)).unwrap().is_some());
        assert!(w2.recv(Duration::from_millis(200)).unwrap().is_some());
    }

    #[test]
    fn send_to_unregistered_service_fails() {
        let broker = LoopbackBroker::new();
        let mut client = broker.connect("client");
        client.connect("").unwrap();
        let err = client
            .send(&Address::service("nobody.home"), "t-1", None, vec![])
            .unwrap_err();
        assert!(matches!(err, TransportError::SendFailed(_)));
    }

    #[test]
    fn disconnect_removes_from_service_registry() {
        let broker = LoopbackBroker::new();
        let mut client = broker.connect("client");
        client.connect("").unwrap();
        let mut w1 = broker.connect("w1");
        w1.connect("").unwrap();
        w1.register_service("math").unwrap();
        w1.disconnect().unwrap();

        let err = client
            .send(&Address::service("math"), "t-1", None, vec![])
            .unwrap_err();
        assert!(matches!(err, TransportError::SendFailed(_)));
    }
}
