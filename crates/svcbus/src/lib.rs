//! `svcbus` — a service-oriented RPC bus modeled on a class-hinted JSON
//! wire protocol, a session state machine with request multiplexing, and
//! a capability-trait method dispatcher.
//!
//! This crate is a thin facade over the workspace's component crates:
//!
//! - [`svcbus_wire`] — the class-hinted [`Value`](svcbus_wire::Value) tree and its [`Codec`](svcbus_wire::Codec).
//! - [`svcbus_protocol`] — [`Message`](svcbus_protocol::Message) envelopes and the status-code protocol.
//! - [`svcbus_transport`] — the [`Transport`](svcbus_transport::Transport) trait and [`Address`](svcbus_transport::Address) routing.
//! - [`svcbus_client`] — [`Session`](svcbus_client::Session), the application-side state machine.
//! - [`svcbus_server`] — [`Dispatcher`](svcbus_server::Dispatcher) and [`MethodHandler`](svcbus_server::MethodHandler).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use svcbus::prelude::*;
//! use svcbus_transport::testing::LoopbackBroker;
//!
//! struct Add;
//! impl MethodHandler for Add {
//!     fn call(&self, ctx: &CallContext, responder: &mut Responder<'_>) -> svcbus_core::Result<()> {
//!         let sum: i64 = ctx.params.iter().filter_map(Value::as_u64).map(|n| n as i64).sum();
//!         responder.respond_complete([Value::from(sum)]);
//!         Ok(())
//!     }
//! }
//!
//! let broker = LoopbackBroker::new();
//!
//! let mut registry = Registry::new();
//! registry.register("math", "add", Arc::new(Add), 1, MethodOptions::default());
//! registry.freeze();
//! let mut dispatcher = Dispatcher::new("math", registry, Box::new(broker.connect("worker")));
//! dispatcher.connect("").unwrap();
//!
//! let client_transport = Box::new(broker.connect("client"));
//! let session = Session::open("math", client_transport, "", "en-US", 0).unwrap();
//! let request = Session::request(&session, "add", vec![Value::from(2i64), Value::from(2i64)], Duration::from_secs(1)).unwrap();
//!
//! dispatcher.pump(Duration::from_millis(200)).unwrap();
//! let result = request.recv(Duration::from_millis(200)).unwrap();
//! assert_eq!(result.and_then(|v| v.as_u64()), Some(4));
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub use svcbus_client as client;
pub use svcbus_core as core;
pub use svcbus_protocol as protocol;
pub use svcbus_server as server;
pub use svcbus_transport as transport;
pub use svcbus_wire as wire;

/// Everything most callers need in scope, re-exported from across the
/// workspace's component crates.
pub mod prelude {
    pub use svcbus_client::{RequestHandle, Session, SessionState};
    pub use svcbus_core::{BootstrapConfig, Error, LoggingConfig, Result, StatusCode, Xid};
    pub use svcbus_protocol::{Message, MethodCall, MsgType, Payload, ResultPayload, StatusPayload};
    pub use svcbus_server::{CallContext, Dispatcher, MethodHandler, MethodOptions, Registry, Responder};
    pub use svcbus_transport::{Address, Envelope, Transport, TransportError};
    pub use svcbus_wire::{Codec, HintRegistry, JsonCodec, Value};
}
