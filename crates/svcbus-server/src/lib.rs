//! The server-side dispatch loop: method registry, per-call context, and
//! response/complete/status emission (component C6 of the messaging
//! layer).
//!
//! A [`Dispatcher`] owns exactly one frozen [`Registry`] and one
//! [`svcbus_transport::Transport`]; [`MethodHandler`] implementations
//! never see either directly, only the [`CallContext`] and [`Responder`]
//! built fresh for each call.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![deny(unsafe_code)]

mod context;
mod dispatcher;
mod registry;
mod responder;

pub use context::CallContext;
pub use dispatcher::Dispatcher;
pub use registry::{MethodHandler, MethodOptions, Registration, Registry};
pub use responder::Responder;
