//! Wire envelope types: [`Message`], [`MethodCall`], [`ResultPayload`],
//! [`StatusPayload`], and the [`MsgType`] discriminant that selects among
//! them.
//!
//! A single outbound transmission unit is a JSON array of [`Message`]
//! values — see [`encode_batch`]/[`decode_batch`]. Each `Message` is itself
//! a class-hinted [`svcbus_wire::Value`] with hint `osrfMessage`; its
//! nested payload carries its own hint (`osrfMethod`, `osrfResult`,
//! `osrfConnectStatus`, `osrfMethodException`) so a decoder can dispatch on
//! shape alone.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![deny(unsafe_code)]

mod message;
mod msgtype;

pub use message::{decode_batch, encode_batch, Message, MethodCall, Payload, ResultPayload, StatusPayload};
pub use msgtype::MsgType;

/// Wire hint for a [`Message`] envelope.
pub const HINT_MESSAGE: &str = "osrfMessage";
/// Wire hint for a [`MethodCall`] payload.
pub const HINT_METHOD: &str = "osrfMethod";
/// Wire hint for a [`ResultPayload`] payload.
pub const HINT_RESULT: &str = "osrfResult";
/// Wire hint for a [`StatusPayload`] payload.
pub const HINT_STATUS: &str = "osrfConnectStatus";
/// Wire hint for a handler-raised exception embedded as a result's content.
pub const HINT_METHOD_EXCEPTION: &str = "osrfMethodException";

/// Default locale applied when a [`Message`] does not set one.
pub const DEFAULT_LOCALE: &str = "en-US";
