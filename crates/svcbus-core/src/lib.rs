//! Foundation layer shared by every `svcbus` crate.
//!
//! This crate has no knowledge of the wire format, the transport, or the
//! session state machine — it only provides the things every layer above it
//! needs: a unified [`Error`] type with a status-code mapping, transaction-id
//! ([`Xid`]) generation and propagation, structured logging setup, and the
//! [`BootstrapConfig`] shape every binding is handed at startup.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![deny(unsafe_code)]

mod config;
mod error;
mod logging;
mod xid;

pub use config::BootstrapConfig;
pub use error::{Error, Result, StatusCode};
pub use logging::{LogOutput, LoggingConfig, LoggingGuard};
pub use xid::Xid;
