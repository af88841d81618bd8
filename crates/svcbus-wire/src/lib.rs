//! Class-hinted JSON codec.
//!
//! This crate implements the dynamic [`Value`] object model every `svcbus`
//! envelope is built from, plus the [`Codec`] trait abstracting over how a
//! `Value` tree is turned into bytes and back. The default codec is
//! [`JsonCodec`]; the trait exists so a binary codec can be added later
//! without touching anything above this crate.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![deny(unsafe_code)]

mod codec;
mod registry;
mod value;

pub use codec::{Codec, JsonCodec};
pub use registry::HintRegistry;
pub use value::Value;
