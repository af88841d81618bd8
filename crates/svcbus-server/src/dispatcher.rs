use std::panic::AssertUnwindSafe;
use std::time::Duration;

use svcbus_core::{Error, Result, StatusCode};
use svcbus_protocol::{Message, MsgType, Payload, StatusPayload};
use svcbus_transport::{Envelope, Transport};
use svcbus_wire::JsonCodec;

use crate::context::CallContext;
use crate::registry::Registry;
use crate::responder::Responder;

/// Drives a [`Transport`] against a frozen [`Registry`]: the server-side
/// half of the messaging layer (component C6).
///
/// One `Dispatcher` serves exactly one `service` name; a process hosting
/// several services runs one `Dispatcher` per service (matching the
/// single-threaded-per-connection model of §5 — a multi-service worker
/// is an application choice, not something this layer arbitrates).
pub struct Dispatcher {
    service: String,
    registry: Registry,
    transport: Box<dyn Transport>,
    codec: JsonCodec,
    next_serial: u32,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("service", &self.service)
            .field("registry_len", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Builds a dispatcher for `service`. `registry` should already be
    /// [`Registry::freeze`]n; if it isn't, `dispatch` still works but a
    /// caller racing registration against dispatch on another thread would
    /// be relying on behavior this type doesn't guarantee.
    pub fn new(service: impl Into<String>, registry: Registry, transport: Box<dyn Transport>) -> Self {
        Self {
            service: service.into(),
            registry,
            transport,
            codec: JsonCodec::new(),
            next_serial: 0,
        }
    }

    /// The service name this dispatcher answers for.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Connects the underlying transport and registers as a worker for
    /// [`Dispatcher::service`], if the transport supports service
    /// registration (the loopback test transport does; a production
    /// broker driver typically handles this at the broker subscription
    /// level instead).
    ///
    /// # Errors
    ///
    /// Propagates a transport connect failure.
    pub fn connect(&mut self, credentials: &str) -> Result<()> {
        self.transport.connect(credentials).map_err(Error::from)
    }

    /// Blocks up to `timeout` for the next inbound envelope and dispatches
    /// it. Returns `true` if an envelope was processed, `false` on a plain
    /// timeout.
    ///
    /// # Errors
    ///
    /// Propagates a transport receive failure or a malformed envelope that
    /// could not be decoded at all (per-message protocol errors inside a
    /// well-formed batch are handled per message and do not fail the
    /// whole call to `pump`).
    pub fn pump(&mut self, timeout: Duration) -> Result<bool> {
        match self.transport.recv(timeout) {
            Ok(Some(envelope)) => {
                self.dispatch(envelope)?;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => Err(Error::from(err)),
        }
    }

    /// Decodes `envelope`'s batch and dispatches each message in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`]/[`Error::Protocol`] only if the envelope's
    /// body does not even decode as a batch of messages; a single
    /// malformed or unroutable message within an otherwise valid batch is
    /// logged and skipped, not propagated.
    pub fn dispatch(&mut self, envelope: Envelope) -> Result<()> {
        let messages = svcbus_protocol::decode_batch(&envelope.body, &self.codec)?;
        for message in messages {
            match message.mtype {
                MsgType::Connect => self.handle_connect(&envelope, &message),
                MsgType::Request => self.handle_request(&envelope, &message),
                MsgType::Disconnect => {
                    tracing::info!(thread = %envelope.thread, "session disconnected");
                }
                MsgType::Result | MsgType::Status => {
                    tracing::info!(mtype = %message.mtype, "dispatcher ignoring inbound non-request message");
                }
            }
        }
        Ok(())
    }

    fn handle_connect(&mut self, envelope: &Envelope, message: &Message) {
        let ack = Message::status(0, StatusPayload::new(StatusCode::Ok), message.locale.clone());
        self.send_direct(envelope, ack);
    }

    fn handle_request(&mut self, envelope: &Envelope, message: &Message) {
        let Payload::Method(call) = &message.payload else {
            self.send_terminal(envelope, message, StatusCode::BadRequest, "REQUEST missing method payload");
            return;
        };

        let Some(registration) = self.registry.lookup(&self.service, &call.method).cloned() else {
            self.send_terminal(
                envelope,
                message,
                StatusCode::NotFound,
                format!("no such method: {}.{}", self.service, call.method),
            );
            return;
        };

        if call.params.len() < registration.min_argc {
            self.send_terminal(
                envelope,
                message,
                StatusCode::BadRequest,
                format!(
                    "{} requires at least {} argument(s), got {}",
                    call.method,
                    registration.min_argc,
                    call.params.len()
                ),
            );
            return;
        }

        let ctx = CallContext {
            thread: envelope.thread.clone(),
            request_id: message.thread_trace,
            method: call.method.clone(),
            params: call.params.clone(),
            locale: message.locale.clone(),
            xid: envelope.xid.clone().unwrap_or_default(),
        };

        let mut responder = Responder::new(
            &mut *self.transport,
            envelope.from.clone(),
            envelope.thread.clone(),
            envelope.xid.clone(),
            message.thread_trace,
            message.locale.clone(),
            registration.options.atomic,
        );

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| registration.handler.call(&ctx, &mut responder)));

        match outcome {
            Ok(Ok(())) => {
                if !responder.is_complete() {
                    responder.respond_complete(std::iter::empty());
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, method = %ctx.method, xid = %ctx.xid, "handler returned an error");
                responder.fail(StatusCode::InternalError, err.to_string());
            }
            Err(panic) => {
                let message = panic_message(&panic);
                tracing::error!(method = %ctx.method, xid = %ctx.xid, panic = %message, "handler panicked");
                responder.fail(StatusCode::InternalError, format!("handler panicked: {message}"));
            }
        }
    }

    fn send_terminal(&mut self, envelope: &Envelope, message: &Message, code: StatusCode, label: impl Into<String>) {
        let mut status = StatusPayload::new(code);
        status.status = label.into();
        let reply = Message::status(message.thread_trace, status, message.locale.clone());
        self.send_direct(envelope, reply);
    }

    fn send_direct(&mut self, envelope: &Envelope, message: Message) {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        let message = message.with_serial(serial);
        match svcbus_protocol::encode_batch(std::slice::from_ref(&message), &self.codec) {
            Ok(bytes) => {
                if let Err(err) = self
                    .transport
                    .send(&envelope.from, &envelope.thread, envelope.xid.as_deref(), bytes)
                {
                    tracing::warn!(error = %err, thread = %envelope.thread, "failed to send dispatcher reply");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode dispatcher reply"),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
