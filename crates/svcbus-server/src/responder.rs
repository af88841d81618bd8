use svcbus_core::StatusCode;
use svcbus_protocol::{Message, ResultPayload, StatusPayload};
use svcbus_transport::{Address, Transport};
use svcbus_wire::{JsonCodec, Value};

/// The handle a [`crate::MethodHandler`] uses to emit results for one call.
///
/// `respond_complete` is terminal: once called, every subsequent `respond`
/// (by a handler that ignores the return value and keeps going, or by the
/// dispatcher's own failure path) is silently discarded — the completion
/// invariant the data model requires.
///
/// When `atomic` is set, every value passed to `respond` is buffered and
/// flushed only once `respond_complete` runs, so the caller observes one
/// RESULT batch rather than a stream.
pub struct Responder<'a> {
    transport: &'a mut dyn Transport,
    codec: JsonCodec,
    to: Address,
    thread: String,
    xid: Option<String>,
    thread_trace: u32,
    locale: String,
    atomic: bool,
    buffered: Vec<Value>,
    complete: bool,
    next_serial: u32,
}

impl std::fmt::Debug for Responder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("to", &self.to)
            .field("thread", &self.thread)
            .field("thread_trace", &self.thread_trace)
            .field("atomic", &self.atomic)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

impl<'a> Responder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        transport: &'a mut dyn Transport,
        to: Address,
        thread: String,
        xid: Option<String>,
        thread_trace: u32,
        locale: String,
        atomic: bool,
    ) -> Self {
        Self {
            transport,
            codec: JsonCodec::new(),
            to,
            thread,
            xid,
            thread_trace,
            locale,
            atomic,
            buffered: Vec::new(),
            complete: false,
            next_serial: 0,
        }
    }

    /// True once [`Responder::respond_complete`] has run.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Emits one RESULT value. Streaming handlers call this once per
    /// partial result; non-streaming handlers call it once before
    /// [`Responder::respond_complete`].
    ///
    /// No-op once the request is complete.
    pub fn respond(&mut self, value: Value) {
        if self.complete {
            return;
        }
        if self.atomic {
            self.buffered.push(value);
        } else {
            self.emit_result(value);
        }
    }

    /// Emits any values in `values`, flushes buffered atomic results, then
    /// sends the terminal STATUS 205. No-op (beyond the discard) if
    /// already complete.
    pub fn respond_complete(&mut self, values: impl IntoIterator<Item = Value>) {
        if self.complete {
            return;
        }
        for value in values {
            if self.atomic {
                self.buffered.push(value);
            } else {
                self.emit_result(value);
            }
        }
        if self.atomic {
            for value in std::mem::take(&mut self.buffered) {
                self.emit_result(value);
            }
        }
        self.emit_status(StatusCode::Complete, None);
        self.complete = true;
    }

    pub(crate) fn fail(&mut self, code: StatusCode, message: impl Into<String>) {
        if self.complete {
            return;
        }
        self.emit_status(code, Some(message.into()));
        self.emit_status(StatusCode::Complete, None);
        self.complete = true;
    }

    fn emit_result(&mut self, content: Value) {
        let message = Message::result(self.thread_trace, ResultPayload::ok(content), self.locale.clone());
        self.send(message);
    }

    fn emit_status(&mut self, code: StatusCode, label_override: Option<String>) {
        let mut status = StatusPayload::new(code);
        if let Some(label) = label_override {
            status.status = label;
        }
        let message = Message::status(self.thread_trace, status, self.locale.clone());
        self.send(message);
    }

    fn send(&mut self, message: Message) {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        let message = message.with_serial(serial);
        match svcbus_protocol::encode_batch(std::slice::from_ref(&message), &self.codec) {
            Ok(bytes) => {
                if let Err(err) = self.transport.send(&self.to, &self.thread, self.xid.as_deref(), bytes) {
                    tracing::warn!(error = %err, thread = %self.thread, "failed to send response");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode response message");
            }
        }
    }
}
