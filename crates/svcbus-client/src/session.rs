use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use svcbus_core::{Error, Result, StatusCode, Xid};
use svcbus_protocol::{Message, MethodCall, MsgType, Payload};
use svcbus_transport::{Address, Transport};
use svcbus_wire::{JsonCodec, Value};

use crate::registry;
use crate::request::{Request, RequestHandle};
use crate::seen::SeenSet;

/// Minimum seen-set size for idempotent duplicate suppression.
const MIN_SEEN_CAPACITY: usize = 1024;

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No stateful connection to a worker; every request is routed
    /// load-balanced to the service address.
    Disconnected,
    /// A CONNECT has been sent; waiting for the worker's STATUS 200.
    Connecting,
    /// Pinned to `remote_id`; every request targets that one worker.
    Connected,
}

/// A client-side application session: one conversation with a named
/// service over one transport connection.
///
/// Owns its request table; a [`RequestHandle`] only ever reaches back into
/// it through a shared `Rc<RefCell<_>>` (see the data model's ownership
/// note — requests never alias the transport's own buffers).
pub struct Session {
    thread: String,
    service: String,
    remote_id: Option<Address>,
    state: SessionState,
    locale: String,
    last_req_id: u32,
    requests: BTreeMap<u32, Request>,
    xid: Xid,
    transport: Box<dyn Transport>,
    seen: SeenSet,
    codec: JsonCodec,
    next_serial: u32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("thread", &self.thread)
            .field("service", &self.service)
            .field("remote_id", &self.remote_id)
            .field("state", &self.state)
            .field("last_req_id", &self.last_req_id)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens a new session against `service`, connecting `transport` with
    /// `credentials` and registering the session under its freshly minted
    /// thread id in the thread-local [`crate::SessionRegistry`].
    ///
    /// # Errors
    ///
    /// Propagates [`svcbus_transport::TransportError`] (as
    /// [`svcbus_core::Error::Transport`]) if `transport.connect` fails.
    pub fn open(
        service: impl Into<String>,
        mut transport: Box<dyn Transport>,
        credentials: &str,
        locale: impl Into<String>,
        boot_epoch: i64,
    ) -> Result<Rc<RefCell<Self>>> {
        transport
            .connect(credentials)
            .map_err(svcbus_core::Error::from)?;
        let thread = format!("{:x}-{:x}", fastrand::u64(..), fastrand::u64(..));
        let session = Rc::new(RefCell::new(Self {
            thread: thread.clone(),
            service: service.into(),
            remote_id: None,
            state: SessionState::Disconnected,
            locale: locale.into(),
            last_req_id: 0,
            requests: BTreeMap::new(),
            xid: Xid::new(boot_epoch),
            transport,
            seen: SeenSet::new(MIN_SEEN_CAPACITY),
            codec: JsonCodec::new(),
            next_serial: 0,
        }));
        registry::register(&thread, Rc::clone(&session));
        Ok(session)
    }

    /// This session's unique thread id.
    #[must_use]
    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The correlation id propagated on every outbound message.
    #[must_use]
    pub fn xid(&self) -> &Xid {
        &self.xid
    }

    fn destination(&self) -> Address {
        self.remote_id.clone().unwrap_or_else(|| Address::service(self.service.clone()))
    }

    fn send_message(&mut self, message: Message) -> Result<()> {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);
        let message = message.with_serial(serial);
        let bytes = svcbus_protocol::encode_batch(std::slice::from_ref(&message), &self.codec)?;
        let to = self.destination();
        self.transport
            .send(&to, &self.thread, Some(self.xid.as_str()), bytes)
            .map_err(Error::from)
    }

    /// Sends CONNECT and transitions to [`SessionState::Connecting`].
    ///
    /// # Errors
    ///
    /// Propagates a transport send failure.
    pub fn connect(self_rc: &Rc<RefCell<Self>>) -> Result<()> {
        let mut this = self_rc.borrow_mut();
        let message = Message::connect(this.locale.clone());
        this.send_message(message)?;
        this.state = SessionState::Connecting;
        Ok(())
    }

    /// Sends DISCONNECT (if currently connected), clears `remote_id`, and
    /// cancels every pending request with [`Error::Cancelled`].
    ///
    /// # Errors
    ///
    /// Propagates a transport send failure; pending requests are still
    /// cancelled even if the send itself fails, since the caller is
    /// tearing the session down regardless.
    pub fn disconnect(self_rc: &Rc<RefCell<Self>>) -> Result<()> {
        let mut this = self_rc.borrow_mut();
        let send_result = if this.state != SessionState::Disconnected {
            let message = Message::disconnect(this.locale.clone());
            this.send_message(message)
        } else {
            Ok(())
        };
        this.state = SessionState::Disconnected;
        this.remote_id = None;
        for request in this.requests.values_mut() {
            if !request.complete {
                request.fail(Error::Cancelled);
            }
        }
        let thread = this.thread.clone();
        drop(this);
        registry::remove(&thread);
        send_result
    }

    /// Issues a REQUEST for `method` with `params`, returning a handle the
    /// caller polls with [`RequestHandle::recv`].
    ///
    /// # Errors
    ///
    /// Propagates a transport send failure; the request is not recorded
    /// in the session's table if sending fails.
    pub fn request(
        self_rc: &Rc<RefCell<Self>>,
        method: impl Into<String>,
        params: Vec<Value>,
        timeout: Duration,
    ) -> Result<RequestHandle> {
        let mut this = self_rc.borrow_mut();
        let id = this.last_req_id;
        this.last_req_id += 1;
        let method = method.into();
        let call = MethodCall::new(method.clone(), params.clone());
        let message = Message::request(id, call, this.locale.clone());
        this.send_message(message)?;
        this.requests.insert(id, Request::new(method, params, timeout));
        drop(this);
        Ok(RequestHandle {
            id,
            session: Rc::clone(self_rc),
        })
    }

    pub(crate) fn request_failure(&self, id: u32) -> Option<&Error> {
        self.requests.get(&id).and_then(|r| r.failure.as_ref())
    }

    pub(crate) fn request_complete(&self, id: u32) -> bool {
        self.requests.get(&id).is_some_and(|r| r.complete)
    }

    /// Drives the transport for a single response on `id`, blocking up to
    /// `timeout`. A `STATUS 100` observed for this request extends the
    /// effective deadline by the original `timeout` rather than merely
    /// proving liveness.
    pub(crate) fn recv_request(&mut self, id: u32, timeout: Duration) -> Result<Option<Value>> {
        let mut deadline = Instant::now() + timeout;
        loop {
            if let Some(request) = self.requests.get_mut(&id) {
                if let Some(value) = request.response_queue.pop_front() {
                    return Ok(Some(value));
                }
                if request.complete {
                    return Ok(None);
                }
            } else {
                return Err(Error::Cancelled);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            match self.transport.recv(remaining) {
                Ok(Some(envelope)) => {
                    self.ingest(envelope)?;
                    if let Some(request) = self.requests.get_mut(&id) {
                        if std::mem::take(&mut request.extend_requested) {
                            deadline = Instant::now() + timeout;
                        }
                    }
                }
                Ok(None) => return Ok(None),
                Err(transport_err) => {
                    let err: Error = transport_err.into();
                    self.fail_all(&err);
                    return Err(err);
                }
            }
        }
    }

    /// Performs one non-blocking-to-`timeout` pump of the transport,
    /// ingesting at most one envelope. Returns `true` if an envelope was
    /// processed.
    ///
    /// # Errors
    ///
    /// Returns the transport error if `recv` failed; every pending request
    /// on this session is failed as a side effect.
    pub fn pump(&mut self, timeout: Duration) -> Result<bool> {
        match self.transport.recv(timeout) {
            Ok(Some(envelope)) => {
                self.ingest(envelope)?;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(transport_err) => {
                let err: Error = transport_err.into();
                self.fail_all(&err);
                Err(err)
            }
        }
    }

    fn fail_all(&mut self, err: &Error) {
        self.state = SessionState::Disconnected;
        self.remote_id = None;
        for request in self.requests.values_mut() {
            if !request.complete {
                request.fail(Error::Transport(err.to_string()));
            }
        }
    }

    fn ingest(&mut self, envelope: svcbus_transport::Envelope) -> Result<()> {
        if envelope.thread != self.thread {
            tracing::info!(thread = %envelope.thread, own_thread = %self.thread, "dropping envelope for foreign thread");
            return Ok(());
        }
        let messages = svcbus_protocol::decode_batch(&envelope.body, &self.codec)?;
        for message in messages {
            if !self.seen.insert_if_new(&envelope.thread, message.thread_trace, message.serial) {
                tracing::info!(thread_trace = message.thread_trace, "dropping duplicate delivery");
                continue;
            }
            self.ingest_one(&envelope.from, message);
        }
        Ok(())
    }

    fn ingest_one(&mut self, from: &Address, message: Message) {
        if message.mtype == MsgType::Status && self.state == SessionState::Connecting {
            if let Payload::Status(status) = &message.payload {
                if StatusCode::from(status.status_code) == StatusCode::Ok {
                    self.remote_id = Some(from.clone());
                    self.state = SessionState::Connected;
                } else if StatusCode::from(status.status_code).is_4xx()
                    || StatusCode::from(status.status_code).is_5xx()
                {
                    self.state = SessionState::Disconnected;
                    for request in self.requests.values_mut() {
                        if !request.complete {
                            request.fail(Error::Transport("connect failed".to_string()));
                        }
                    }
                }
                return;
            }
        }

        let Some(request) = self.requests.get_mut(&message.thread_trace) else {
            tracing::info!(thread_trace = message.thread_trace, "dropping envelope for unknown request");
            return;
        };

        match message.payload {
            Payload::Result(result) => request.push(result.content),
            Payload::Status(status) => {
                let code = StatusCode::from(status.status_code);
                if code == StatusCode::Continue {
                    request.extend_requested = true;
                } else if code == StatusCode::Complete {
                    request.mark_complete();
                } else if code.is_4xx() || code.is_5xx() {
                    request.fail(Error::Handler(status.status));
                }
            }
            Payload::Method(_) | Payload::None => {}
        }
    }
}
