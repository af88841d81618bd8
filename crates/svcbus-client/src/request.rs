use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use svcbus_core::{Error, Result};
use svcbus_wire::Value;

use crate::session::Session;

/// A single in-flight call's response buffer and completion state.
///
/// Invariant: once `complete` is set, no further values may be appended —
/// [`Request::push`] silently drops them rather than erroring, matching
/// the idempotent-duplicate-suppression rule this struct also serves
/// (a redelivered RESULT for an already-complete request is not a bug).
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) method: String,
    pub(crate) params: Vec<Value>,
    pub(crate) response_queue: VecDeque<Value>,
    pub(crate) complete: bool,
    pub(crate) failure: Option<Error>,
    pub(crate) timeout: Duration,
    pub(crate) extend_requested: bool,
}

impl Request {
    pub(crate) fn new(method: String, params: Vec<Value>, timeout: Duration) -> Self {
        Self {
            method,
            params,
            response_queue: VecDeque::new(),
            complete: false,
            failure: None,
            timeout,
            extend_requested: false,
        }
    }

    pub(crate) fn push(&mut self, value: Value) {
        if !self.complete {
            self.response_queue.push_back(value);
        }
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub(crate) fn fail(&mut self, err: Error) {
        self.failure = Some(err);
        self.complete = true;
    }
}

/// A caller's handle onto one outstanding request.
///
/// Holds a strong reference to the owning session so `recv` can drive the
/// transport; the session's own request table is the sole owner of the
/// [`Request`] state itself.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    pub(crate) id: u32,
    pub(crate) session: Rc<RefCell<Session>>,
}

impl RequestHandle {
    /// A weak reference suitable for holding without keeping the session
    /// alive, mirroring the data model's ownership note that requests hold
    /// only a weak back-reference to their session.
    #[must_use]
    pub fn downgrade(&self) -> WeakRequestHandle {
        WeakRequestHandle {
            id: self.id,
            session: Rc::downgrade(&self.session),
        }
    }

    /// The per-session request id (`thread_trace` on the wire).
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the next queued response value, blocking up to `timeout` if
    /// none is queued yet.
    ///
    /// Returns `Ok(None)` if the timeout elapses, or once a terminal
    /// STATUS has been observed and the queue has drained. Does not mutate
    /// the request's completion bit on a plain timeout — only a terminal
    /// STATUS or a transport failure does that.
    ///
    /// # Errors
    ///
    /// Returns the transport or protocol error that tore the session down,
    /// if any occurred while pumping for this response.
    pub fn recv(&self, timeout: Duration) -> Result<Option<Value>> {
        self.session.borrow_mut().recv_request(self.id, timeout)
    }

    /// The error that completed this request with failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.session
            .borrow()
            .request_failure(self.id)
            .map(|e| e.to_string())
    }

    /// True once a terminal STATUS has been observed for this request.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.borrow().request_complete(self.id)
    }
}

/// A non-owning reference to a [`RequestHandle`]'s session.
#[derive(Debug, Clone)]
pub struct WeakRequestHandle {
    id: u32,
    session: Weak<RefCell<Session>>,
}

impl WeakRequestHandle {
    /// Upgrades back to a strong [`RequestHandle`], if the session is
    /// still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<RequestHandle> {
        self.session.upgrade().map(|session| RequestHandle { id: self.id, session })
    }
}
