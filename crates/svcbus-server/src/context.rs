use svcbus_wire::Value;

/// Everything a [`crate::MethodHandler`] needs to answer one call.
///
/// Built fresh per REQUEST by [`crate::Dispatcher::dispatch`] — handlers
/// never see the session or transport directly, only this context plus
/// the [`crate::Responder`] they're handed alongside it.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// The session thread this call arrived on.
    pub thread: String,
    /// The request's `thread_trace`.
    pub request_id: u32,
    /// The method name invoked.
    pub method: String,
    /// Positional parameters, already argc-checked against `min_argc`.
    pub params: Vec<Value>,
    /// Locale to echo back in responses.
    pub locale: String,
    /// The correlation id adopted from the inbound message's XID.
    pub xid: String,
}
