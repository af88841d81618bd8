use std::collections::HashMap;
use std::sync::Arc;

use svcbus_core::Result;

use crate::context::CallContext;
use crate::responder::Responder;

/// The capability a registered method implements.
///
/// A plain trait rather than a base class one subclasses — object
/// composition over inheritance, per the design notes this protocol's
/// lineage settled on when it moved off its original class hierarchy.
/// Implementors are handed a fresh [`CallContext`] and a [`Responder`] per
/// call; they own no state the dispatcher needs to know about.
pub trait MethodHandler: Send + Sync {
    /// Executes the call. Use `responder.respond`/`responder.respond_complete`
    /// to emit results; returning `Err` reports a STATUS 500 to the caller
    /// without taking the dispatcher down.
    ///
    /// # Errors
    ///
    /// Any error returned here is surfaced to the caller as STATUS 500 with
    /// the error's `Display` text as the diagnostic message.
    fn call(&self, ctx: &CallContext, responder: &mut Responder<'_>) -> Result<()>;
}

/// Per-registration behavior flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodOptions {
    /// Buffer all `respond` values and flush them together at
    /// `respond_complete` instead of sending each as it's produced.
    pub atomic: bool,
    /// Hint that this method emits results incrementally (informational;
    /// does not change dispatch behavior beyond the default streaming
    /// emission `atomic: false` already provides).
    pub streaming: bool,
    /// Skip context/auth validation the caller would otherwise perform
    /// before invoking the handler (no-op at this layer; recorded for
    /// bindings that layer auth on top of the core).
    pub no_context: bool,
}

/// One method's full registration.
#[derive(Clone)]
pub struct Registration {
    /// Service this method is registered under.
    pub service: String,
    /// Method name as it appears in an inbound `osrfMethod` payload.
    pub method: String,
    /// The handler invoked for this method.
    pub handler: Arc<dyn MethodHandler>,
    /// Minimum accepted `params.len()`.
    pub min_argc: usize,
    /// Behavior flags.
    pub options: MethodOptions,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("service", &self.service)
            .field("method", &self.method)
            .field("min_argc", &self.min_argc)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A method registry: immutable once [`Registry::freeze`] has run.
///
/// An `Arc<dyn MethodHandler>` per registration, keyed by `(service, method)`
/// for O(1) lookup once per call.
#[derive(Debug, Default)]
pub struct Registry {
    methods: HashMap<(String, String), Registration>,
    frozen: bool,
}

impl Registry {
    /// Builds an empty, unfrozen registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method.
    ///
    /// # Panics
    ///
    /// Panics if the registry has already been [`Registry::freeze`]n —
    /// registration is a boot-time-only operation.
    pub fn register(
        &mut self,
        service: impl Into<String>,
        method: impl Into<String>,
        handler: Arc<dyn MethodHandler>,
        min_argc: usize,
        options: MethodOptions,
    ) {
        assert!(!self.frozen, "cannot register a method after Registry::freeze()");
        let service = service.into();
        let method = method.into();
        self.methods.insert(
            (service.clone(), method.clone()),
            Registration {
                service,
                method,
                handler,
                min_argc,
                options,
            },
        );
    }

    /// Closes the registry to further registration. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// True once [`Registry::freeze`] has run.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Looks up a registration by `(service, method)`.
    #[must_use]
    pub fn lookup(&self, service: &str, method: &str) -> Option<&Registration> {
        self.methods.get(&(service.to_string(), method.to_string()))
    }

    /// The number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// True if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
