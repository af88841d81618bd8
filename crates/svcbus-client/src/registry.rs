use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::session::Session;

thread_local! {
    /// Thread-local `thread -> Session` table.
    ///
    /// Sessions are single-threaded and cooperative: a session registry is
    /// scoped to its owning thread, and a process hosting many connections
    /// runs one registry per thread, not one shared globally.
    static SESSIONS: RefCell<HashMap<String, Rc<RefCell<Session>>>> = RefCell::new(HashMap::new());
}

pub(crate) fn register(thread: &str, session: Rc<RefCell<Session>>) {
    SESSIONS.with(|sessions| {
        sessions.borrow_mut().insert(thread.to_string(), session);
    });
}

pub(crate) fn remove(thread: &str) {
    SESSIONS.with(|sessions| {
        sessions.borrow_mut().remove(thread);
    });
}

/// Looks up the session registered for `thread` on the current thread, if
/// any.
#[must_use]
pub fn lookup(thread: &str) -> Option<Rc<RefCell<Session>>> {
    SESSIONS.with(|sessions| sessions.borrow().get(thread).cloned())
}

/// The number of sessions currently registered on this thread.
#[must_use]
pub fn len() -> usize {
    SESSIONS.with(|sessions| sessions.borrow().len())
}
