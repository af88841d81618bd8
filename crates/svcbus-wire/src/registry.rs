use std::collections::HashMap;

use parking_lot::RwLock;

/// Process-wide registry mapping a short wire hint (`"osrfException"`) to a
/// logical class name (`"OpenSRF::DomainObject::oilsException"`).
///
/// Registration is additive: registering the same `(hint, class)` pair
/// twice is a no-op, and re-registering a hint with a *different* class
/// name replaces the mapping. Lookups never fail — an unregistered hint
/// simply has no known class name, which is exactly the forward-compatible
/// behavior the decoder relies on (see [`crate::Value`]).
#[derive(Debug, Default)]
pub struct HintRegistry {
    entries: RwLock<HashMap<String, String>>,
}

impl HintRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hint -> class`, replacing any existing mapping for `hint`.
    pub fn register(&self, hint: impl Into<String>, class: impl Into<String>) {
        self.entries.write().insert(hint.into(), class.into());
    }

    /// Registers every `(hint, class)` pair from `entries` in one pass —
    /// useful for seeding the registry from a static table at boot without
    /// one call per row.
    pub fn register_all<I, H, C>(&self, entries: I)
    where
        I: IntoIterator<Item = (H, C)>,
        H: Into<String>,
        C: Into<String>,
    {
        let mut guard = self.entries.write();
        for (hint, class) in entries {
            guard.insert(hint.into(), class.into());
        }
    }

    /// Looks up the logical class name registered for `hint`, if any.
    #[must_use]
    pub fn class_for(&self, hint: &str) -> Option<String> {
        self.entries.read().get(hint).cloned()
    }

    /// Number of registered hints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if no hints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent_for_identical_pairs() {
        let reg = HintRegistry::new();
        reg.register("osrfException", "OpenSRF::DomainObject::oilsException");
        reg.register("osrfException", "OpenSRF::DomainObject::oilsException");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn reregistering_with_new_name_replaces_mapping() {
        let reg = HintRegistry::new();
        reg.register("osrfException", "Old::Name");
        reg.register("osrfException", "New::Name");
        assert_eq!(reg.class_for("osrfException").as_deref(), Some("New::Name"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_hint_has_no_class() {
        let reg = HintRegistry::new();
        assert_eq!(reg.class_for("nope"), None);
    }

    #[test]
    fn register_all_seeds_in_bulk() {
        let reg = HintRegistry::new();
        reg.register_all([
            ("osrfMessage", "OpenSRF::DomainObject::osrfMessage"),
            ("osrfMethod", "OpenSRF::DomainObject::osrfMethod"),
        ]);
        assert_eq!(reg.len(), 2);
        assert!(reg.class_for("osrfMethod").is_some());
    }
}
