use crate::Address;

/// One inbound unit off the bus: an opaque body plus its routing metadata.
///
/// `body` is the raw encoded transmission unit (a JSON array of
/// `osrfMessage` values, per `svcbus-protocol`) — this crate never
/// interprets it, only routes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The address that sent this envelope.
    pub from: Address,
    /// The session thread this envelope belongs to.
    pub thread: String,
    /// The correlation id (XID) this envelope rides under, if any.
    ///
    /// Carried as transport-level metadata — a sibling of the envelope's
    /// body rather than a reserved key inside it — mirroring how the
    /// protocol this bus is modeled on attaches its transaction id to the
    /// outer transport stanza, not to the message payload.
    pub xid: Option<String>,
    /// The raw encoded body.
    pub body: Vec<u8>,
}

impl Envelope {
    /// Builds a new envelope.
    #[must_use]
    pub fn new(from: Address, thread: impl Into<String>, xid: Option<String>, body: Vec<u8>) -> Self {
        Self {
            from,
            thread: thread.into(),
            xid,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_sets_all_fields() {
        let env = Envelope::new(Address::service("foo"), "t-1", Some("xid-1".to_string()), vec![1, 2, 3]);
        assert_eq!(env.from, Address::service("foo"));
        assert_eq!(env.thread, "t-1");
        assert_eq!(env.xid.as_deref(), Some("xid-1"));
        assert_eq!(env.body, vec![1, 2, 3]);
    }
}
