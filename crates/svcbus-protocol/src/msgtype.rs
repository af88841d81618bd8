/// The kind of a [`crate::Message`]'s payload, carried as the `type` field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MsgType {
    /// Requests a stateful session with the target worker.
    Connect,
    /// Invokes a method; payload is a [`crate::MethodCall`].
    Request,
    /// Carries one API response; payload is a [`crate::ResultPayload`].
    Result,
    /// Carries a lifecycle signal; payload is a [`crate::StatusPayload`].
    Status,
    /// Tears down a stateful session.
    Disconnect,
}

impl MsgType {
    /// The wire string for this variant (`"REQUEST"`, ...).
    #[must_use]
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Request => "REQUEST",
            Self::Result => "RESULT",
            Self::Status => "STATUS",
            Self::Disconnect => "DISCONNECT",
        }
    }

    /// Parses the wire string for a `type` field.
    #[must_use]
    pub fn from_wire_str(s: &str) -> Option<Self> {
        match s {
            "CONNECT" => Some(Self::Connect),
            "REQUEST" => Some(Self::Request),
            "RESULT" => Some(Self::Result),
            "STATUS" => Some(Self::Status),
            "DISCONNECT" => Some(Self::Disconnect),
            _ => None,
        }
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_round_trips_through_its_wire_string() {
        for mtype in [
            MsgType::Connect,
            MsgType::Request,
            MsgType::Result,
            MsgType::Status,
            MsgType::Disconnect,
        ] {
            assert_eq!(MsgType::from_wire_str(mtype.as_wire_str()), Some(mtype));
        }
    }

    #[test]
    fn unknown_wire_string_is_none() {
        assert_eq!(MsgType::from_wire_str("NOPE"), None);
    }
}
