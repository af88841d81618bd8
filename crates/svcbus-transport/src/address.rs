use std::fmt;
use std::str::FromStr;

/// A bus address: either a load-balanced service address or a pinned peer
/// address.
///
/// Wire form is `service:<name>` or `peer:<opaque>`; [`Display`]/[`FromStr`]
/// round-trip exactly through that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    /// Load-balanced dispatch to any worker registered for `name`.
    Service(String),
    /// Pinned to one worker's opaque, transport-assigned identity.
    Peer(String),
}

impl Address {
    /// Builds a service address.
    #[must_use]
    pub fn service(name: impl Into<String>) -> Self {
        Self::Service(name.into())
    }

    /// Builds a peer address.
    #[must_use]
    pub fn peer(opaque: impl Into<String>) -> Self {
        Self::Peer(opaque.into())
    }

    /// True if this is a [`Address::Service`] address.
    #[must_use]
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// True if this is a [`Address::Peer`] address.
    #[must_use]
    pub fn is_peer(&self) -> bool {
        matches!(self, Self::Peer(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(name) => write!(f, "service:{name}"),
            Self::Peer(opaque) => write!(f, "peer:{opaque}"),
        }
    }
}

/// Error returned when a string does not match `service:<name>` or
/// `peer:<opaque>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bus address: {0:?}")]
pub struct ParseAddressError(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("service:") {
            if rest.is_empty() {
                return Err(ParseAddressError(s.to_string()));
            }
            Ok(Self::Service(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("peer:") {
            if rest.is_empty() {
                return Err(ParseAddressError(s.to_string()));
            }
            Ok(Self::Peer(rest.to_string()))
        } else {
            Err(ParseAddressError(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_address_round_trips() {
        let addr = Address::service("opensrf.settings");
        assert_eq!(addr.to_string(), "service:opensrf.settings");
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn peer_address_round_trips() {
        let addr = Address::peer("abc123.worker.7");
        assert_eq!(addr.to_string(), "peer:abc123.worker.7");
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn unprefixed_string_fails_to_parse() {
        assert!("opensrf.settings".parse::<Address>().is_err());
    }

    #[test]
    fn empty_name_fails_to_parse() {
        assert!("service:".parse::<Address>().is_err());
        assert!("peer:".parse::<Address>().is_err());
    }

    #[test]
    fn is_service_and_is_peer_are_mutually_exclusive() {
        let svc = Address::service("a");
        let peer = Address::peer("b");
        assert!(svc.is_service() && !svc.is_peer());
        assert!(peer.is_peer() && !peer.is_service());
    }
}
