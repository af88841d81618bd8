use svcbus_core::{Error, Result};

use crate::value::{dereify, reify};
use crate::Value;

/// Abstracts over how a [`Value`] tree is turned into bytes and back.
///
/// The trait exists so an alternate wire encoding (MessagePack, CBOR) can be
/// added later without any crate above `svcbus-wire` depending on
/// `serde_json` directly — every caller goes through `Codec`.
pub trait Codec: Send + Sync {
    /// A short, stable name for this codec (`"json"`).
    fn name(&self) -> &'static str;

    /// Serializes `value` to bytes.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Deserializes `bytes` into a value tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on malformed input, including on empty
    /// input.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// The default, and currently only shipped, [`Codec`]: UTF-8 JSON with
/// `\uXXXX` escapes for non-ASCII code points.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec {
    /// When true, force ASCII-only output (escape every code point ≥ 0x80).
    /// Defaults to `true`.
    pub ascii_only: bool,
}

impl JsonCodec {
    /// The conventional ASCII-escaping codec used on the wire.
    #[must_use]
    pub fn new() -> Self {
        Self { ascii_only: true }
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let raw = dereify(value.clone());
        if self.ascii_only {
            Ok(ascii_escape(&serde_json::to_string(&raw)?).into_bytes())
        } else {
            Ok(serde_json::to_vec(&raw)?)
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        if bytes.is_empty() {
            return Err(Error::Parse {
                line: 0,
                column: 0,
                message: "empty input".to_string(),
            });
        }
        let raw: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(reify(raw))
    }
}

/// Rewrites a JSON string so every code point ≥ 0x80 is emitted as a
/// `\uXXXX` escape, matching the wire format's ASCII-only requirement.
/// `serde_json` already escapes control characters and quotes; this only
/// has to handle the non-ASCII range, and it must not touch bytes inside
/// an already-escaped sequence, so it operates on `char`s rather than raw
/// bytes.
fn ascii_escape(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut buf = [0u16; 2];
            for unit in ch.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_a_parse_error() {
        let codec = JsonCodec::new();
        let err = codec.decode(b"").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error_with_location() {
        let codec = JsonCodec::new();
        let err = codec.decode(b"{not json").unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_preserves_tagged_value() {
        let codec = JsonCodec::new();
        let value = Value::tagged("osrfException", Value::object([("foo".into(), Value::from("bar"))]));
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(
            bytes,
            br#"{"__c":"osrfException","__p":{"foo":"bar"}}"#.to_vec()
        );
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn non_ascii_is_escaped_by_default() {
        let codec = JsonCodec::new();
        let bytes = codec.encode(&Value::from("héllo")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.is_ascii());
        assert!(text.contains("\\u00e9"));
    }

    #[test]
    fn round_trip_preserves_numbers_and_bools() {
        let codec = JsonCodec::new();
        for value in [Value::from(4i64), Value::Bool(true), Value::Null] {
            let bytes = codec.encode(&value).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), value);
        }
    }
}
