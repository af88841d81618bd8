use svcbus_core::{Error, Result, StatusCode};
use svcbus_wire::{Codec, Value};

use crate::msgtype::MsgType;
use crate::{DEFAULT_LOCALE, HINT_MESSAGE, HINT_METHOD, HINT_METHOD_EXCEPTION, HINT_RESULT, HINT_STATUS};

/// Payload of a REQUEST message: a method name and its positional
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Method name, e.g. `"add"`.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl MethodCall {
    /// Builds a new method call.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    fn to_value(&self) -> Value {
        Value::tagged(
            HINT_METHOD,
            Value::object([
                ("method".to_string(), Value::from(self.method.as_str())),
                ("params".to_string(), Value::Array(self.params.clone())),
            ]),
        )
    }

    fn from_value(hint: &str, payload: &Value) -> Result<Self> {
        if hint != HINT_METHOD {
            return Err(Error::Protocol(format!("expected {HINT_METHOD}, got {hint}")));
        }
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::Protocol("osrfMethod payload must be an object".to_string()))?;
        let method = obj
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Protocol("osrfMethod missing method".to_string()))?
            .to_string();
        let params = obj
            .get("params")
            .and_then(Value::as_array)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        Ok(Self { method, params })
    }
}

/// Payload of a RESULT message: one API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPayload {
    /// Human-readable status label.
    pub status: String,
    /// Numeric status code — `200` for a successful result.
    pub status_code: u16,
    /// The API response value.
    pub content: Value,
}

impl ResultPayload {
    /// Builds a successful (`statusCode: 200`) result carrying `content`.
    #[must_use]
    pub fn ok(content: Value) -> Self {
        Self {
            status: StatusCode::Ok.label().to_string(),
            status_code: StatusCode::Ok.code(),
            content,
        }
    }

    fn to_value(&self) -> Value {
        Value::tagged(
            HINT_RESULT,
            Value::object([
                ("status".to_string(), Value::from(self.status.as_str())),
                ("statusCode".to_string(), Value::from(u32::from(self.status_code))),
                ("content".to_string(), self.content.clone()),
            ]),
        )
    }

    fn from_value(hint: &str, payload: &Value) -> Result<Self> {
        if hint != HINT_RESULT {
            return Err(Error::Protocol(format!("expected {HINT_RESULT}, got {hint}")));
        }
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::Protocol("osrfResult payload must be an object".to_string()))?;
        let status_code = obj
            .get("statusCode")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::Protocol("osrfResult missing statusCode".to_string()))?
            as u16;
        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| StatusCode::from(status_code).label().to_string());
        let content = obj.get("content").cloned().unwrap_or(Value::Null);
        Ok(Self {
            status,
            status_code,
            content,
        })
    }
}

/// Payload of a STATUS message: a lifecycle signal.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload {
    /// Human-readable status label.
    pub status: String,
    /// Numeric status code.
    pub status_code: u16,
}

impl StatusPayload {
    /// Builds a status payload from a [`StatusCode`], using its canonical
    /// label.
    #[must_use]
    pub fn new(code: StatusCode) -> Self {
        Self {
            status: code.label().to_string(),
            status_code: code.code(),
        }
    }

    /// The status code, reparsed from the numeric field.
    #[must_use]
    pub fn code(&self) -> StatusCode {
        StatusCode::from(self.status_code)
    }

    /// The tagged hint this status encodes under: a handler-raised
    /// exception (4xx/5xx) is tagged `osrfMethodException` rather than
    /// `osrfConnectStatus`, matching the OpenSRF lineage this protocol is
    /// modeled on.
    fn hint(&self) -> &'static str {
        let code = StatusCode::from(self.status_code);
        if code.is_4xx() || code.is_5xx() {
            HINT_METHOD_EXCEPTION
        } else {
            HINT_STATUS
        }
    }

    fn to_value(&self) -> Value {
        Value::tagged(
            self.hint(),
            Value::object([
                ("status".to_string(), Value::from(self.status.as_str())),
                ("statusCode".to_string(), Value::from(u32::from(self.status_code))),
            ]),
        )
    }

    fn from_value(hint: &str, payload: &Value) -> Result<Self> {
        if hint != HINT_STATUS && hint != HINT_METHOD_EXCEPTION {
            return Err(Error::Protocol(format!(
                "expected {HINT_STATUS} or {HINT_METHOD_EXCEPTION}, got {hint}"
            )));
        }
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::Protocol("status payload must be an object".to_string()))?;
        let status_code = obj
            .get("statusCode")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::Protocol("status payload missing statusCode".to_string()))?
            as u16;
        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| StatusCode::from(status_code).label().to_string());
        Ok(Self { status, status_code })
    }
}

/// The payload carried by a [`Message`]; the variant is determined by the
/// message's [`MsgType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// REQUEST payload.
    Method(MethodCall),
    /// RESULT payload.
    Result(ResultPayload),
    /// STATUS payload.
    Status(StatusPayload),
    /// CONNECT/DISCONNECT carry no payload.
    None,
}

/// A single wire message: one element of an outbound batch.
///
/// Encodes as a tagged value with hint `osrfMessage`
/// (see [`crate::HINT_MESSAGE`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Monotonic per-session request id. Ignored (conventionally `0`) for
    /// CONNECT/DISCONNECT.
    pub thread_trace: u32,
    /// Discriminates [`Payload`].
    pub mtype: MsgType,
    /// The message's payload.
    pub payload: Payload,
    /// Locale echoed back by the server for this request chain.
    pub locale: String,
    /// Sender-assigned, monotonically increasing per-message counter.
    ///
    /// Distinct from `thread_trace`: several messages (e.g. multiple
    /// streamed RESULTs) share one `thread_trace`, but each is its own
    /// `serial`. Combined with `(thread, thread_trace)` this forms the
    /// idempotence key a receiving session uses to drop redelivered
    /// duplicates without mistaking two legitimately identical payloads
    /// for a single redelivery. Defaults to `0`; the sender (`Session`,
    /// `Dispatcher`, `Responder`) assigns the real value just before
    /// encoding.
    pub serial: u32,
}

impl Message {
    /// Builds a REQUEST message.
    #[must_use]
    pub fn request(thread_trace: u32, call: MethodCall, locale: impl Into<String>) -> Self {
        Self {
            thread_trace,
            mtype: MsgType::Request,
            payload: Payload::Method(call),
            locale: locale.into(),
            serial: 0,
        }
    }

    /// Builds a RESULT message.
    #[must_use]
    pub fn result(thread_trace: u32, result: ResultPayload, locale: impl Into<String>) -> Self {
        Self {
            thread_trace,
            mtype: MsgType::Result,
            payload: Payload::Result(result),
            locale: locale.into(),
            serial: 0,
        }
    }

    /// Builds a STATUS message.
    #[must_use]
    pub fn status(thread_trace: u32, status: StatusPayload, locale: impl Into<String>) -> Self {
        Self {
            thread_trace,
            mtype: MsgType::Status,
            payload: Payload::Status(status),
            locale: locale.into(),
            serial: 0,
        }
    }

    /// Builds a CONNECT message.
    #[must_use]
    pub fn connect(locale: impl Into<String>) -> Self {
        Self {
            thread_trace: 0,
            mtype: MsgType::Connect,
            payload: Payload::None,
            locale: locale.into(),
            serial: 0,
        }
    }

    /// Builds a DISCONNECT message.
    #[must_use]
    pub fn disconnect(locale: impl Into<String>) -> Self {
        Self {
            thread_trace: 0,
            mtype: MsgType::Disconnect,
            payload: Payload::None,
            locale: locale.into(),
            serial: 0,
        }
    }

    /// Sets [`Message::serial`], for use by the sender just before encoding.
    #[must_use]
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = serial;
        self
    }

    /// Converts to the tagged [`Value`] this message encodes as.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut fields = vec![
            ("threadTrace".to_string(), Value::from(self.thread_trace as i64)),
            ("type".to_string(), Value::from(self.mtype.as_wire_str())),
            ("locale".to_string(), Value::from(self.locale.as_str())),
            ("serial".to_string(), Value::from(self.serial as i64)),
        ];
        let payload_value = match &self.payload {
            Payload::Method(m) => Some(m.to_value()),
            Payload::Result(r) => Some(r.to_value()),
            Payload::Status(s) => Some(s.to_value()),
            Payload::None => None,
        };
        if let Some(payload) = payload_value {
            fields.push(("payload".to_string(), payload));
        }
        Value::tagged(HINT_MESSAGE, Value::object(fields))
    }

    /// Parses a [`Message`] back out of a decoded [`Value`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `value` is not a tagged `osrfMessage`
    /// shape, or if a required field is missing or the wrong type.
    pub fn from_value(value: &Value) -> Result<Self> {
        let hint = value
            .class_hint()
            .ok_or_else(|| Error::Protocol("expected a tagged osrfMessage value".to_string()))?;
        if hint != HINT_MESSAGE {
            return Err(Error::Protocol(format!("expected {HINT_MESSAGE}, got {hint}")));
        }
        let obj = value
            .payload()
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Protocol("osrfMessage payload must be an object".to_string()))?;

        let thread_trace = obj
            .get("threadTrace")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::Protocol("osrfMessage missing threadTrace".to_string()))?
            as u32;

        let mtype_str = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Protocol("osrfMessage missing type".to_string()))?;
        let mtype = MsgType::from_wire_str(mtype_str)
            .ok_or_else(|| Error::Protocol(format!("unknown message type {mtype_str}")))?;

        let locale = obj
            .get("locale")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_LOCALE)
            .to_string();

        let serial = obj.get("serial").and_then(Value::as_u64).unwrap_or(0) as u32;

        let payload_value = obj.get("payload");
        let payload = match (mtype, payload_value) {
            (MsgType::Request, Some(p)) => {
                let hint = p.class_hint().unwrap_or_default();
                Payload::Method(MethodCall::from_value(hint, p.payload().unwrap_or(p))?)
            }
            (MsgType::Result, Some(p)) => {
                let hint = p.class_hint().unwrap_or_default();
                Payload::Result(ResultPayload::from_value(hint, p.payload().unwrap_or(p))?)
            }
            (MsgType::Status, Some(p)) => {
                let hint = p.class_hint().unwrap_or_default();
                Payload::Status(StatusPayload::from_value(hint, p.payload().unwrap_or(p))?)
            }
            _ => Payload::None,
        };

        Ok(Self {
            thread_trace,
            mtype,
            payload,
            locale,
            serial,
        })
    }
}

/// Encodes a batch of messages as the JSON array transmission unit the wire
/// format requires.
///
/// # Errors
///
/// Propagates any [`svcbus_core::Error`] the codec raises.
pub fn encode_batch(messages: &[Message], codec: &dyn Codec) -> Result<Vec<u8>> {
    let array = Value::Array(messages.iter().map(Message::to_value).collect());
    codec.encode(&array)
}

/// Decodes a transmission unit into its constituent messages.
///
/// Lenient on shape: a bare single `osrfMessage` object (not wrapped in an
/// array) decodes to a one-element batch, matching real-world broker
/// payloads that occasionally omit the outer array.
///
/// # Errors
///
/// Returns [`Error::Parse`] on malformed JSON, or [`Error::Protocol`] if a
/// message does not have the expected shape.
pub fn decode_batch(bytes: &[u8], codec: &dyn Codec) -> Result<Vec<Message>> {
    let value = codec.decode(bytes)?;
    match value {
        Value::Array(items) => items.iter().map(Message::from_value).collect(),
        single @ Value::Tagged { .. } => Ok(vec![Message::from_value(&single)?]),
        other => Err(Error::Protocol(format!(
            "expected a JSON array of messages, got {other:?}"
        ))),
    }
}
