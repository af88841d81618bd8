use std::fmt;

/// Three-digit status code carried on STATUS and RESULT envelopes.
///
/// Mirrors the subset of OpenSRF's status codes required by the wire
/// protocol (see the status table in the top-level specification). Unknown
/// numeric codes round-trip through [`StatusCode::Other`] rather than being
/// rejected, so a newer peer's status code never breaks an older decoder.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StatusCode {
    /// 100 — keepalive; extends the caller's receive timeout.
    Continue,
    /// 200 — a RESULT follows, or a CONNECT succeeded.
    Ok,
    /// 202 — request received, work in progress.
    Accepted,
    /// 205 — terminal marker for a request.
    Complete,
    /// 307 — retry against the pinned peer.
    Redirect,
    /// 400 — argument count or shape was wrong.
    BadRequest,
    /// 401 — auth required.
    Unauthorized,
    /// 403 — auth denied.
    Forbidden,
    /// 404 — method not registered.
    NotFound,
    /// 408 — server-side timeout.
    Timeout,
    /// 417 — server-side validation failure.
    ExpectationFailed,
    /// 500 — handler fault.
    InternalError,
    /// 501 — handler signaled unsupported.
    NotImplemented,
    /// 505 — envelope/hint incompatibility.
    VersionMismatch,
    /// A numeric code outside the known table.
    Other(u16),
}

impl StatusCode {
    /// The numeric wire value.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::Continue => 100,
            Self::Ok => 200,
            Self::Accepted => 202,
            Self::Complete => 205,
            Self::Redirect => 307,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Timeout => 408,
            Self::ExpectationFailed => 417,
            Self::InternalError => 500,
            Self::NotImplemented => 501,
            Self::VersionMismatch => 505,
            Self::Other(n) => n,
        }
    }

    /// The human-readable label used on the wire `status` field.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Continue => "Continue",
            Self::Ok => "OK",
            Self::Accepted => "Accepted",
            Self::Complete => "Request Complete",
            Self::Redirect => "Redirected",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Method Not Found",
            Self::Timeout => "Timeout",
            Self::ExpectationFailed => "Expectation Failed",
            Self::InternalError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
            Self::VersionMismatch => "Version Not Supported",
            Self::Other(_) => "Unknown",
        }
    }

    /// True for the 4xx range.
    #[must_use]
    pub fn is_4xx(self) -> bool {
        (400..500).contains(&self.code())
    }

    /// True for the 5xx range.
    #[must_use]
    pub fn is_5xx(self) -> bool {
        self.code() >= 500
    }

    /// True when this code terminates a request: [`StatusCode::Complete`] or
    /// any failure code (4xx/5xx). `Continue`, `Ok`, `Accepted`, and
    /// `Redirect` are non-terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete) || self.is_4xx() || self.is_5xx()
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        match code {
            100 => Self::Continue,
            200 => Self::Ok,
            202 => Self::Accepted,
            205 => Self::Complete,
            307 => Self::Redirect,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 => Self::Timeout,
            417 => Self::ExpectationFailed,
            500 => Self::InternalError,
            501 => Self::NotImplemented,
            505 => Self::VersionMismatch,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.label())
    }
}

/// The unified error type threaded through every `svcbus` crate.
///
/// Each variant owns enough context to render a log line and a wire STATUS
/// via [`Error::status_code`]; callers that only care about the wire
/// behavior can match on the status code rather than the variant.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed JSON or an envelope shape that does not parse.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// 1-based line of the offending byte.
        line: usize,
        /// 1-based column of the offending byte.
        column: usize,
        /// Human-readable description.
        message: String,
    },

    /// A well-formed envelope with an unknown type or missing required
    /// field.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The bus transport failed to connect, send, or receive.
    #[error("transport error: {0}")]
    Transport(String),

    /// Broker login failed.
    #[error("auth error: {0}")]
    Auth(String),

    /// A `recv` deadline elapsed.
    #[error("timed out waiting for a response")]
    Timeout,

    /// The requested `(service, method)` pair has no registration.
    #[error("method not found: {service}.{method}")]
    MethodNotFound {
        /// Target service name.
        service: String,
        /// Target method name.
        method: String,
    },

    /// `params.length < min_argc`, or params otherwise malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A handler returned or panicked with an application-level failure.
    #[error("handler error: {0}")]
    Handler(String),

    /// The session or request was cancelled (disconnect, transport loss).
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Maps this error onto the wire status code a STATUS envelope should
    /// carry for it.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Parse { .. } => StatusCode::VersionMismatch,
            Self::Protocol(_) => StatusCode::VersionMismatch,
            Self::Transport(_) => StatusCode::InternalError,
            Self::Auth(_) => StatusCode::Unauthorized,
            Self::Timeout => StatusCode::Timeout,
            Self::MethodNotFound { .. } => StatusCode::NotFound,
            Self::BadRequest(_) => StatusCode::BadRequest,
            Self::Handler(_) => StatusCode::InternalError,
            Self::Cancelled => StatusCode::ExpectationFailed,
        }
    }

    /// True if a caller retrying the same operation might succeed — i.e. the
    /// failure was transient rather than a structural mismatch.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match err.classify() {
            Category::Syntax | Category::Eof => Self::Parse {
                line: err.line(),
                column: err.column(),
                message: err.to_string(),
            },
            Category::Data | Category::Io => Self::Protocol(err.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Convenience alias used across `svcbus` crates.
pub type Result<T> = std::result::Result<T, Error>;
