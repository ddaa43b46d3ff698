use serde_json::Value;
use studyspark_core::FailureKind;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("invalid http request: {0}")]
    Build(#[source] reqwest::Error),
    #[error("network error after {attempts} attempt(s): {source}")]
    Network {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },
    #[error("response {status} was cut off after {attempts} attempt(s): {source}")]
    Body {
        status: u16,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("server error {status} after {attempts} attempt(s): {body}")]
    Server {
        status: u16,
        body: Value,
        attempts: u32,
    },
    #[error("request failed: {status} {body}")]
    Client { status: u16, body: Value },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl RequestError {
    /// HTTP status of the response that caused the failure, if one arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Server { status, .. }
            | RequestError::Client { status, .. }
            | RequestError::Body { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            RequestError::Server { body, .. } | RequestError::Client { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Classification used by the retry policy; `None` for local failures.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RequestError::Network { .. } => Some(FailureKind::Network),
            RequestError::Timeout { .. } => Some(FailureKind::Timeout),
            RequestError::Server { status, .. } | RequestError::Client { status, .. } => {
                Some(FailureKind::Status(*status))
            }
            RequestError::Body { status, .. } => Some(FailureKind::Truncated(*status)),
            RequestError::InvalidUrl(_) | RequestError::Build(_) | RequestError::Json(_) => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RequestError::Network { attempts, .. }
            | RequestError::Timeout { attempts }
            | RequestError::Server { attempts, .. }
            | RequestError::Body { attempts, .. } => *attempts,
            _ => 1,
        }
    }

    pub(crate) fn from_status(status: u16, body: Value, attempts: u32) -> Self {
        if status >= 500 {
            RequestError::Server {
                status,
                body,
                attempts,
            }
        } else {
            RequestError::Client { status, body }
        }
    }

    /// Failure before any response arrived. Errors raised while assembling
    /// the request never left the process and are not classified.
    pub(crate) fn from_transport(err: reqwest::Error, attempts: u32) -> Self {
        if err.is_builder() {
            RequestError::Build(err)
        } else if err.is_timeout() {
            RequestError::Timeout { attempts }
        } else {
            RequestError::Network {
                attempts,
                source: err,
            }
        }
    }

    /// Failure while reading the body of a response whose status already
    /// arrived.
    pub(crate) fn from_body(err: reqwest::Error, status: u16, attempts: u32) -> Self {
        if err.is_timeout() {
            RequestError::Timeout { attempts }
        } else {
            RequestError::Body {
                status,
                attempts,
                source: err,
            }
        }
    }
}
