use super::LedgerError;

/// Outcome of a host invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success { payload: Vec<u8> },
    Error { message: String },
}

impl Response {
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Response::Success {
            payload: payload.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    /// Payload of a successful response; empty for failures.
    pub fn payload(&self) -> &[u8] {
        match self {
            Response::Success { payload } => payload,
            Response::Error { .. } => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Response::Success { .. } => None,
            Response::Error { message } => Some(message),
        }
    }
}

impl From<Result<Vec<u8>, LedgerError>> for Response {
    fn from(result: Result<Vec<u8>, LedgerError>) -> Self {
        match result {
            Ok(payload) => Response::success(payload),
            Err(e) => Response::error(e.to_string()),
        }
    }
}
