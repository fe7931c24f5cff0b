//! Rule outcomes and the failure artifact handed back to the transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of failure a rule can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    BadRequest,
    Unauthorized,
    NotFound,
}

impl StatusKind {
    /// HTTP status code the transport should render.
    pub fn status_code(self) -> u16 {
        match self {
            StatusKind::BadRequest => 400,
            StatusKind::Unauthorized => 401,
            StatusKind::NotFound => 404,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            StatusKind::BadRequest => "Bad Request",
            StatusKind::Unauthorized => "Unauthorized",
            StatusKind::NotFound => "Not Found",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code(), self.reason())
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub status: StatusKind,
    pub message: String,
}

/// Result of evaluating a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(FailureDetail),
}

impl Outcome {
    pub fn fail(status: StatusKind, message: impl Into<String>) -> Self {
        Outcome::Fail(FailureDetail {
            status,
            message: message.into(),
        })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::fail(StatusKind::BadRequest, message)
    }

    pub fn unauthorized() -> Self {
        Self::fail(StatusKind::Unauthorized, "Unauthorized access")
    }

    pub fn not_found() -> Self {
        Self::fail(StatusKind::NotFound, "Not found")
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn failure(&self) -> Option<&FailureDetail> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(detail) => Some(detail),
        }
    }
}

/// Body of a rejection response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionBody {
    pub detail: String,
}

/// Transport-level failure artifact returned in place of a handler result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusKind,
    pub body: RejectionBody,
}

impl Rejection {
    pub fn status_code(&self) -> u16 {
        self.status.status_code()
    }

    pub fn detail(&self) -> &str {
        &self.body.detail
    }
}

impl From<FailureDetail> for Rejection {
    fn from(detail: FailureDetail) -> Self {
        Self {
            status: detail.status,
            body: RejectionBody {
                detail: detail.message,
            },
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.body.detail)
    }
}
