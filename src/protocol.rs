//! JSON-lines protocol spoken by the stdio server

use crate::error::ProbeError;
use crate::probe::PermissionReport;
use serde::{Deserialize, Serialize};

/// Request types, one per permission query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    IsTrusted,
    /// May show the system authorization dialog
    IsTrustedPrompt,
    IsMasEnvironment,
    GetPermissionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success { result: ResponseData },
    Error { error: ErrorInfo },
}

/// Untagged, so the fullest shape is listed first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Status(PermissionReport),
    Trusted { trusted: bool },
    Sandboxed { sandboxed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UnsupportedPlatform,
    InvalidRequest,
    Internal,
}

impl From<&ProbeError> for ErrorCode {
    fn from(err: &ProbeError) -> Self {
        match err {
            ProbeError::UnsupportedPlatform { .. } => Self::UnsupportedPlatform,
            ProbeError::Backend(_) => Self::Internal,
        }
    }
}

/// Protocol envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub protocol_version: String,
    /// Caller-chosen correlation id, echoed on the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Request(Request),
    Response(Response),
}

impl Message {
    pub const PROTOCOL_VERSION: &'static str = "1.0";

    pub fn request(req: Request) -> Self {
        Self {
            protocol_version: Self::PROTOCOL_VERSION.to_string(),
            id: None,
            content: MessageContent::Request(req),
        }
    }

    pub fn response(resp: Response) -> Self {
        Self {
            protocol_version: Self::PROTOCOL_VERSION.to_string(),
            id: None,
            content: MessageContent::Response(resp),
        }
    }

    pub fn success(data: ResponseData) -> Self {
        Self::response(Response::Success { result: data })
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::response(Response::Error {
            error: ErrorInfo {
                code,
                message: message.into(),
            },
        })
    }

    pub fn with_id(mut self, id: Option<serde_json::Value>) -> Self {
        self.id = id;
        self
    }
}

impl From<ProbeError> for Message {
    fn from(err: ProbeError) -> Self {
        Self::error(ErrorCode::from(&err), err.to_string())
    }
}
