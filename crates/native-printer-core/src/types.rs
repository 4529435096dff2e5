// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire messages exchanged with WebSocket clients, plus job identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a print job, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation requested by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Download a PDF and send it to a printer.
    PrintPdf,
    /// Anything else.  Kept so the job handler can reject it by name.
    Unknown(String),
}

impl Action {
    pub const PRINT_PDF: &'static str = "printPDF";

    pub fn as_str(&self) -> &str {
        match self {
            Self::PrintPdf => Self::PRINT_PDF,
            Self::Unknown(other) => other,
        }
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        if value == Self::PRINT_PDF {
            Self::PrintPdf
        } else {
            Self::Unknown(value)
        }
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        value.as_str().to_owned()
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        null_as_default::<_, String>(deserializer).map(Action::from)
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

/// Inbound message: `{"action":"printPDF","printer":"…","fileUrl":"…"}`.
///
/// Missing and `null` fields decode as empty so that the job handler, not
/// the JSON decoder, decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequest {
    pub action: Action,
    /// Target printer; empty means the platform default.
    #[serde(deserialize_with = "null_as_default")]
    pub printer: String,
    #[serde(rename = "fileUrl", deserialize_with = "null_as_default")]
    pub file_url: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl JobRequest {
    /// Decode a request from the raw bytes of a WebSocket frame.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Outbound message: `{"code":…,"message":"…","data":[…]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    pub code: u16,
    pub message: String,
    /// Printer names; only present on the first message of a session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
}

impl JobResponse {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const INTERNAL_ERROR: u16 = 500;

    /// Initial message carrying the printer list.
    pub fn printers(names: Vec<String>) -> Self {
        Self {
            code: Self::OK,
            message: "success".into(),
            data: Some(names),
        }
    }

    /// A job finished without error.
    pub fn printed() -> Self {
        Self {
            code: Self::OK,
            message: "printed".into(),
            data: None,
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
