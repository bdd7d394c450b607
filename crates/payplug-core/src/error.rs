// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Payplug.
//
// None of these ever cross the command boundary as an `Err`: the dispatcher
// folds every variant into the response value the command family expects.

use std::fmt;

use thiserror::Error;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Request decoding --
    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    // -- Ordering / setup --
    #[error("{0}")]
    Configuration(String),

    // -- Provider --
    #[error("provider failure {status}: {message}")]
    Provider { status: i64, message: String },

    // -- Authorization protocol --
    #[error("event {event} not accepted in state {state}")]
    ProtocolViolation { state: String, event: String },

    #[error("authorization session {0} is not active")]
    StaleSession(String),

    // -- Platform --
    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Config loading --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Provider status code carried into an encoded failure payload.
    ///
    /// Only remote failures have one; everything raised locally renders an
    /// empty status.
    pub fn provider_status(&self) -> Option<i64> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message carried into an encoded failure payload.
    pub fn payload_message(&self) -> String {
        match self {
            Self::Provider { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Collect-all validation failures.
///
/// Each bad field contributes one `"<field> error"` entry; the display form
/// joins them with `/` in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record `"<field> error"` when `failed` holds.
    pub fn check(&mut self, failed: bool, field: &str) {
        if failed {
            self.0.push(format!("{field} error"));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` if nothing was recorded, otherwise a `Validation` error.
    pub fn finish<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(BridgeError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}
