// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Confbridge.
//
// Nothing here is ever thrown across the runtime boundary: the emitter turns
// every `BridgeError` into an `UNDEFINED_JITSI_ERROR` event instead.

use serde_json::Value;
use thiserror::Error;

use crate::types::{BridgeRole, EventBody};

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Payload errors --
    #[error("malformed payload {text:?}: {reason}")]
    PayloadDecode { text: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Routing errors --
    #[error("no plugin handler registered under {plugin:?}")]
    RoutingMiss { plugin: String },

    #[error("unknown bridge method: {0}")]
    UnknownMethod(String),

    #[error("no {0} registered with the event emitter")]
    BridgeNotRegistered(BridgeRole),

    #[error("registered {0} has been torn down")]
    BridgeGone(BridgeRole),

    #[error("{0} is not observed by the runtime")]
    NotObserving(BridgeRole),

    // -- Runtime errors --
    #[error("runtime reported an error: {0}")]
    RuntimeReported(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Build a decode error that keeps the offending text.
    pub fn payload(text: impl Into<String>, reason: impl ToString) -> Self {
        Self::PayloadDecode {
            text: text.into(),
            reason: reason.to_string(),
        }
    }

    /// Body of the `UNDEFINED_JITSI_ERROR` event reporting this error.
    pub fn to_event_body(&self) -> EventBody {
        let mut body = EventBody::new();
        body.insert("errorMessage".into(), Value::String(self.to_string()));
        body
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
