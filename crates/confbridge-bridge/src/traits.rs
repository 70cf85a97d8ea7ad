// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seams between the emitter, the sub-bridges and the scripting runtime.

use confbridge_core::error::Result;
use confbridge_core::types::{BridgeId, BridgeRole, Event, MethodCall};
use serde_json::Value;

/// The embedded scripting runtime, seen from the native side.
///
/// `deliver` hands a method call over and returns immediately; anything the
/// runtime has to say about the call comes back later as events.
pub trait ScriptRuntime: Send + Sync {
    /// Human-readable runtime name (e.g. "Hermes", "simulated").
    fn name(&self) -> &str;

    /// Accept one method call.  An error means the call was dropped.
    fn deliver(&self, call: MethodCall) -> Result<()>;
}

/// A native module registered with the emitter under one role.
pub trait SubBridge: Send + Sync {
    fn id(&self) -> BridgeId;

    fn role(&self) -> BridgeRole;

    /// Runtime-side channels this bridge publishes calls on.
    fn supported_events(&self) -> &'static [&'static str];

    /// Push a call into the runtime.
    fn forward(&self, call: MethodCall) -> Result<()>;
}

/// Receives events fanned out by the emitter.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// A named handler inside the runtime: the signaling connection itself, or
/// one of its plugins.
pub trait PluginHandler: Send + Sync {
    fn invoke(&self, function_name: &str, params: &[Value]) -> Result<Value>;
}

impl<F> PluginHandler for F
where
    F: Fn(&str, &[Value]) -> Result<Value> + Send + Sync,
{
    fn invoke(&self, function_name: &str, params: &[Value]) -> Result<Value> {
        self(function_name, params)
    }
}

/// Which event names a listener wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventInterest {
    All,
    Names(Vec<String>),
}

impl EventInterest {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Names(names) => names.iter().any(|n| n == name),
        }
    }
}
