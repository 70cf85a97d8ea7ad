// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// State shared by every sub-bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use confbridge_core::error::{BridgeError, Result};
use confbridge_core::types::{BridgeId, BridgeRole, Event, EventBody, MethodCall};
use tracing::{debug, warn};

use crate::emitter::EventEmitter;
use crate::traits::ScriptRuntime;

/// Identity, emitter handle and runtime handle of a sub-bridge.
///
/// The runtime flips `observing` on once it has subscribed to the bridge's
/// channels; until then forwarded calls have nowhere to go.  Dropping the
/// base unregisters the bridge.
pub struct BridgeBase {
    id: BridgeId,
    role: BridgeRole,
    emitter: Arc<EventEmitter>,
    runtime: Arc<dyn ScriptRuntime>,
    observing: AtomicBool,
}

impl BridgeBase {
    pub fn new(
        role: BridgeRole,
        emitter: Arc<EventEmitter>,
        runtime: Arc<dyn ScriptRuntime>,
    ) -> Self {
        Self {
            id: BridgeId::new(),
            role,
            emitter,
            runtime,
            observing: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> BridgeId {
        self.id
    }

    pub fn role(&self) -> BridgeRole {
        self.role
    }

    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    pub fn start_observing(&self) {
        debug!(role = %self.role, runtime = self.runtime.name(), "runtime observing bridge");
        self.observing.store(true, Ordering::SeqCst);
    }

    pub fn stop_observing(&self) {
        debug!(role = %self.role, "runtime stopped observing bridge");
        self.observing.store(false, Ordering::SeqCst);
    }

    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::SeqCst)
    }

    /// Hand a call to the runtime.
    pub fn deliver(&self, call: MethodCall) -> Result<()> {
        if !self.is_observing() {
            return Err(BridgeError::NotObserving(self.role));
        }
        debug!(
            role = %self.role,
            channel = call.channel(),
            function = %call.function_name,
            plugin = call.plugin.as_deref().unwrap_or("-"),
            "delivering call to runtime"
        );
        self.runtime.deliver(call)
    }

    /// Publish an event from the runtime to native listeners.
    pub fn send_event(&self, event: Event) -> usize {
        self.emitter.send_event(event)
    }

    /// Publish an event whose body arrived as JSON text.  A malformed body
    /// is reported as an error event instead.
    pub fn receive_event_json(&self, name: &str, body: &str) -> Result<usize> {
        match Event::from_json(name, body) {
            Ok(event) => Ok(self.send_event(event)),
            Err(e) => {
                warn!(role = %self.role, event = name, error = %e, "dropping malformed event");
                self.emitter.report_error(&e);
                Err(e)
            }
        }
    }

    pub fn send_body(&self, name: &str, body: EventBody) -> usize {
        self.send_event(Event::new(name, body))
    }
}

impl Drop for BridgeBase {
    fn drop(&mut self) {
        self.emitter.unregister_bridge(self.role, self.id);
    }
}
