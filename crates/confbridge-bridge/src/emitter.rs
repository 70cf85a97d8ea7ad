// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event emitter: the fan-out hub between native callers, the sub-bridges and
// the scripting runtime.
//
// Registrations (one bridge per role, any number of listeners) live in a
// single registry behind one mutex.  The emitter only holds weak references:
// it never keeps a bridge or a listener alive, and a dead entry is treated as
// absent.  The lock is never held while calling out to a bridge or listener,
// so either may call back into the emitter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use confbridge_core::BridgeMethod;
use confbridge_core::error::{BridgeError, Result};
use confbridge_core::events::UNDEFINED_JITSI_ERROR;
use confbridge_core::types::{BridgeId, BridgeRole, Event, MethodCall};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::traits::{EventInterest, EventListener, SubBridge};
use crate::videoconf::VideoConfBridge;
use crate::xmpp::XmppBridge;

static SHARED: OnceLock<Arc<EventEmitter>> = OnceLock::new();

/// Handle for removing a listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct BridgeSlot {
    id: BridgeId,
    bridge: Weak<dyn SubBridge>,
}

struct ListenerSlot {
    id: ListenerId,
    interest: EventInterest,
    listener: Weak<dyn EventListener>,
}

#[derive(Default)]
struct Registry {
    bridges: HashMap<BridgeRole, BridgeSlot>,
    listeners: Vec<ListenerSlot>,
}

/// Routes method calls to the registered sub-bridges and events to the
/// registered listeners.
#[derive(Default)]
pub struct EventEmitter {
    registry: Mutex<Registry>,
}

impl EventEmitter {
    /// A fresh, independent emitter.  Prefer injecting one of these over
    /// [`EventEmitter::shared`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide emitter, created on first use and never torn down.
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Bridge registration -------------------------------------------------

    /// Register a bridge under its role, replacing whatever was there.
    pub fn register_bridge<B: SubBridge + 'static>(&self, bridge: &Arc<B>) {
        let role = bridge.role();
        let id = bridge.id();
        let erased: Arc<dyn SubBridge> = bridge.clone();
        let slot = BridgeSlot {
            id,
            bridge: Arc::downgrade(&erased),
        };

        let previous = self.registry().bridges.insert(role, slot);
        match previous {
            Some(prev) if prev.id != id => {
                info!(%role, %id, replaced = %prev.id, "bridge registration replaced");
            }
            Some(_) => debug!(%role, %id, "bridge re-registered"),
            None => info!(%role, %id, "bridge registered"),
        }
    }

    pub fn register_xmpp_bridge(&self, bridge: &Arc<XmppBridge>) {
        self.register_bridge(bridge);
    }

    pub fn register_video_conf_bridge(&self, bridge: &Arc<VideoConfBridge>) {
        self.register_bridge(bridge);
    }

    /// Remove the registration for `role`, but only if it still belongs to
    /// bridge `id`.  Returns whether anything was removed.
    pub fn unregister_bridge(&self, role: BridgeRole, id: BridgeId) -> bool {
        let mut registry = self.registry();
        let owned = registry.bridges.get(&role).is_some_and(|slot| slot.id == id);
        if !owned {
            return false;
        }
        registry.bridges.remove(&role);
        drop(registry);
        debug!(%role, %id, "bridge unregistered");
        true
    }

    /// The live bridge registered under `role`.
    pub fn bridge(&self, role: BridgeRole) -> Result<Arc<dyn SubBridge>> {
        let registry = self.registry();
        let slot = registry
            .bridges
            .get(&role)
            .ok_or(BridgeError::BridgeNotRegistered(role))?;
        slot.bridge.upgrade().ok_or(BridgeError::BridgeGone(role))
    }

    pub fn is_registered(&self, role: BridgeRole) -> bool {
        self.bridge(role).is_ok()
    }

    // -- Calls into the runtime ---------------------------------------------

    /// Forward a POST call.  Fire-and-forget: failures are also reported to
    /// listeners as `UNDEFINED_JITSI_ERROR`.
    pub fn call_post_method(
        &self,
        function_name: &str,
        params: &str,
        plugin: Option<&str>,
    ) -> Result<()> {
        self.forward(MethodCall::post(function_name, params, plugin))
    }

    /// Forward a GET call.  The result, if any, arrives as `XMPP_RESULT`.
    pub fn call_get_method(
        &self,
        function_name: &str,
        params: &str,
        plugin: Option<&str>,
    ) -> Result<()> {
        self.forward(MethodCall::get(function_name, params, plugin))
    }

    /// Encode a typed method and forward it.
    pub fn call_method(&self, method: &BridgeMethod) -> Result<()> {
        match method.to_call() {
            Ok(call) => self.forward(call),
            Err(e) => {
                self.report_error(&e);
                Err(e)
            }
        }
    }

    /// Forward a call to the bridge registered for its role.  At most once;
    /// there is no retry.
    #[instrument(skip_all, fields(function = %call.function_name, kind = ?call.kind))]
    pub fn forward(&self, call: MethodCall) -> Result<()> {
        let result = self.try_forward(call);
        if let Err(e) = &result {
            self.report_error(e);
        }
        result
    }

    fn try_forward(&self, call: MethodCall) -> Result<()> {
        let bridge = self.bridge(call.role())?;
        if !bridge.supported_events().contains(&call.channel()) {
            return Err(BridgeError::UnknownMethod(call.function_name));
        }
        bridge.forward(call)
    }

    // -- Events out to listeners ---------------------------------------------

    pub fn add_listener<L: EventListener + 'static>(
        &self,
        interest: EventInterest,
        listener: &Arc<L>,
    ) -> ListenerId {
        let id = ListenerId::new();
        let erased: Arc<dyn EventListener> = listener.clone();
        self.registry().listeners.push(ListenerSlot {
            id,
            interest,
            listener: Arc::downgrade(&erased),
        });
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry();
        let before = registry.listeners.len();
        registry.listeners.retain(|slot| slot.id != id);
        registry.listeners.len() != before
    }

    /// Number of listeners still alive.
    pub fn listener_count(&self) -> usize {
        self.registry()
            .listeners
            .iter()
            .filter(|slot| slot.listener.strong_count() > 0)
            .count()
    }

    /// Deliver an event to every interested listener, returning how many
    /// received it.  With nobody listening the event is discarded.
    pub fn send_event(&self, event: Event) -> usize {
        let targets: Vec<Arc<dyn EventListener>> = {
            let mut registry = self.registry();
            registry.listeners.retain(|slot| slot.listener.strong_count() > 0);
            registry
                .listeners
                .iter()
                .filter(|slot| slot.interest.matches(&event.name))
                .filter_map(|slot| slot.listener.upgrade())
                .collect()
        };

        if targets.is_empty() {
            debug!(event = %event.name, "no listener, event discarded");
            return 0;
        }

        debug!(event = %event.name, listeners = targets.len(), "dispatching event");
        for listener in &targets {
            listener.on_event(&event);
        }
        targets.len()
    }

    /// Surface an error as an `UNDEFINED_JITSI_ERROR` event.
    pub fn report_error(&self, error: &BridgeError) {
        warn!(%error, "bridge error");
        self.send_event(Event::new(UNDEFINED_JITSI_ERROR, error.to_event_body()));
    }
}
