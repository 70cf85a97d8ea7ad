// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signaling sub-bridge: the XMPP connection and its plugins.

use std::sync::Arc;

use confbridge_core::BridgeMethod;
use confbridge_core::error::Result;
use confbridge_core::methods::XMPP_CHANNELS;
use confbridge_core::types::{
    BridgeId, BridgeRole, CallParams, ConferenceOptions, Event, EventBody, MethodCall,
};
use tracing::instrument;

use crate::base::BridgeBase;
use crate::emitter::EventEmitter;
use crate::traits::{ScriptRuntime, SubBridge};

pub struct XmppBridge {
    base: BridgeBase,
}

impl XmppBridge {
    /// Create the bridge and register it with `emitter`.
    pub fn new(emitter: Arc<EventEmitter>, runtime: Arc<dyn ScriptRuntime>) -> Arc<Self> {
        let bridge = Arc::new(Self {
            base: BridgeBase::new(BridgeRole::Xmpp, emitter, runtime),
        });
        bridge.base.emitter().register_xmpp_bridge(&bridge);
        bridge
    }

    pub fn start_observing(&self) {
        self.base.start_observing();
    }

    pub fn stop_observing(&self) {
        self.base.stop_observing();
    }

    pub fn is_observing(&self) -> bool {
        self.base.is_observing()
    }

    /// Call `function_name` on the connection, or on `plugin` when given.
    #[instrument(skip(self, params))]
    pub fn call_post_method(
        &self,
        function_name: &str,
        params: impl Into<CallParams>,
        plugin: Option<&str>,
    ) -> Result<()> {
        let text = params.into().into_text()?;
        self.base.emitter().call_post_method(function_name, &text, plugin)
    }

    /// Like [`XmppBridge::call_post_method`], but the return value comes
    /// back as an `XMPP_RESULT` event typed by `function_name`.
    #[instrument(skip(self, params))]
    pub fn call_get_method(
        &self,
        function_name: &str,
        params: impl Into<CallParams>,
        plugin: Option<&str>,
    ) -> Result<()> {
        let text = params.into().into_text()?;
        self.base.emitter().call_get_method(function_name, &text, plugin)
    }

    /// Open the signaling connection.  Reported as `XMPP_RESULT` of type
    /// `connection_constants`.
    pub fn connect(&self, options: &ConferenceOptions) -> Result<()> {
        self.base
            .emitter()
            .call_method(&BridgeMethod::XmppConnect(options.clone()))
    }

    pub fn disconnect(&self) -> Result<()> {
        self.base.emitter().call_method(&BridgeMethod::XmppDisconnect)
    }

    pub fn send_event(&self, event: Event) -> usize {
        self.base.send_event(event)
    }

    pub fn send_body(&self, name: &str, body: EventBody) -> usize {
        self.base.send_body(name, body)
    }

    pub fn receive_event_json(&self, name: &str, body: &str) -> Result<usize> {
        self.base.receive_event_json(name, body)
    }
}

impl SubBridge for XmppBridge {
    fn id(&self) -> BridgeId {
        self.base.id()
    }

    fn role(&self) -> BridgeRole {
        BridgeRole::Xmpp
    }

    fn supported_events(&self) -> &'static [&'static str] {
        XMPP_CHANNELS
    }

    fn forward(&self, call: MethodCall) -> Result<()> {
        self.base.deliver(call)
    }
}
