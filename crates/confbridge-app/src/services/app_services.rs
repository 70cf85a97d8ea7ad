// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: loads configuration and wires the emitter, the
// runtime and its sub-bridges together.
//
// Desktop builds have no embedded scripting engine, so the runtime is the
// in-process simulation.  Everything is Arc-wrapped and cheap to clone.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use confbridge_bridge::{EventEmitter, SimulatedRuntime, VideoConfBridge, XmppBridge};
use confbridge_core::error::BridgeError;
use confbridge_core::BridgeConfig;
use confbridge_view::{ConferenceView, UiHandle};
use tracing::info;

#[derive(Clone)]
pub struct AppServices {
    pub config: BridgeConfig,
    pub emitter: Arc<EventEmitter>,
    pub runtime: Arc<SimulatedRuntime>,
    pub xmpp: Arc<XmppBridge>,
    pub video_conf: Arc<VideoConfBridge>,
}

impl AppServices {
    /// Initialise all services on the process-wide emitter.  Call once at
    /// startup.
    pub fn init(config: BridgeConfig) -> Self {
        let emitter = EventEmitter::shared();
        let runtime = SimulatedRuntime::new(config.clone());
        let (xmpp, video_conf) = runtime.install(&emitter);
        info!(server = config.server_url.as_deref().unwrap_or("-"), "app services initialised");

        Self {
            config,
            emitter,
            runtime,
            xmpp,
            video_conf,
        }
    }

    /// A conference view dispatching to the UI context behind `ui`.
    pub fn open_view(&self, ui: UiHandle) -> ConferenceView {
        ConferenceView::new(
            Arc::clone(&self.emitter),
            Arc::clone(&self.xmpp),
            Arc::clone(&self.video_conf),
            ui,
        )
    }
}

/// Load the config file, falling back to defaults.  Returns the warning to
/// log once logging is up, if any.
pub fn load_config(path: &Path) -> (BridgeConfig, Option<String>) {
    match BridgeConfig::load(path) {
        Ok(config) => (config, None),
        Err(BridgeError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            (BridgeConfig::default(), None)
        }
        Err(e) => (
            BridgeConfig::default(),
            Some(format!("config {} unusable, using defaults: {e}", path.display())),
        ),
    }
}

