// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confbridge: runtime bridge plumbing.
//
// The event emitter is the hub: native callers push method calls through it
// into the scripting runtime, and the runtime pushes events back out through
// the sub-bridges to every interested listener.  On desktop/CI builds the
// runtime is the in-process `SimulatedRuntime`.

pub mod base;
pub mod emitter;
pub mod loopback;
pub mod router;
pub mod traits;
pub mod videoconf;
pub mod xmpp;

pub use emitter::{EventEmitter, ListenerId};
pub use loopback::SimulatedRuntime;
pub use router::PluginRouter;
pub use traits::{EventInterest, EventListener, PluginHandler, ScriptRuntime, SubBridge};
pub use videoconf::VideoConfBridge;
pub use xmpp::XmppBridge;
