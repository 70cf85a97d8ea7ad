// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin router: resolves the optional plugin id of an XMPP call to the
// handler that should run it.
//
// An absent id means the default handler (the connection itself).  A present
// id matches exactly one registered plugin.  A miss is never fatal: it turns
// into the same events a completed call would produce, shaped by the call
// kind.

use std::collections::HashMap;
use std::sync::Arc;

use confbridge_core::codec;
use confbridge_core::error::{BridgeError, Result};
use confbridge_core::events::{UNDEFINED_JITSI_ERROR, XMPP_RESULT};
use confbridge_core::methods::XmppInvocation;
use confbridge_core::types::{CallKind, Event};
use confbridge_core::ViewEvent;
use serde_json::Value;
use tracing::debug;

use crate::traits::PluginHandler;

const DEFAULT_HANDLER: &str = "<default>";

/// Default handler plus named plugin handlers.
#[derive(Clone, Default)]
pub struct PluginRouter {
    default: Option<Arc<dyn PluginHandler>>,
    plugins: HashMap<String, Arc<dyn PluginHandler>>,
}

impl PluginRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default(&mut self, handler: Arc<dyn PluginHandler>) {
        self.default = Some(handler);
    }

    /// Register a plugin, returning the handler it replaced.
    pub fn register(
        &mut self,
        plugin: impl Into<String>,
        handler: Arc<dyn PluginHandler>,
    ) -> Option<Arc<dyn PluginHandler>> {
        self.plugins.insert(plugin.into(), handler)
    }

    pub fn unregister(&mut self, plugin: &str) -> bool {
        self.plugins.remove(plugin).is_some()
    }

    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    /// The handler for `plugin`, or the default handler when `None`.
    pub fn resolve(&self, plugin: Option<&str>) -> Result<Arc<dyn PluginHandler>> {
        let handler = match plugin {
            Some(name) => self.plugins.get(name),
            None => self.default.as_ref(),
        };
        handler.cloned().ok_or_else(|| BridgeError::RoutingMiss {
            plugin: plugin.unwrap_or(DEFAULT_HANDLER).to_owned(),
        })
    }

    /// Resolve and run an invocation.
    pub fn route(&self, invocation: &XmppInvocation) -> RouteOutcome {
        let handler = match self.resolve(invocation.plugin.as_deref()) {
            Ok(handler) => handler,
            Err(e) => {
                debug!(function = %invocation.function_name, error = %e, "routing miss");
                return RouteOutcome::Miss(e);
            }
        };

        match handler.invoke(&invocation.function_name, &invocation.params) {
            Ok(value) => RouteOutcome::Completed(value),
            Err(e) => RouteOutcome::Failed(e),
        }
    }
}

/// What happened to a routed call.
#[derive(Debug)]
pub enum RouteOutcome {
    Completed(Value),
    Miss(BridgeError),
    Failed(BridgeError),
}

impl RouteOutcome {
    /// Events reporting the outcome back to native listeners.
    ///
    /// A GET always answers with `XMPP_RESULT` typed by the function name;
    /// its value is `null` when nothing ran.  A POST stays silent unless it
    /// failed, or it missed and `report_misses` is set.
    pub fn into_events(self, invocation: &XmppInvocation, report_misses: bool) -> Vec<Event> {
        let is_get = invocation.kind == CallKind::Get;
        let mut events = Vec::new();

        let error = match self {
            Self::Completed(value) => {
                if is_get {
                    events.push(result_event(invocation, value));
                }
                return events;
            }
            Self::Miss(e) => report_misses.then_some(e),
            Self::Failed(e) => Some(e),
        };

        if let Some(e) = error {
            events.push(Event::new(UNDEFINED_JITSI_ERROR, e.to_event_body()));
        }
        if is_get {
            events.push(result_event(invocation, Value::Null));
        }
        events
    }
}

fn result_event(invocation: &XmppInvocation, value: Value) -> Event {
    let value = codec::stringify_compound(value).unwrap_or(Value::Null);
    ViewEvent::XmppResult {
        result_type: invocation.function_name.clone(),
        value,
    }
    .into_event()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invocation(kind: CallKind, function_name: &str, plugin: Option<&str>) -> XmppInvocation {
        XmppInvocation {
            kind,
            function_name: function_name.into(),
            params: vec![json!("a")],
            plugin: plugin.map(str::to_owned),
        }
    }

    fn router() -> PluginRouter {
        let mut router = PluginRouter::new();
        router.set_default(Arc::new(|name: &str, _: &[Value]| -> Result<Value> {
            Ok(json!(format!("default:{name}")))
        }));
        router.register(
            "roster",
            Arc::new(|_: &str, params: &[Value]| -> Result<Value> { Ok(json!({"items": params})) }),
        );
        router
    }

    #[test]
    fn absent_plugin_uses_default_handler() {
        match router().route(&invocation(CallKind::Get, "getJid", None)) {
            RouteOutcome::Completed(value) => assert_eq!(value, json!("default:getJid")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn named_plugin_matches_exactly() {
        let router = router();
        assert!(router.resolve(Some("roster")).is_ok());
        assert!(matches!(
            router.resolve(Some("Roster")),
            Err(BridgeError::RoutingMiss { plugin }) if plugin == "Roster"
        ));
    }

    #[test]
    fn get_result_is_typed_by_function_name() {
        let inv = invocation(CallKind::Get, "getRoster", Some("roster"));
        let events = router().route(&inv).into_events(&inv, true);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, XMPP_RESULT);
        assert_eq!(events[0].body["type"], json!("getRoster"));
        assert_eq!(events[0].body["value"], json!("{\"items\":[\"a\"]}"));
    }

    #[test]
    fn post_completion_is_silent() {
        let inv = invocation(CallKind::Post, "sendIQ", None);
        assert!(router().route(&inv).into_events(&inv, true).is_empty());
    }

    #[test]
    fn get_miss_reports_null_value() {
        let inv = invocation(CallKind::Get, "getJid", Some("nope"));
        let events = router().route(&inv).into_events(&inv, false);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, XMPP_RESULT);
        assert_eq!(events[0].body["value"], Value::Null);
    }

    #[test]
    fn post_miss_reports_error_only_when_enabled() {
        let inv = invocation(CallKind::Post, "sendIQ", Some("nope"));
        let quiet = router().route(&inv).into_events(&inv, false);
        assert!(quiet.is_empty());

        let loud = router().route(&inv).into_events(&inv, true);
        assert_eq!(loud.len(), 1);
        assert_eq!(loud[0].name, UNDEFINED_JITSI_ERROR);
    }

    #[test]
    fn failed_get_reports_error_then_null_result() {
        let mut router = PluginRouter::new();
        router.set_default(Arc::new(|_: &str, _: &[Value]| -> Result<Value> {
            Err(BridgeError::RuntimeReported("boom".into()))
        }));
        let inv = invocation(CallKind::Get, "getJid", None);
        let names: Vec<String> = router
            .route(&inv)
            .into_events(&inv, false)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec![UNDEFINED_JITSI_ERROR.to_owned(), XMPP_RESULT.to_owned()]);
    }
}
