// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process runtime for desktop/CI builds where no scripting engine is
// embedded.
//
// It plays the runtime's side of the protocol: decodes every delivered call,
// keeps the conference and presence state a real runtime would keep, and
// answers through the sub-bridges with the same events.  Nothing touches the
// network.  Every delivered call is recorded for inspection.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use confbridge_core::codec;
use confbridge_core::config::{BridgeConfig, room_url};
use confbridge_core::error::{BridgeError, Result};
use confbridge_core::events::{CONNECTION_CONSTANTS, UNDEFINED_JITSI_ERROR};
use confbridge_core::types::{
    BridgeRole, CameraFacing, Command, CommandSet, Countdown, Event, JoinConference, MediaKind,
    MethodCall, MuteMedia, PlaceholderData,
};
use confbridge_core::{BridgeMethod, ViewEvent};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::emitter::EventEmitter;
use crate::router::PluginRouter;
use crate::traits::{PluginHandler, ScriptRuntime};
use crate::videoconf::VideoConfBridge;
use crate::xmpp::XmppBridge;

/// Pages in the simulated in-focus swiper.
pub const SWIPER_PAGES: u32 = 3;

/// User id avatars are filed under when the update names nobody.
pub const LOCAL_USER: &str = "local";

/// A call as the runtime received it.
#[derive(Debug, Clone)]
pub struct DeliveredCall {
    pub call: MethodCall,
    pub received_at: DateTime<Utc>,
}

/// Local media as the simulated conference sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaState {
    pub audio_muted: bool,
    pub video_muted: bool,
    pub camera: CameraFacing,
    pub conference_audio_muted: bool,
}

/// Snapshot of everything the simulated runtime tracks.
#[derive(Debug, Clone, Default)]
pub struct SimulatedState {
    pub jid: Option<String>,
    pub server_url: Option<String>,
    /// Where the signaling connection points: the room named at connect, or
    /// the last conference joined over it.
    pub location_url: Option<String>,
    /// Whether a conference was joined over the current connection.
    pub conference_attached: bool,
    pub conference_url: Option<String>,
    pub presence: CommandSet,
    pub command_listeners: BTreeSet<String>,
    pub participants: BTreeSet<String>,
    pub media: MediaState,
    pub swiper_index: u32,
    pub speaker_view: bool,
    pub wrap_up_buttons: bool,
    pub placeholder: Option<PlaceholderData>,
    pub countdown: Option<Countdown>,
    pub avatars: BTreeMap<String, String>,
}

#[derive(Default)]
struct Inner {
    state: SimulatedState,
    router: PluginRouter,
    delivered: Vec<DeliveredCall>,
    xmpp: Weak<XmppBridge>,
    video_conf: Weak<VideoConfBridge>,
}

type Emission = (BridgeRole, Event);

pub struct SimulatedRuntime {
    config: BridgeConfig,
    inner: Mutex<Inner>,
}

impl SimulatedRuntime {
    /// A disconnected runtime whose default handler is the simulated
    /// connection.
    pub fn new(config: BridgeConfig) -> Arc<Self> {
        Arc::new_cyclic(|runtime| {
            let mut router = PluginRouter::new();
            router.set_default(Arc::new(ConnectionHandler {
                runtime: runtime.clone(),
            }));
            Self {
                config,
                inner: Mutex::new(Inner {
                    router,
                    ..Inner::default()
                }),
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create both sub-bridges on `emitter` and start observing them.
    pub fn install(
        self: &Arc<Self>,
        emitter: &Arc<EventEmitter>,
    ) -> (Arc<XmppBridge>, Arc<VideoConfBridge>) {
        let runtime: Arc<dyn ScriptRuntime> = self.clone();
        let xmpp = XmppBridge::new(emitter.clone(), runtime.clone());
        let video_conf = VideoConfBridge::new(emitter.clone(), runtime);
        {
            let mut inner = self.lock();
            inner.xmpp = Arc::downgrade(&xmpp);
            inner.video_conf = Arc::downgrade(&video_conf);
        }
        xmpp.start_observing();
        video_conf.start_observing();
        info!(runtime = self.name(), "simulated runtime installed");
        (xmpp, video_conf)
    }

    pub fn register_plugin(&self, plugin: impl Into<String>, handler: Arc<dyn PluginHandler>) {
        let plugin = plugin.into();
        debug!(%plugin, "plugin registered");
        self.lock().router.register(plugin, handler);
    }

    pub fn unregister_plugin(&self, plugin: &str) -> bool {
        self.lock().router.unregister(plugin)
    }

    pub fn set_default_handler(&self, handler: Arc<dyn PluginHandler>) {
        self.lock().router.set_default(handler);
    }

    // -- Inspection ----------------------------------------------------------

    pub fn delivered(&self) -> Vec<DeliveredCall> {
        self.lock().delivered.clone()
    }

    /// Delivered calls with the given function name.
    pub fn delivered_named(&self, function_name: &str) -> Vec<MethodCall> {
        self.lock()
            .delivered
            .iter()
            .filter(|d| d.call.function_name == function_name)
            .map(|d| d.call.clone())
            .collect()
    }

    pub fn state(&self) -> SimulatedState {
        self.lock().state.clone()
    }

    // -- Things the conference does on its own -------------------------------

    /// End the current conference with an error.  Returns false when there
    /// is no conference.
    pub fn fail_conference(&self, error: Value) -> bool {
        let url = end_conference(&mut self.lock().state);
        let Some(url) = url else {
            return false;
        };
        warn!(%url, %error, "conference failed");
        self.emit(vec![conference(ViewEvent::ConferenceTerminated {
            url,
            error: Some(error),
        })]);
        true
    }

    /// The signaling connection failed for good.  Ends the conference, or
    /// the join still in progress, with `error`.  Returns false when the
    /// connection pointed nowhere.
    pub fn fail_connection(&self, error: Value) -> bool {
        let url = {
            let mut inner = self.lock();
            let state = &mut inner.state;
            state.jid = None;
            state.conference_attached = false;
            let location = state.location_url.take();
            end_conference(state).or(location)
        };
        let Some(url) = url else {
            debug!(%error, "connection failed with nothing to terminate");
            return false;
        };
        warn!(%url, %error, "connection failed");
        self.emit(vec![conference(ViewEvent::ConferenceTerminated {
            url,
            error: Some(error),
        })]);
        true
    }

    /// Periodic connectivity statistics for the local participant.
    pub fn report_local_stats(&self, stats: impl Into<String>) {
        self.emit(vec![conference(ViewEvent::LocalStats {
            stats: stats.into(),
        })]);
    }

    pub fn report_error(&self, message: impl Into<String>) {
        let error = BridgeError::RuntimeReported(message.into());
        self.emit(vec![(
            BridgeRole::VideoConf,
            Event::new(UNDEFINED_JITSI_ERROR, error.to_event_body()),
        )]);
    }

    /// The user swiped the in-focus view to `index`.
    pub fn swipe(&self, index: u32) -> Result<()> {
        let emission = self.set_swiper_index(index)?;
        self.emit(vec![emission]);
        Ok(())
    }

    pub fn press_shop_button(&self, navigation_target: impl Into<String>) {
        self.emit(vec![conference(ViewEvent::ShopButton {
            navigation_target: navigation_target.into(),
        })]);
    }

    pub fn participant_joined(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.lock().state.participants.insert(user_id.clone());
        self.emit(vec![conference(ViewEvent::ParticipantJoined { user_id })]);
    }

    pub fn participant_left(&self, user_id: &str) -> bool {
        if !self.lock().state.participants.remove(user_id) {
            return false;
        }
        self.emit(vec![conference(ViewEvent::ParticipantLeft {
            user_id: user_id.to_owned(),
        })]);
        true
    }

    /// A remote participant changed a presence command.
    pub fn remote_command(&self, command: Command) -> Result<()> {
        let emission = {
            let mut inner = self.lock();
            command_changed(&mut inner.state, command)?
        };
        self.emit(emission.into_iter().collect());
        Ok(())
    }

    /// An unsolicited result from the signaling connection, such as an
    /// incoming chat message.
    pub fn push_xmpp_result(&self, result_type: impl Into<String>, value: Value) -> Result<()> {
        let event = ViewEvent::XmppResult {
            result_type: result_type.into(),
            value: codec::stringify_compound(value)?,
        };
        self.emit(vec![(BridgeRole::Xmpp, event.into_event())]);
        Ok(())
    }

    // -- Call handling -------------------------------------------------------

    fn handle(&self, method: BridgeMethod) -> Result<Vec<Emission>> {
        if let BridgeMethod::Xmpp(invocation) = method {
            let router = self.lock().router.clone();
            let events = router
                .route(&invocation)
                .into_events(&invocation, self.config.report_routing_misses);
            return Ok(events.into_iter().map(|e| (BridgeRole::Xmpp, e)).collect());
        }

        if let BridgeMethod::SetCurrentSwiperIndex(index) = method {
            return Ok(vec![self.set_swiper_index(index)?]);
        }

        let mut inner = self.lock();
        let state = &mut inner.state;
        let mut out = Vec::new();

        match method {
            BridgeMethod::XmppConnect(options) => {
                let jid = self.config.simulated_jid.clone();
                state.jid = Some(jid.clone());
                state.conference_attached = false;
                let server = options.server_url.as_deref().or(self.config.server_url.as_deref());
                state.location_url = options.room.as_deref().map(|room| room_url(server, room));
                state.server_url = options.server_url;
                info!(%jid, "connected");
                let value = codec::stringify_compound(json!({ "jid": jid }))?;
                out.push((
                    BridgeRole::Xmpp,
                    ViewEvent::XmppResult {
                        result_type: CONNECTION_CONSTANTS.into(),
                        value,
                    }
                    .into_event(),
                ));
            }
            BridgeMethod::XmppDisconnect => {
                state.jid = None;
                let location = state.location_url.take();
                let attached = std::mem::take(&mut state.conference_attached);
                match end_conference(state) {
                    Some(url) => out.push(terminated(url)),
                    // Nothing joined over this connection: the join it was
                    // opened for ends here.
                    None if !attached => out.extend(location.map(terminated)),
                    None => {}
                }
                info!("disconnected");
            }
            BridgeMethod::JoinConference(join) => {
                out.extend(self.join(state, join)?);
            }
            BridgeMethod::LeaveConference => match end_conference(state) {
                Some(url) => out.push(terminated(url)),
                None => debug!("leave without a conference"),
            },
            BridgeMethod::MuteMedia(MuteMedia { kind, muted }) => match kind {
                MediaKind::AudioInput => state.media.audio_muted = muted,
                MediaKind::VideoInput => state.media.video_muted = muted,
            },
            BridgeMethod::SwitchCamera => {
                state.media.camera = state.media.camera.switched();
            }
            BridgeMethod::SendCommand(command) => {
                out.extend(command_changed(state, command)?);
            }
            BridgeMethod::RemoveCommand(name) => {
                state.presence.remove(&name);
            }
            BridgeMethod::AddCommandListener(name) => {
                state.command_listeners.insert(name);
            }
            BridgeMethod::ShowSpeakerView(show) => state.speaker_view = show,
            BridgeMethod::SendPlaceholderData(data) => state.placeholder = Some(data),
            BridgeMethod::ShowWrapUpButtons => state.wrap_up_buttons = true,
            BridgeMethod::SetCountdown(countdown) => {
                if countdown.minutes() < 0 {
                    return Err(BridgeError::RuntimeReported(
                        "countdown target is before its start".into(),
                    ));
                }
                state.countdown = Some(countdown);
            }
            BridgeMethod::UpdateUserAvatar(avatar) => {
                let user = avatar.user_id.unwrap_or_else(|| LOCAL_USER.to_owned());
                state.avatars.insert(user, avatar.avatar_url);
            }
            BridgeMethod::MuteVideoConferenceAudio(muted) => {
                state.media.conference_audio_muted = muted;
            }
            BridgeMethod::EnterPictureInPicture => {
                if state.conference_url.is_some() {
                    out.push(conference(ViewEvent::EnterPictureInPicture));
                } else {
                    debug!("picture-in-picture requested without a conference");
                }
            }
            BridgeMethod::Xmpp(_) | BridgeMethod::SetCurrentSwiperIndex(_) => {}
        }
        Ok(out)
    }

    fn join(&self, state: &mut SimulatedState, join: JoinConference) -> Result<Vec<Emission>> {
        let room = join.room.trim();
        if room.is_empty() {
            return Err(BridgeError::RuntimeReported(
                "cannot join a conference without a room name".into(),
            ));
        }

        let mut out = Vec::new();
        if let Some(previous) = end_conference(state) {
            out.push(terminated(previous));
        }

        let server = state.server_url.as_deref().or(self.config.server_url.as_deref());
        let url = room_url(server, room);
        info!(%url, "joining conference");
        state.conference_url = Some(url.clone());
        if state.jid.is_some() {
            state.location_url = Some(url.clone());
            state.conference_attached = true;
        }
        state.media.audio_muted = join.audio_muted;
        state.media.video_muted = join.video_muted;

        out.push(conference(ViewEvent::ConferenceWillJoin { url: url.clone() }));
        out.push(conference(ViewEvent::ConferenceJoined { url, user_id: None }));
        Ok(out)
    }

    fn set_swiper_index(&self, index: u32) -> Result<Emission> {
        if index >= SWIPER_PAGES {
            return Err(BridgeError::RuntimeReported(format!(
                "swiper index {index} is out of range (0..{SWIPER_PAGES})"
            )));
        }
        self.lock().state.swiper_index = index;
        Ok(conference(ViewEvent::Swipe {
            index,
            total: SWIPER_PAGES,
        }))
    }

    /// Publish events through the bridge owning each one.
    fn emit(&self, emissions: Vec<Emission>) {
        if emissions.is_empty() {
            return;
        }
        let (xmpp, video_conf) = {
            let inner = self.lock();
            (inner.xmpp.upgrade(), inner.video_conf.upgrade())
        };

        for (role, event) in emissions {
            let name = event.name.clone();
            let sent = match role {
                BridgeRole::Xmpp => xmpp.as_ref().map(|bridge| bridge.send_event(event)),
                BridgeRole::VideoConf => video_conf.as_ref().map(|bridge| bridge.send_event(event)),
            };
            if sent.is_none() {
                warn!(%role, event = %name, "bridge gone, runtime event dropped");
            }
        }
    }
}

impl ScriptRuntime for SimulatedRuntime {
    fn name(&self) -> &str {
        "simulated"
    }

    #[instrument(skip_all, fields(function = %call.function_name))]
    fn deliver(&self, call: MethodCall) -> Result<()> {
        self.lock().delivered.push(DeliveredCall {
            call: call.clone(),
            received_at: Utc::now(),
        });
        let method = BridgeMethod::from_call(&call)?;
        let emissions = self.handle(method)?;
        self.emit(emissions);
        Ok(())
    }
}

fn conference(event: ViewEvent) -> Emission {
    (BridgeRole::VideoConf, event.into_event())
}

fn terminated(url: String) -> Emission {
    conference(ViewEvent::ConferenceTerminated { url, error: None })
}

/// Tear down the conference state, returning the url that was active.
fn end_conference(state: &mut SimulatedState) -> Option<String> {
    let url = state.conference_url.take()?;
    state.presence.clear();
    state.command_listeners.clear();
    state.participants.clear();
    Some(url)
}

fn command_changed(state: &mut SimulatedState, command: Command) -> Result<Option<Emission>> {
    let listened = state.command_listeners.contains(&command.name);
    let value = if listened { Some(codec::encode(&command)?) } else { None };
    state.presence.upsert(command);
    Ok(value.map(|value| conference(ViewEvent::CommandValue { value })))
}

/// The signaling connection as the default plugin handler.
struct ConnectionHandler {
    runtime: Weak<SimulatedRuntime>,
}

impl PluginHandler for ConnectionHandler {
    fn invoke(&self, function_name: &str, _params: &[Value]) -> Result<Value> {
        let runtime = self
            .runtime
            .upgrade()
            .ok_or_else(|| BridgeError::RuntimeReported("runtime shut down".into()))?;
        let jid = runtime.lock().state.jid.clone();

        match function_name {
            "isConnected" => Ok(Value::Bool(jid.is_some())),
            "getJid" => Ok(jid.map(Value::String).unwrap_or(Value::Null)),
            _ if jid.is_none() => Err(BridgeError::RuntimeReported(format!(
                "{function_name}: not connected"
            ))),
            _ => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confbridge_core::events::{
        COMMAND_VALUE, CONFERENCE_JOINED, CONFERENCE_TERMINATED, CONFERENCE_WILL_JOIN,
        ENTER_PICTURE_IN_PICTURE, LOCAL_STATS_EVENT, XMPP_RESULT,
    };
    use confbridge_core::methods::{MUTE_MEDIA, REMOVE_COMMAND, SEND_COMMAND};
    use confbridge_core::types::{ConferenceOptions, EventBody};

    use crate::traits::{EventInterest, EventListener};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().expect("events"))
        }
    }

    impl EventListener for Recorder {
        fn on_event(&self, event: &Event) {
            self.events.lock().expect("events").push(event.clone());
        }
    }

    struct Harness {
        runtime: Arc<SimulatedRuntime>,
        xmpp: Arc<XmppBridge>,
        video_conf: Arc<VideoConfBridge>,
        recorder: Arc<Recorder>,
        emitter: Arc<EventEmitter>,
    }

    fn harness(config: BridgeConfig) -> Harness {
        let emitter = Arc::new(EventEmitter::new());
        let runtime = SimulatedRuntime::new(config);
        let (xmpp, video_conf) = runtime.install(&emitter);
        let recorder = Arc::new(Recorder::default());
        emitter.add_listener(EventInterest::All, &recorder);
        Harness {
            runtime,
            xmpp,
            video_conf,
            recorder,
            emitter,
        }
    }

    fn body(value: Value) -> EventBody {
        value.as_object().cloned().expect("object")
    }

    fn names(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn join_reports_will_join_then_joined() {
        let h = harness(BridgeConfig::default());
        h.video_conf.join(JoinConference::new("test")).expect("join");

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![CONFERENCE_WILL_JOIN, CONFERENCE_JOINED]);
        assert_eq!(events[0].body, body(json!({"url": "test"})));
        assert_eq!(events[1].body, body(json!({"url": "test"})));
        assert_eq!(h.runtime.state().conference_url.as_deref(), Some("test"));
    }

    #[test]
    fn conference_url_uses_connected_server() {
        let h = harness(BridgeConfig {
            server_url: Some("https://config.example.org".into()),
            ..Default::default()
        });
        let options = ConferenceOptions {
            server_url: Some("https://meet.example.org/?x=1".into()),
            ..ConferenceOptions::for_room("test")
        };
        h.xmpp.connect(&options).expect("connect");
        h.video_conf.join(JoinConference::new("test")).expect("join");

        assert_eq!(
            h.runtime.state().conference_url.as_deref(),
            Some("https://meet.example.org/test")
        );
    }

    #[test]
    fn rejoining_terminates_the_previous_conference() {
        let h = harness(BridgeConfig::default());
        h.video_conf.join(JoinConference::new("one")).expect("join one");
        h.recorder.take();
        h.video_conf.join(JoinConference::new("two")).expect("join two");

        let events = h.recorder.take();
        assert_eq!(
            names(&events),
            vec![CONFERENCE_TERMINATED, CONFERENCE_WILL_JOIN, CONFERENCE_JOINED]
        );
        assert_eq!(events[0].body, body(json!({"url": "one"})));
    }

    #[test]
    fn empty_room_is_reported_not_joined() {
        let h = harness(BridgeConfig::default());
        let result = h.video_conf.join(JoinConference::new("  "));
        assert!(matches!(result, Err(BridgeError::RuntimeReported(_))));
        assert_eq!(names(&h.recorder.take()), vec![UNDEFINED_JITSI_ERROR]);
        assert!(h.runtime.state().conference_url.is_none());
    }

    #[test]
    fn leave_terminates_without_error_key() {
        let h = harness(BridgeConfig::default());
        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.recorder.take();
        h.video_conf.leave().expect("leave");

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![CONFERENCE_TERMINATED]);
        assert_eq!(events[0].body, body(json!({"url": "test"})));
    }

    #[test]
    fn connect_reports_connection_constants() {
        let h = harness(BridgeConfig::default());
        h.xmpp.connect(&ConferenceOptions::default()).expect("connect");

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![XMPP_RESULT]);
        assert_eq!(events[0].body["type"], json!(CONNECTION_CONSTANTS));
        assert_eq!(
            events[0].body["value"],
            json!("{\"jid\":\"guest@meet.local/confbridge\"}")
        );
    }

    #[test]
    fn get_on_connection_returns_jid() {
        let h = harness(BridgeConfig::default());
        h.xmpp.connect(&ConferenceOptions::default()).expect("connect");
        h.recorder.take();
        h.xmpp.call_get_method("getJid", Vec::<Value>::new(), None).expect("get");

        let events = h.recorder.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].body["type"], json!("getJid"));
        assert_eq!(events[0].body["value"], json!("guest@meet.local/confbridge"));
    }

    #[test]
    fn get_on_unknown_plugin_reports_absence() {
        let h = harness(BridgeConfig::default());
        h.xmpp.call_get_method("getRoster", "[]", Some("roster")).expect("get");

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![UNDEFINED_JITSI_ERROR, XMPP_RESULT]);
        assert_eq!(events[1].body["value"], Value::Null);
    }

    #[test]
    fn post_miss_is_silent_when_not_reported() {
        let h = harness(BridgeConfig {
            report_routing_misses: false,
            ..Default::default()
        });
        h.xmpp.call_post_method("sendIQ", "[]", Some("nope")).expect("post");
        assert!(h.recorder.take().is_empty());
        assert_eq!(h.runtime.delivered().len(), 1);
    }

    #[test]
    fn registered_plugin_handles_its_calls() {
        let h = harness(BridgeConfig::default());
        h.runtime.register_plugin(
            "roster",
            Arc::new(|_: &str, _: &[Value]| -> Result<Value> { Ok(json!(["alice", "bob"])) }),
        );
        h.xmpp.call_get_method("getRoster", "[]", Some("roster")).expect("get");

        let events = h.recorder.take();
        assert_eq!(events[0].body["value"], json!("[\"alice\",\"bob\"]"));
    }

    #[test]
    fn malformed_params_are_dropped_and_reported() {
        let h = harness(BridgeConfig::default());
        let result = h.emitter.call_post_method(MUTE_MEDIA, "{\"kind\":", None);
        assert!(matches!(result, Err(BridgeError::PayloadDecode { .. })));
        assert_eq!(names(&h.recorder.take()), vec![UNDEFINED_JITSI_ERROR]);
        assert_eq!(h.runtime.delivered().len(), 1);
        assert!(!h.runtime.state().media.audio_muted);
    }

    #[test]
    fn listened_command_reports_its_value() {
        let h = harness(BridgeConfig::default());
        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.video_conf.add_command_listener("hand").expect("listen");
        h.recorder.take();

        h.video_conf.send_command(Command::new("hand", json!("up"))).expect("send");
        h.video_conf.send_command(Command::new("mood", json!("ok"))).expect("send");

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![COMMAND_VALUE]);
        assert_eq!(events[0].body["value"], json!("{\"commandName\":\"hand\",\"value\":\"up\"}"));
    }

    #[test]
    fn presence_keeps_only_the_last_value() {
        let h = harness(BridgeConfig::default());
        h.video_conf.send_command(Command::new("hand", json!(1))).expect("v1");
        h.video_conf.send_command(Command::new("hand", json!(2))).expect("v2");
        h.video_conf.remove_command("other").expect("absent");
        h.video_conf.remove_command("other").expect("absent again");

        let presence = h.runtime.state().presence;
        assert_eq!(presence.len(), 1);
        assert_eq!(presence.get("hand"), Some(&json!(2)));
        assert_eq!(h.runtime.delivered_named(REMOVE_COMMAND).len(), 2);
        assert!(h.recorder.take().is_empty());
    }

    #[test]
    fn command_sent_on_the_raw_path_can_be_removed() {
        let h = harness(BridgeConfig::default());
        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.emitter
            .call_post_method(SEND_COMMAND, r#"{"commandName":"hand","value":1}"#, None)
            .expect("raw send");
        assert_eq!(h.runtime.state().presence.get("hand"), Some(&json!(1)));

        h.video_conf.remove_command("hand").expect("remove");
        assert!(h.runtime.state().presence.is_empty());
        assert_eq!(h.runtime.delivered_named(REMOVE_COMMAND).len(), 1);
    }

    #[test]
    fn versioned_call_naming_a_plugin_is_reported_not_applied() {
        let h = harness(BridgeConfig::default());
        let result = h.emitter.call_post_method(
            MUTE_MEDIA,
            r#"{"kind":"audioinput","muted":true}"#,
            Some("no-such-plugin"),
        );
        assert!(matches!(
            result,
            Err(BridgeError::RoutingMiss { plugin }) if plugin == "no-such-plugin"
        ));
        let events = h.recorder.take();
        assert_eq!(names(&events), vec![UNDEFINED_JITSI_ERROR]);
        assert!(!h.runtime.state().media.audio_muted);
    }

    #[test]
    fn media_state_follows_calls() {
        let h = harness(BridgeConfig::default());
        h.video_conf.mute_media(MediaKind::VideoInput, true).expect("mute");
        h.video_conf.switch_camera().expect("switch");
        h.video_conf.mute_video_conference_audio(true).expect("mute all");

        let media = h.runtime.state().media;
        assert!(media.video_muted);
        assert!(!media.audio_muted);
        assert_eq!(media.camera, CameraFacing::Back);
        assert!(media.conference_audio_muted);
    }

    #[test]
    fn swiper_index_is_bounded() {
        let h = harness(BridgeConfig::default());
        h.video_conf.set_current_swiper_index(2).expect("in range");
        assert_eq!(h.recorder.take()[0].body, body(json!({"index": 2, "total": 3})));

        assert!(h.video_conf.set_current_swiper_index(SWIPER_PAGES).is_err());
        assert_eq!(names(&h.recorder.take()), vec![UNDEFINED_JITSI_ERROR]);
        assert_eq!(h.runtime.state().swiper_index, 2);
    }

    #[test]
    fn picture_in_picture_needs_a_conference() {
        let h = harness(BridgeConfig::default());
        h.video_conf.enter_picture_in_picture().expect("pip");
        assert!(h.recorder.take().is_empty());

        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.recorder.take();
        h.video_conf.enter_picture_in_picture().expect("pip");
        assert_eq!(names(&h.recorder.take()), vec![ENTER_PICTURE_IN_PICTURE]);
    }

    #[test]
    fn failed_conference_carries_opaque_error() {
        let h = harness(BridgeConfig::default());
        assert!(!h.runtime.fail_conference(json!("connection.droppedError")));

        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.recorder.take();
        assert!(h.runtime.fail_conference(json!("connection.droppedError")));

        let events = h.recorder.take();
        assert_eq!(
            events[0].body,
            body(json!({"url": "test", "error": "connection.droppedError"}))
        );
    }

    #[test]
    fn connection_failure_before_joining_terminates_with_error() {
        let h = harness(BridgeConfig::default());
        assert!(!h.runtime.fail_connection(json!("connection.otherError")));

        let options = ConferenceOptions {
            server_url: Some("https://meet.example.org".into()),
            ..ConferenceOptions::for_room("test")
        };
        h.xmpp.connect(&options).expect("connect");
        h.recorder.take();
        assert!(h.runtime.fail_connection(json!("connection.otherError")));

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![CONFERENCE_TERMINATED]);
        assert_eq!(
            events[0].body,
            body(json!({"url": "https://meet.example.org/test", "error": "connection.otherError"}))
        );
        let state = h.runtime.state();
        assert!(state.jid.is_none());
        assert!(state.location_url.is_none());
    }

    #[test]
    fn connection_failure_in_conference_ends_it_once() {
        let h = harness(BridgeConfig::default());
        h.xmpp.connect(&ConferenceOptions::for_room("test")).expect("connect");
        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.recorder.take();
        assert!(h.runtime.fail_connection(json!("connection.droppedError")));

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![CONFERENCE_TERMINATED]);
        assert_eq!(events[0].body["error"], json!("connection.droppedError"));
        assert!(h.runtime.state().conference_url.is_none());
    }

    #[test]
    fn disconnect_before_joining_terminates_the_pending_room() {
        let h = harness(BridgeConfig::default());
        h.xmpp.connect(&ConferenceOptions::for_room("test")).expect("connect");
        h.recorder.take();
        h.xmpp.disconnect().expect("disconnect");

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![CONFERENCE_TERMINATED]);
        assert_eq!(events[0].body, body(json!({"url": "test"})));
    }

    #[test]
    fn disconnect_after_leaving_reports_nothing_more() {
        let h = harness(BridgeConfig::default());
        h.xmpp.connect(&ConferenceOptions::for_room("test")).expect("connect");
        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.video_conf.leave().expect("leave");
        h.recorder.take();
        h.xmpp.disconnect().expect("disconnect");
        assert!(h.recorder.take().is_empty());
    }

    #[test]
    fn local_stats_are_reported_as_text() {
        let h = harness(BridgeConfig::default());
        h.runtime.report_local_stats(r#"{"rtt":40}"#);

        let events = h.recorder.take();
        assert_eq!(names(&events), vec![LOCAL_STATS_EVENT]);
        assert_eq!(events[0].body, body(json!({"stats": "{\"rtt\":40}"})));
    }

    #[test]
    fn disconnect_ends_the_conference() {
        let h = harness(BridgeConfig::default());
        h.xmpp.connect(&ConferenceOptions::default()).expect("connect");
        h.video_conf.join(JoinConference::new("test")).expect("join");
        h.recorder.take();
        h.xmpp.disconnect().expect("disconnect");

        assert_eq!(names(&h.recorder.take()), vec![CONFERENCE_TERMINATED]);
        assert!(h.runtime.state().jid.is_none());
    }

    #[test]
    fn events_after_bridge_teardown_are_dropped() {
        let h = harness(BridgeConfig::default());
        let Harness {
            runtime,
            video_conf,
            recorder,
            ..
        } = h;
        drop(video_conf);
        runtime.press_shop_button("shop");
        assert!(recorder.take().is_empty());
    }
}
