// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Video-conference sub-bridge.
//
// Each command serializes its typed arguments and goes out through the
// emitter under a fixed versioned function name.  The bridge mirrors the
// commands it has sent.  The mirror is informational: commands can also reach
// the runtime through the raw post path, so removals are always forwarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use confbridge_core::BridgeMethod;
use confbridge_core::error::Result;
use confbridge_core::methods::VIDEOCONF_CHANNELS;
use confbridge_core::types::{
    BridgeId, BridgeRole, Command, CommandSet, Countdown, Event, EventBody, JoinConference,
    MediaKind, MethodCall, MuteMedia, PlaceholderData, UserAvatar,
};
use tracing::{debug, instrument};

use crate::base::BridgeBase;
use crate::emitter::EventEmitter;
use crate::traits::{ScriptRuntime, SubBridge};

pub struct VideoConfBridge {
    base: BridgeBase,
    commands: Mutex<CommandSet>,
}

impl VideoConfBridge {
    /// Create the bridge and register it with `emitter`.
    pub fn new(emitter: Arc<EventEmitter>, runtime: Arc<dyn ScriptRuntime>) -> Arc<Self> {
        let bridge = Arc::new(Self {
            base: BridgeBase::new(BridgeRole::VideoConf, emitter, runtime),
            commands: Mutex::new(CommandSet::new()),
        });
        bridge.base.emitter().register_video_conf_bridge(&bridge);
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

    fn commands_guard(&self) -> MutexGuard<'_, CommandSet> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn call(&self, method: BridgeMethod) -> Result<()> {
        self.base.emitter().call_method(&method)
    }

    // -- Session -------------------------------------------------------------

    /// Join a room.  Commands from any previous session are forgotten.
    #[instrument(skip(self), fields(room = %join.room))]
    pub fn join(&self, join: JoinConference) -> Result<()> {
        self.commands_guard().clear();
        self.call(BridgeMethod::JoinConference(join))
    }

    /// Leave the room, keeping the signaling connection open.
    #[instrument(skip(self))]
    pub fn leave(&self) -> Result<()> {
        self.commands_guard().clear();
        self.call(BridgeMethod::LeaveConference)
    }

    // -- Media ---------------------------------------------------------------

    pub fn mute_media(&self, kind: MediaKind, muted: bool) -> Result<()> {
        self.call(BridgeMethod::MuteMedia(MuteMedia { kind, muted }))
    }

    pub fn switch_camera(&self) -> Result<()> {
        self.call(BridgeMethod::SwitchCamera)
    }

    /// Silence every remote participant locally.
    pub fn mute_video_conference_audio(&self, muted: bool) -> Result<()> {
        self.call(BridgeMethod::MuteVideoConferenceAudio(muted))
    }

    // -- Presence commands ---------------------------------------------------

    /// Attach a command to the session.  Last writer wins per name.
    #[instrument(skip(self, command), fields(command = %command.name))]
    pub fn send_command(&self, command: Command) -> Result<()> {
        self.commands_guard().upsert(command.clone());
        self.call(BridgeMethod::SendCommand(command))
    }

    /// Detach a command.  Always forwarded; the runtime ignores names it
    /// does not hold.
    #[instrument(skip(self))]
    pub fn remove_command(&self, name: &str) -> Result<()> {
        if self.commands_guard().remove(name).is_none() {
            debug!("command not sent through this bridge");
        }
        self.call(BridgeMethod::RemoveCommand(name.to_owned()))
    }

    /// Ask for `COMMAND_VALUE` events whenever `name` changes.
    pub fn add_command_listener(&self, name: &str) -> Result<()> {
        self.call(BridgeMethod::AddCommandListener(name.to_owned()))
    }

    /// Commands this bridge has attached and not yet removed.
    pub fn commands(&self) -> CommandSet {
        self.commands_guard().clone()
    }

    // -- UI state ------------------------------------------------------------

    pub fn show_speaker_view(&self, show: bool) -> Result<()> {
        self.call(BridgeMethod::ShowSpeakerView(show))
    }

    pub fn send_placeholder_data(&self, data: PlaceholderData) -> Result<()> {
        self.call(BridgeMethod::SendPlaceholderData(data))
    }

    pub fn set_current_swiper_index(&self, index: u32) -> Result<()> {
        self.call(BridgeMethod::SetCurrentSwiperIndex(index))
    }

    pub fn show_wrap_up_buttons(&self) -> Result<()> {
        self.call(BridgeMethod::ShowWrapUpButtons)
    }

    pub fn set_countdown(&self, countdown: Countdown) -> Result<()> {
        self.call(BridgeMethod::SetCountdown(countdown))
    }

    pub fn update_user_avatar(&self, avatar: UserAvatar) -> Result<()> {
        self.call(BridgeMethod::UpdateUserAvatar(avatar))
    }

    pub fn enter_picture_in_picture(&self) -> Result<()> {
        self.call(BridgeMethod::EnterPictureInPicture)
    }

    // -- Runtime side --------------------------------------------------------

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

impl SubBridge for VideoConfBridge {
    fn id(&self) -> BridgeId {
        self.base.id()
    }

    fn role(&self) -> BridgeRole {
        BridgeRole::VideoConf
    }

    fn supported_events(&self) -> &'static [&'static str] {
        VIDEOCONF_CHANNELS
    }

    fn forward(&self, call: MethodCall) -> Result<()> {
        self.base.deliver(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use confbridge_core::methods::{
        JOIN_CONFERENCE, MUTE_MEDIA, REMOVE_COMMAND, SEND_COMMAND, SET_COUNTDOWN,
    };
    use serde_json::json;

    #[derive(Default)]
    struct CapturingRuntime {
        calls: Mutex<Vec<MethodCall>>,
    }

    impl CapturingRuntime {
        fn names(&self) -> Vec<String> {
            self.calls
                .lock()
                .expect("calls")
                .iter()
                .map(|c| c.function_name.clone())
                .collect()
        }
    }

    impl ScriptRuntime for CapturingRuntime {
        fn name(&self) -> &str {
            "capturing"
        }

        fn deliver(&self, call: MethodCall) -> Result<()> {
            self.calls.lock().expect("calls").push(call);
            Ok(())
        }
    }

    fn setup() -> (Arc<CapturingRuntime>, Arc<VideoConfBridge>) {
        let emitter = Arc::new(EventEmitter::new());
        let runtime = Arc::new(CapturingRuntime::default());
        let bridge = VideoConfBridge::new(emitter, runtime.clone());
        bridge.start_observing();
        (runtime, bridge)
    }

    #[test]
    fn mute_forwards_exact_payload_once() {
        let (runtime, bridge) = setup();
        bridge.mute_media(MediaKind::AudioInput, true).expect("mute");

        let calls = runtime.calls.lock().expect("calls");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function_name, MUTE_MEDIA);
        assert_eq!(calls[0].params, r#"{"kind":"audioinput","muted":true}"#);
    }

    #[test]
    fn removing_unsent_command_is_still_forwarded() {
        let (runtime, bridge) = setup();
        bridge.remove_command("hand").expect("first remove");
        bridge.remove_command("hand").expect("second remove");
        assert_eq!(runtime.names(), vec![REMOVE_COMMAND, REMOVE_COMMAND]);
        assert!(runtime.calls.lock().expect("calls").iter().all(|c| c.params == "\"hand\""));
        assert!(bridge.commands().is_empty());
    }

    #[test]
    fn last_command_value_wins() {
        let (runtime, bridge) = setup();
        bridge.send_command(Command::new("hand", json!(1))).expect("send v1");
        bridge.send_command(Command::new("hand", json!(2))).expect("send v2");

        let commands = bridge.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands.get("hand"), Some(&json!(2)));

        bridge.remove_command("hand").expect("remove");
        assert!(bridge.commands().is_empty());
        assert_eq!(runtime.names(), vec![SEND_COMMAND, SEND_COMMAND, REMOVE_COMMAND]);
    }

    #[test]
    fn joining_forgets_previous_commands() {
        let (runtime, bridge) = setup();
        bridge.send_command(Command::new("stats", json!({"a": 1}))).expect("send");
        bridge.join(JoinConference::new("test")).expect("join");
        assert!(bridge.commands().is_empty());
        assert_eq!(runtime.names().last().map(String::as_str), Some(JOIN_CONFERENCE));
    }

    #[test]
    fn countdown_travels_in_slash_format() {
        let (runtime, bridge) = setup();
        let countdown: Countdown =
            serde_json::from_str(r#"{"fromDate":"2026/10/18 09:00","toDate":"2026/10/18 09:30"}"#)
                .expect("countdown");
        bridge.set_countdown(countdown).expect("countdown");

        let calls = runtime.calls.lock().expect("calls");
        assert_eq!(calls[0].function_name, SET_COUNTDOWN);
        assert_eq!(
            calls[0].params,
            r#"{"fromDate":"2026/10/18 09:00","toDate":"2026/10/18 09:30"}"#
        );
    }
}
