// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conference view: the surface a host UI embeds.
//
// Host calls go out through the sub-bridges.  Events come back through the
// emitter on any thread; the view captures its delegate at that moment and
// posts the event to the UI context, where the session is updated and the
// delegate called.  With no delegate attached the event only updates the
// session and is otherwise dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use confbridge_bridge::{EventEmitter, EventInterest, EventListener, ListenerId};
use confbridge_bridge::{VideoConfBridge, XmppBridge};
use confbridge_core::codec;
use confbridge_core::error::{BridgeError, Result};
use confbridge_core::events::VIEW_EVENTS;
use confbridge_core::methods;
use confbridge_core::types::{
    Command, ConferenceOptions, Countdown, Event, JoinConference, MediaKind, MuteMedia,
    PlaceholderData, UserAvatar,
};
use confbridge_core::ViewEvent;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::delegate::{self, ViewDelegate};
use crate::session::{ConferenceState, Session, Trigger};
use crate::ui::UiHandle;

type DelegateRef = Weak<dyn ViewDelegate>;

#[derive(Default)]
struct Shared {
    session: Mutex<Session>,
    delegate: Mutex<Option<DelegateRef>>,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delegate(&self) -> MutexGuard<'_, Option<DelegateRef>> {
        self.delegate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ViewListener {
    shared: Arc<Shared>,
    ui: UiHandle,
}

impl EventListener for ViewListener {
    fn on_event(&self, event: &Event) {
        let delegate = self.shared.delegate().clone();
        let shared = Arc::clone(&self.shared);
        let event = event.clone();
        self.ui.post(move || deliver(&shared, delegate, &event));
    }
}

/// Runs on the UI context.
fn deliver(shared: &Shared, delegate: Option<DelegateRef>, event: &Event) {
    match ViewEvent::from_event(event) {
        Ok(Some(typed)) => {
            shared.session().observe(&typed);
        }
        Ok(None) => {}
        Err(e) => warn!(event = %event.name, error = %e, "undecodable view event"),
    }

    match delegate.and_then(|d| d.upgrade()) {
        Some(delegate) => {
            delegate::dispatch(delegate.as_ref(), event);
        }
        None => debug!(event = %event.name, "no delegate, event discarded"),
    }
}

pub struct ConferenceView {
    emitter: Arc<EventEmitter>,
    xmpp: Arc<XmppBridge>,
    video_conf: Arc<VideoConfBridge>,
    shared: Arc<Shared>,
    // Owned here; the emitter only holds it weakly.
    _listener: Arc<ViewListener>,
    listener_id: Mutex<Option<ListenerId>>,
}

impl ConferenceView {
    /// Attach a view to `emitter`.  Events reach the delegate through `ui`.
    pub fn new(
        emitter: Arc<EventEmitter>,
        xmpp: Arc<XmppBridge>,
        video_conf: Arc<VideoConfBridge>,
        ui: UiHandle,
    ) -> Self {
        let shared = Arc::new(Shared::default());
        let listener = Arc::new(ViewListener {
            shared: Arc::clone(&shared),
            ui,
        });
        let interest = EventInterest::names(VIEW_EVENTS.iter().copied());
        let listener_id = emitter.add_listener(interest, &listener);

        Self {
            emitter,
            xmpp,
            video_conf,
            shared,
            _listener: listener,
            listener_id: Mutex::new(Some(listener_id)),
        }
    }

    // -- Delegate ------------------------------------------------------------

    /// Set the delegate.  The view does not keep it alive.
    pub fn set_delegate<D: ViewDelegate + 'static>(&self, delegate: &Arc<D>) {
        let erased: Arc<dyn ViewDelegate> = delegate.clone();
        *self.shared.delegate() = Some(Arc::downgrade(&erased));
    }

    pub fn clear_delegate(&self) {
        *self.shared.delegate() = None;
    }

    // -- Session -------------------------------------------------------------

    pub fn state(&self) -> ConferenceState {
        self.shared.session().state
    }

    pub fn conference_url(&self) -> Option<String> {
        self.shared.session().url.clone()
    }

    /// `error` of the last abnormal termination.
    pub fn last_error(&self) -> Option<Value> {
        self.shared.session().last_error.clone()
    }

    pub fn session(&self) -> Session {
        self.shared.session().clone()
    }

    /// Forget a terminated conference and its error.
    ///
    /// A terminated session is held as `Terminated` until this is called or
    /// the next join starts, so [`ConferenceView::last_error`] stays readable
    /// after `conference_terminated` fires.  Returns false unless the session
    /// was terminated.
    pub fn reset(&self) -> bool {
        self.shared.session().apply(Trigger::Reset)
    }

    /// Connect and join the room named in `options`.
    #[instrument(skip_all, fields(room = options.room.as_deref().unwrap_or("")))]
    pub fn join(&self, options: &ConferenceOptions) -> Result<()> {
        let room = options
            .room
            .as_deref()
            .map(str::trim)
            .filter(|room| !room.is_empty())
            .map(str::to_owned);
        let Some(room) = room else {
            let text = codec::encode(options)?;
            let error = BridgeError::payload(text, "conference options name no room");
            return Err(self.reported(error));
        };

        self.xmpp.connect(options)?;
        self.join_room(JoinConference {
            room,
            audio_muted: options.audio_muted,
            video_muted: options.video_muted,
        })
    }

    pub fn xmpp_connect(&self, options: &ConferenceOptions) -> Result<()> {
        self.xmpp.connect(options)
    }

    /// Join using a JSON payload: either `{"room": ...}` or just the room
    /// name as a JSON string.
    pub fn join_conference(&self, json: &str) -> Result<()> {
        let join = methods::decode_join(json).map_err(|e| self.reported(e))?;
        self.join_room(join)
    }

    fn join_room(&self, join: JoinConference) -> Result<()> {
        self.video_conf.join(join)?;
        self.shared.session().apply(Trigger::Join);
        Ok(())
    }

    /// Leave the conference and drop the signaling connection.
    pub fn leave(&self) -> Result<()> {
        let left = self.leave_conference();
        let disconnected = self.xmpp.disconnect();
        left.and(disconnected)
    }

    /// Leave the conference, keeping the signaling connection.
    #[instrument(skip(self))]
    pub fn leave_conference(&self) -> Result<()> {
        self.shared.session().apply(Trigger::Leave);
        self.video_conf.leave()
    }

    // -- Media ---------------------------------------------------------------

    /// `{"kind": "audioinput" | "videoinput", "muted": bool}`.
    pub fn mute_media(&self, json: &str) -> Result<()> {
        let MuteMedia { kind, muted } = self.decode(json)?;
        self.video_conf.mute_media(kind, muted)
    }

    pub fn set_muted(&self, kind: MediaKind, muted: bool) -> Result<()> {
        self.video_conf.mute_media(kind, muted)
    }

    pub fn switch_camera(&self) -> Result<()> {
        self.video_conf.switch_camera()
    }

    pub fn mute_video_conference_audio(&self, muted: bool) -> Result<()> {
        self.video_conf.mute_video_conference_audio(muted)
    }

    // -- Commands ------------------------------------------------------------

    /// `{"commandName": ..., "value": ...}`.
    pub fn send_jitsi_command(&self, json: &str) -> Result<()> {
        let command: Command = self.decode(json)?;
        self.video_conf.send_command(command)
    }

    pub fn remove_jitsi_command(&self, command_name: &str) -> Result<()> {
        self.video_conf.remove_command(command_name)
    }

    pub fn add_jitsi_command_listener(&self, command_name: &str) -> Result<()> {
        self.video_conf.add_command_listener(command_name)
    }

    // -- UI state ------------------------------------------------------------

    pub fn show_speaker_view(&self, show: bool) -> Result<()> {
        self.video_conf.show_speaker_view(show)
    }

    /// `{"title": ..., "imageUrl": ...}`.
    pub fn send_placeholder_data(&self, json: &str) -> Result<()> {
        let data: PlaceholderData = self.decode(json)?;
        self.video_conf.send_placeholder_data(data)
    }

    /// `index` as the host holds it: decimal text.
    pub fn set_current_swiper_index(&self, index: &str) -> Result<()> {
        let parsed = index
            .trim()
            .parse::<u32>()
            .map_err(|e| self.reported(BridgeError::payload(index, e)))?;
        self.video_conf.set_current_swiper_index(parsed)
    }

    pub fn show_wrap_up_buttons(&self) -> Result<()> {
        self.video_conf.show_wrap_up_buttons()
    }

    /// `{"fromDate": "YYYY/MM/DD hh:mm", "toDate": ...}`.
    pub fn set_countdown(&self, json: &str) -> Result<()> {
        let countdown: Countdown = self.decode(json)?;
        self.video_conf.set_countdown(countdown)
    }

    /// `{"userId"?: ..., "avatarUrl": ...}`.
    pub fn update_user_avatar(&self, json: &str) -> Result<()> {
        let avatar: UserAvatar = self.decode(json)?;
        self.video_conf.update_user_avatar(avatar)
    }

    /// Request picture-in-picture.  Ignored unless a conference url is known.
    pub fn enter_picture_in_picture(&self) -> Result<()> {
        if self.conference_url().is_none() {
            debug!("no conference url, picture-in-picture not requested");
            return Ok(());
        }
        self.video_conf.enter_picture_in_picture()
    }

    // -- Raw signaling -------------------------------------------------------

    pub fn call_xmpp_post_method(
        &self,
        function_name: &str,
        stringified_params: &str,
        plugin: Option<&str>,
    ) -> Result<()> {
        self.xmpp.call_post_method(function_name, stringified_params, plugin)
    }

    pub fn call_xmpp_get_method(
        &self,
        function_name: &str,
        stringified_params: &str,
        plugin: Option<&str>,
    ) -> Result<()> {
        self.xmpp.call_get_method(function_name, stringified_params, plugin)
    }

    // -- Teardown ------------------------------------------------------------

    /// Stop receiving events.  Idempotent; also runs on drop.
    pub fn dispose(&self) {
        let id = self
            .listener_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = id {
            self.emitter.remove_listener(id);
            self.clear_delegate();
            info!("conference view disposed");
        }
    }

    fn decode<T: DeserializeOwned>(&self, json: &str) -> Result<T> {
        codec::decode(json).map_err(|e| self.reported(e))
    }

    fn reported(&self, error: BridgeError) -> BridgeError {
        self.emitter.report_error(&error);
        error
    }
}

impl Drop for ConferenceView {
    fn drop(&mut self) {
        self.dispose();
    }
}
