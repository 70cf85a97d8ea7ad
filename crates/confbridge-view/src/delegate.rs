// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// View delegate: the host UI's listener surface.

use confbridge_core::events::{
    COMMAND_VALUE, CONFERENCE_JOINED, CONFERENCE_TERMINATED, CONFERENCE_WILL_JOIN,
    ENTER_PICTURE_IN_PICTURE, LOCAL_STATS_EVENT, PARTICIPANT_JOINED, PARTICIPANT_LEFT,
    SHOP_BUTTON_EVENT, SWIPE_EVENT, UNDEFINED_JITSI_ERROR, XMPP_RESULT,
};
use confbridge_core::types::{Event, EventBody};
use tracing::trace;

/// Conference callbacks.  Each receives the event body as a map of named
/// fields; implement only the ones you care about.
#[allow(unused_variables)]
pub trait ViewDelegate: Send + Sync {
    /// `url`, optional `userId`.
    fn conference_joined(&self, data: &EventBody) {}

    /// `url`.
    fn conference_will_join(&self, data: &EventBody) {}

    /// `url`, and `error` when the conference ended abnormally.
    fn conference_terminated(&self, data: &EventBody) {}

    /// `type`, `value`.
    fn xmpp_result(&self, data: &EventBody) {}

    /// `value`: the command as JSON text.
    fn command_value(&self, data: &EventBody) {}

    /// `errorMessage`.
    fn undefined_jitsi_error(&self, data: &EventBody) {}

    /// `index`, `total`.
    fn swipe_event(&self, data: &EventBody) {}

    /// `navigationTarget`.
    fn shop_button_event(&self, data: &EventBody) {}

    fn enter_picture_in_picture(&self, data: &EventBody) {}

    /// `userId`.
    fn participant_joined(&self, data: &EventBody) {}

    /// `userId`.
    fn participant_left(&self, data: &EventBody) {}

    /// `stats`: connectivity statistics as text.
    fn local_stats_event(&self, data: &EventBody) {}
}

/// Invoke the callback matching `event`.  Returns false for events the
/// delegate has no callback for.
pub fn dispatch(delegate: &dyn ViewDelegate, event: &Event) -> bool {
    let data = &event.body;
    match event.name.as_str() {
        CONFERENCE_JOINED => delegate.conference_joined(data),
        CONFERENCE_WILL_JOIN => delegate.conference_will_join(data),
        CONFERENCE_TERMINATED => delegate.conference_terminated(data),
        XMPP_RESULT => delegate.xmpp_result(data),
        COMMAND_VALUE => delegate.command_value(data),
        UNDEFINED_JITSI_ERROR => delegate.undefined_jitsi_error(data),
        SWIPE_EVENT => delegate.swipe_event(data),
        SHOP_BUTTON_EVENT => delegate.shop_button_event(data),
        ENTER_PICTURE_IN_PICTURE => delegate.enter_picture_in_picture(data),
        PARTICIPANT_JOINED => delegate.participant_joined(data),
        PARTICIPANT_LEFT => delegate.participant_left(data),
        LOCAL_STATS_EVENT => delegate.local_stats_event(data),
        other => {
            trace!(event = other, "no delegate callback");
            return false;
        }
    }
    true
}
