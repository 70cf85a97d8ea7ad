// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conference session state machine.
//
//   Idle ──join──▶ Joining ──joined──▶ Joined
//     ▲               │                  │
//     └──reset── Terminated ◀──terminated / leave──┘
//
// Terminated is held until the host resets or joins again, so the outcome
// stays readable after the callback.  A new join from Terminated passes
// through Idle.

use confbridge_core::ViewEvent;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConferenceState {
    #[default]
    Idle,
    Joining,
    Joined,
    Terminated,
}

/// What moves the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The host asked to join.
    Join,
    /// `CONFERENCE_WILL_JOIN`.
    WillJoin,
    /// `CONFERENCE_JOINED`.
    Joined,
    /// `CONFERENCE_TERMINATED`.
    Terminated,
    /// The host asked to leave.
    Leave,
    /// Back to idle after termination, forgetting its error.
    Reset,
}

impl ConferenceState {
    /// The next state, or `None` when `trigger` does not apply here.
    pub fn next(self, trigger: Trigger) -> Option<Self> {
        use ConferenceState::*;
        match (self, trigger) {
            (Idle | Terminated, Trigger::Join) => Some(Joining),
            (Idle | Terminated | Joining, Trigger::WillJoin) => Some(Joining),
            (Idle | Joining, Trigger::Joined) => Some(Joined),
            (Joining | Joined, Trigger::Terminated | Trigger::Leave) => Some(Terminated),
            (Terminated, Trigger::Reset) => Some(Idle),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Joining | Self::Joined)
    }
}

/// The session as seen through the delegate surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub state: ConferenceState,
    /// Url of the current conference; cleared once it ends.
    pub url: Option<String>,
    /// `error` of the last abnormal termination.
    pub last_error: Option<Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a trigger.  Returns whether the state changed.
    pub fn apply(&mut self, trigger: Trigger) -> bool {
        let Some(next) = self.state.next(trigger) else {
            debug!(state = ?self.state, ?trigger, "trigger ignored");
            return false;
        };
        debug!(from = ?self.state, to = ?next, ?trigger, "session transition");
        if self.state == ConferenceState::Terminated {
            self.last_error = None;
        }
        if next == ConferenceState::Terminated {
            self.url = None;
        }
        self.state = next;
        true
    }

    /// Track a conference event.  Events that say nothing about the session
    /// leave it alone.
    pub fn observe(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::ConferenceWillJoin { url } => {
                if self.apply(Trigger::WillJoin) {
                    self.url = Some(url.clone());
                }
            }
            ViewEvent::ConferenceJoined { url, .. } => {
                if self.apply(Trigger::Joined) {
                    self.url = Some(url.clone());
                }
            }
            ViewEvent::ConferenceTerminated { error, .. } => {
                self.apply(Trigger::Terminated);
                if error.is_some() {
                    self.last_error = error.clone();
                }
            }
            _ => {}
        }
    }
}
