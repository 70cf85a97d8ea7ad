// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Events the runtime sends back to native listeners, and their typed form.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::codec;
use crate::error::{BridgeError, Result};
use crate::types::{Event, EventBody};

pub const CONFERENCE_WILL_JOIN: &str = "CONFERENCE_WILL_JOIN";
pub const CONFERENCE_JOINED: &str = "CONFERENCE_JOINED";
pub const CONFERENCE_TERMINATED: &str = "CONFERENCE_TERMINATED";
pub const XMPP_RESULT: &str = "XMPP_RESULT";
pub const COMMAND_VALUE: &str = "COMMAND_VALUE";
pub const UNDEFINED_JITSI_ERROR: &str = "UNDEFINED_JITSI_ERROR";
pub const SWIPE_EVENT: &str = "SWIPE_EVENT";
pub const SHOP_BUTTON_EVENT: &str = "SHOP_BUTTON_EVENT";
pub const ENTER_PICTURE_IN_PICTURE: &str = "ENTER_PICTURE_IN_PICTURE";
pub const PARTICIPANT_JOINED: &str = "PARTICIPANT_JOINED";
pub const PARTICIPANT_LEFT: &str = "PARTICIPANT_LEFT";
pub const LOCAL_STATS_EVENT: &str = "LOCAL_STATS_EVENT";

/// Every event name a view delegate can receive.
pub const VIEW_EVENTS: &[&str] = &[
    CONFERENCE_WILL_JOIN,
    CONFERENCE_JOINED,
    CONFERENCE_TERMINATED,
    XMPP_RESULT,
    COMMAND_VALUE,
    UNDEFINED_JITSI_ERROR,
    SWIPE_EVENT,
    SHOP_BUTTON_EVENT,
    ENTER_PICTURE_IN_PICTURE,
    PARTICIPANT_JOINED,
    PARTICIPANT_LEFT,
    LOCAL_STATS_EVENT,
];

/// Result type reported after the signaling connection is established.
pub const CONNECTION_CONSTANTS: &str = "connection_constants";

/// Typed view of an [`Event`] addressed to the view delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ConferenceWillJoin { url: String },
    ConferenceJoined { url: String, user_id: Option<String> },
    /// `error` is opaque: its values belong to the conference library.
    ConferenceTerminated { url: String, error: Option<Value> },
    XmppResult { result_type: String, value: Value },
    CommandValue { value: String },
    UndefinedJitsiError { error_message: String },
    Swipe { index: u32, total: u32 },
    ShopButton { navigation_target: String },
    EnterPictureInPicture,
    ParticipantJoined { user_id: String },
    ParticipantLeft { user_id: String },
    /// Connectivity statistics of the local participant, already rendered
    /// as text by the runtime.
    LocalStats { stats: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlBody {
    url: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct XmppResultBody {
    #[serde(rename = "type", alias = "resultType")]
    result_type: String,
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_message: String,
}

#[derive(Deserialize)]
struct SwipeBody {
    index: u32,
    total: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShopBody {
    navigation_target: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserBody {
    user_id: String,
}

#[derive(Deserialize)]
struct StatsBody {
    stats: String,
}

#[derive(Deserialize)]
struct CommandValueBody {
    value: String,
}

fn body_as<T: for<'de> Deserialize<'de>>(event: &Event) -> Result<T> {
    serde_json::from_value(Value::Object(event.body.clone())).map_err(|e| {
        let text = codec::encode(&event.body).unwrap_or_default();
        BridgeError::payload(text, format!("{} body: {e}", event.name))
    })
}

impl ViewEvent {
    /// Decode an event.  `Ok(None)` means the event is not addressed to the
    /// view; a body that does not match its name is a decode error.
    pub fn from_event(event: &Event) -> Result<Option<Self>> {
        let typed = match event.name.as_str() {
            CONFERENCE_WILL_JOIN => {
                let body: UrlBody = body_as(event)?;
                Self::ConferenceWillJoin { url: body.url }
            }
            CONFERENCE_JOINED => {
                let body: UrlBody = body_as(event)?;
                Self::ConferenceJoined {
                    url: body.url,
                    user_id: body.user_id,
                }
            }
            CONFERENCE_TERMINATED => {
                let body: UrlBody = body_as(event)?;
                Self::ConferenceTerminated {
                    url: body.url,
                    error: body.error,
                }
            }
            XMPP_RESULT => {
                let body: XmppResultBody = body_as(event)?;
                Self::XmppResult {
                    result_type: body.result_type,
                    value: body.value,
                }
            }
            COMMAND_VALUE => {
                let body: CommandValueBody = body_as(event)?;
                Self::CommandValue { value: body.value }
            }
            UNDEFINED_JITSI_ERROR => {
                let body: ErrorBody = body_as(event)?;
                Self::UndefinedJitsiError {
                    error_message: body.error_message,
                }
            }
            SWIPE_EVENT => {
                let body: SwipeBody = body_as(event)?;
                Self::Swipe {
                    index: body.index,
                    total: body.total,
                }
            }
            SHOP_BUTTON_EVENT => {
                let body: ShopBody = body_as(event)?;
                Self::ShopButton {
                    navigation_target: body.navigation_target,
                }
            }
            ENTER_PICTURE_IN_PICTURE => Self::EnterPictureInPicture,
            PARTICIPANT_JOINED => {
                let body: UserBody = body_as(event)?;
                Self::ParticipantJoined {
                    user_id: body.user_id,
                }
            }
            PARTICIPANT_LEFT => {
                let body: UserBody = body_as(event)?;
                Self::ParticipantLeft {
                    user_id: body.user_id,
                }
            }
            LOCAL_STATS_EVENT => {
                let body: StatsBody = body_as(event)?;
                Self::LocalStats { stats: body.stats }
            }
            _ => return Ok(None),
        };
        Ok(Some(typed))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ConferenceWillJoin { .. } => CONFERENCE_WILL_JOIN,
            Self::ConferenceJoined { .. } => CONFERENCE_JOINED,
            Self::ConferenceTerminated { .. } => CONFERENCE_TERMINATED,
            Self::XmppResult { .. } => XMPP_RESULT,
            Self::CommandValue { .. } => COMMAND_VALUE,
            Self::UndefinedJitsiError { .. } => UNDEFINED_JITSI_ERROR,
            Self::Swipe { .. } => SWIPE_EVENT,
            Self::ShopButton { .. } => SHOP_BUTTON_EVENT,
            Self::EnterPictureInPicture => ENTER_PICTURE_IN_PICTURE,
            Self::ParticipantJoined { .. } => PARTICIPANT_JOINED,
            Self::ParticipantLeft { .. } => PARTICIPANT_LEFT,
            Self::LocalStats { .. } => LOCAL_STATS_EVENT,
        }
    }

    /// Build the untyped event.  Optional fields are left out when absent,
    /// so a graceful termination carries no `error` key at all.
    pub fn into_event(self) -> Event {
        let name = self.name();
        let body = match self {
            Self::ConferenceWillJoin { url } => json!({ "url": url }),
            Self::ConferenceJoined { url, user_id } => {
                let mut body = json!({ "url": url });
                if let Some(user_id) = user_id {
                    body["userId"] = Value::String(user_id);
                }
                body
            }
            Self::ConferenceTerminated { url, error } => {
                let mut body = json!({ "url": url });
                if let Some(error) = error {
                    body["error"] = error;
                }
                body
            }
            Self::XmppResult { result_type, value } => {
                json!({ "type": result_type, "value": value })
            }
            Self::CommandValue { value } => json!({ "value": value }),
            Self::UndefinedJitsiError { error_message } => json!({ "errorMessage": error_message }),
            Self::Swipe { index, total } => json!({ "index": index, "total": total }),
            Self::ShopButton { navigation_target } => {
                json!({ "navigationTarget": navigation_target })
            }
            Self::EnterPictureInPicture => json!({}),
            Self::ParticipantJoined { user_id } | Self::ParticipantLeft { user_id } => {
                json!({ "userId": user_id })
            }
            Self::LocalStats { stats } => json!({ "stats": stats }),
        };

        let body = match body {
            Value::Object(map) => map,
            _ => EventBody::new(),
        };
        Event::new(name, body)
    }
}
