// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Versioned bridge method names and their typed payloads.
//
// On the wire every call is a `MethodCall` with JSON-text params.  Inside the
// crates a call is a `BridgeMethod`, one variant per function name, decoded
// once at the boundary.

use serde_json::Value;

use crate::codec;
use crate::error::{BridgeError, Result};
use crate::types::{
    BridgeRole, CallKind, Command, ConferenceOptions, Countdown, JoinConference, MethodCall,
    MuteMedia, PlaceholderData, UserAvatar,
};

/// Prefix shared by every versioned name.
pub const NAMESPACE: &str = "org.jitsi.meet:features/";
pub const XMPP_NAMESPACE: &str = "org.jitsi.meet:features/xmpp-bridge#";
pub const VIDEOCONF_NAMESPACE: &str = "org.jitsi.meet:features/videoconf-bridge#";

// -- Signaling bridge --
pub const XMPP_POST_METHOD: &str = "org.jitsi.meet:features/xmpp-bridge#xmpp-post-method";
pub const XMPP_GET_METHOD: &str = "org.jitsi.meet:features/xmpp-bridge#xmpp-get-method";
pub const XMPP_CONNECT: &str = "org.jitsi.meet:features/xmpp-bridge#xmpp-connect";
pub const XMPP_DISCONNECT: &str = "org.jitsi.meet:features/xmpp-bridge#xmpp-disconnect";

// -- Video-conference bridge --
pub const JOIN_CONFERENCE: &str = "org.jitsi.meet:features/videoconf-bridge#join-conference";
pub const LEAVE_CONFERENCE: &str = "org.jitsi.meet:features/videoconf-bridge#leave-conference";
pub const MUTE_MEDIA: &str = "org.jitsi.meet:features/videoconf-bridge#mute-media";
pub const SWITCH_CAMERA: &str = "org.jitsi.meet:features/videoconf-bridge#switch-camera";
pub const SEND_COMMAND: &str = "org.jitsi.meet:features/videoconf-bridge#send-command";
pub const REMOVE_COMMAND: &str = "org.jitsi.meet:features/videoconf-bridge#remove-command";
pub const ADD_COMMAND_LISTENER: &str =
    "org.jitsi.meet:features/videoconf-bridge#add-command-listener";
pub const SHOW_SPEAKER_VIEW: &str = "org.jitsi.meet:features/videoconf-bridge#show-speaker-view";
pub const SEND_PLACEHOLDER_DATA: &str =
    "org.jitsi.meet:features/videoconf-bridge#send-placeholder-data";
pub const SET_CURRENT_SWIPER_INDEX: &str =
    "org.jitsi.meet:features/videoconf-bridge#set-current-swiper-index";
pub const SHOW_WRAP_UP_BUTTONS: &str =
    "org.jitsi.meet:features/videoconf-bridge#show-wrap-up-buttons";
pub const SET_COUNTDOWN: &str = "org.jitsi.meet:features/videoconf-bridge#set-countdown";
pub const UPDATE_USER_AVATAR: &str = "org.jitsi.meet:features/videoconf-bridge#update-user-avatar";
pub const MUTE_VIDEO_CONFERENCE_AUDIO: &str =
    "org.jitsi.meet:features/videoconf-bridge#mute-video-conference-audio";
pub const ENTER_PICTURE_IN_PICTURE: &str =
    "org.jitsi.meet:features/videoconf-bridge#enter-picture-in-picture";

/// Channels the signaling bridge publishes on.
pub const XMPP_CHANNELS: &[&str] = &[
    XMPP_POST_METHOD,
    XMPP_GET_METHOD,
    XMPP_CONNECT,
    XMPP_DISCONNECT,
];

/// Channels the video-conference bridge publishes on.
pub const VIDEOCONF_CHANNELS: &[&str] = &[
    JOIN_CONFERENCE,
    LEAVE_CONFERENCE,
    MUTE_MEDIA,
    SWITCH_CAMERA,
    SEND_COMMAND,
    REMOVE_COMMAND,
    ADD_COMMAND_LISTENER,
    SHOW_SPEAKER_VIEW,
    SEND_PLACEHOLDER_DATA,
    SET_CURRENT_SWIPER_INDEX,
    SHOW_WRAP_UP_BUTTONS,
    SET_COUNTDOWN,
    UPDATE_USER_AVATAR,
    MUTE_VIDEO_CONFERENCE_AUDIO,
    ENTER_PICTURE_IN_PICTURE,
];

/// Params text for methods without arguments.
pub const NO_PARAMS: &str = "null";

/// Whether a function name belongs to the versioned bridge table.
pub fn is_versioned(function_name: &str) -> bool {
    function_name.starts_with(NAMESPACE)
}

/// A free-form call on the signaling connection, or on one of its plugins.
#[derive(Debug, Clone, PartialEq)]
pub struct XmppInvocation {
    pub kind: CallKind,
    pub function_name: String,
    pub params: Vec<Value>,
    pub plugin: Option<String>,
}

/// Every call the native side can make, with its arguments typed.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeMethod {
    Xmpp(XmppInvocation),
    XmppConnect(ConferenceOptions),
    XmppDisconnect,
    JoinConference(JoinConference),
    LeaveConference,
    MuteMedia(MuteMedia),
    SwitchCamera,
    SendCommand(Command),
    RemoveCommand(String),
    AddCommandListener(String),
    ShowSpeakerView(bool),
    SendPlaceholderData(PlaceholderData),
    SetCurrentSwiperIndex(u32),
    ShowWrapUpButtons,
    SetCountdown(Countdown),
    UpdateUserAvatar(UserAvatar),
    MuteVideoConferenceAudio(bool),
    EnterPictureInPicture,
}

impl BridgeMethod {
    /// The function name this method travels under.
    pub fn function_name(&self) -> &str {
        match self {
            Self::Xmpp(inv) => &inv.function_name,
            Self::XmppConnect(_) => XMPP_CONNECT,
            Self::XmppDisconnect => XMPP_DISCONNECT,
            Self::JoinConference(_) => JOIN_CONFERENCE,
            Self::LeaveConference => LEAVE_CONFERENCE,
            Self::MuteMedia(_) => MUTE_MEDIA,
            Self::SwitchCamera => SWITCH_CAMERA,
            Self::SendCommand(_) => SEND_COMMAND,
            Self::RemoveCommand(_) => REMOVE_COMMAND,
            Self::AddCommandListener(_) => ADD_COMMAND_LISTENER,
            Self::ShowSpeakerView(_) => SHOW_SPEAKER_VIEW,
            Self::SendPlaceholderData(_) => SEND_PLACEHOLDER_DATA,
            Self::SetCurrentSwiperIndex(_) => SET_CURRENT_SWIPER_INDEX,
            Self::ShowWrapUpButtons => SHOW_WRAP_UP_BUTTONS,
            Self::SetCountdown(_) => SET_COUNTDOWN,
            Self::UpdateUserAvatar(_) => UPDATE_USER_AVATAR,
            Self::MuteVideoConferenceAudio(_) => MUTE_VIDEO_CONFERENCE_AUDIO,
            Self::EnterPictureInPicture => ENTER_PICTURE_IN_PICTURE,
        }
    }

    /// Only free-form XMPP calls can be GETs; everything else is a POST.
    pub fn kind(&self) -> CallKind {
        match self {
            Self::Xmpp(inv) => inv.kind,
            _ => CallKind::Post,
        }
    }

    pub fn role(&self) -> BridgeRole {
        BridgeRole::for_function(self.function_name())
    }

    /// Serialize into the untyped wire form.
    pub fn to_call(&self) -> Result<MethodCall> {
        let params = match self {
            Self::Xmpp(inv) => codec::encode_params(&inv.params)?,
            Self::XmppConnect(options) => codec::encode(options)?,
            Self::JoinConference(join) => codec::encode(join)?,
            Self::MuteMedia(mute) => codec::encode(mute)?,
            Self::SendCommand(command) => codec::encode(command)?,
            Self::RemoveCommand(name) | Self::AddCommandListener(name) => codec::encode(name)?,
            Self::ShowSpeakerView(flag) | Self::MuteVideoConferenceAudio(flag) => {
                codec::encode(flag)?
            }
            Self::SendPlaceholderData(data) => codec::encode(data)?,
            Self::SetCurrentSwiperIndex(index) => codec::encode(index)?,
            Self::SetCountdown(countdown) => codec::encode(countdown)?,
            Self::UpdateUserAvatar(avatar) => codec::encode(avatar)?,
            Self::XmppDisconnect
            | Self::LeaveConference
            | Self::SwitchCamera
            | Self::ShowWrapUpButtons
            | Self::EnterPictureInPicture => NO_PARAMS.to_owned(),
        };

        let plugin = match self {
            Self::Xmpp(inv) => inv.plugin.as_deref(),
            _ => None,
        };

        Ok(MethodCall::new(self.kind(), self.function_name(), params, plugin))
    }

    /// Decode the wire form.  Unknown versioned names and malformed params
    /// are errors; free-form names are XMPP invocations.
    ///
    /// Versioned names have no plugin handler, so a call that names one is a
    /// routing miss rather than a call on the default session.
    pub fn from_call(call: &MethodCall) -> Result<Self> {
        let name = call.function_name.as_str();
        if !is_versioned(name) {
            return Ok(Self::Xmpp(XmppInvocation {
                kind: call.kind,
                function_name: name.to_owned(),
                params: call.positional_params()?,
                plugin: call.plugin.clone(),
            }));
        }
        if let Some(plugin) = &call.plugin {
            return Err(BridgeError::RoutingMiss {
                plugin: plugin.clone(),
            });
        }

        let text = call.params.as_str();
        let method = match name {
            XMPP_CONNECT => Self::XmppConnect(decode_or_default(text)?),
            XMPP_DISCONNECT => Self::XmppDisconnect,
            JOIN_CONFERENCE => Self::JoinConference(decode_join(text)?),
            LEAVE_CONFERENCE => Self::LeaveConference,
            MUTE_MEDIA => Self::MuteMedia(codec::decode(text)?),
            SWITCH_CAMERA => Self::SwitchCamera,
            SEND_COMMAND => Self::SendCommand(codec::decode(text)?),
            REMOVE_COMMAND => Self::RemoveCommand(codec::decode(text)?),
            ADD_COMMAND_LISTENER => Self::AddCommandListener(codec::decode(text)?),
            SHOW_SPEAKER_VIEW => Self::ShowSpeakerView(codec::decode(text)?),
            SEND_PLACEHOLDER_DATA => Self::SendPlaceholderData(codec::decode(text)?),
            SET_CURRENT_SWIPER_INDEX => Self::SetCurrentSwiperIndex(decode_index(text)?),
            SHOW_WRAP_UP_BUTTONS => Self::ShowWrapUpButtons,
            SET_COUNTDOWN => Self::SetCountdown(codec::decode(text)?),
            UPDATE_USER_AVATAR => Self::UpdateUserAvatar(codec::decode(text)?),
            MUTE_VIDEO_CONFERENCE_AUDIO => Self::MuteVideoConferenceAudio(codec::decode(text)?),
            ENTER_PICTURE_IN_PICTURE => Self::EnterPictureInPicture,
            _ => return Err(BridgeError::UnknownMethod(name.to_owned())),
        };
        Ok(method)
    }
}

fn decode_or_default(text: &str) -> Result<ConferenceOptions> {
    if text.trim().is_empty() || text.trim() == NO_PARAMS {
        return Ok(ConferenceOptions::default());
    }
    codec::decode(text)
}

/// A join payload is either the full object or just the room name.
pub fn decode_join(text: &str) -> Result<JoinConference> {
    match codec::decode_value(text)? {
        Value::String(room) => Ok(JoinConference::new(room)),
        other => serde_json::from_value(other).map_err(|e| BridgeError::payload(text, e)),
    }
}

/// Page numbers arrive either as numbers or as numeric strings.
fn decode_index(text: &str) -> Result<u32> {
    let parsed = match codec::decode_value(text)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| BridgeError::payload(text, "expected a non-negative page index"))
}
