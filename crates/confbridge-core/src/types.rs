// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Confbridge runtime bridge.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::codec;
use crate::error::Result;
use crate::methods::{self, VIDEOCONF_NAMESPACE, XMPP_GET_METHOD, XMPP_POST_METHOD};

/// Event payload: string keys mapped to untyped values.
pub type EventBody = Map<String, Value>;

/// Unique identifier for a sub-bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeId(pub Uuid);

impl BridgeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BridgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BridgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a sub-bridge plays.  At most one bridge per role is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BridgeRole {
    /// Signaling channel (XMPP connection and its plugins).
    Xmpp,
    /// Video-conference control (join, mute, commands, UI state).
    VideoConf,
}

impl BridgeRole {
    /// Which bridge a function name is addressed to.
    ///
    /// Everything in the videoconf namespace goes to the video-conference
    /// bridge; all other names (including free-form XMPP connection
    /// functions such as `sendIQ`) travel over the signaling bridge.
    pub fn for_function(function_name: &str) -> Self {
        if function_name.starts_with(VIDEOCONF_NAMESPACE) {
            Self::VideoConf
        } else {
            Self::Xmpp
        }
    }

    /// Name of the native module implementing this role.
    pub fn module_name(&self) -> &'static str {
        match self {
            Self::Xmpp => "XmppBridge",
            Self::VideoConf => "VideoConfBridge",
        }
    }
}

impl std::fmt::Display for BridgeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xmpp => f.write_str("xmpp-bridge"),
            Self::VideoConf => f.write_str("videoconf-bridge"),
        }
    }
}

/// POST mutates, GET requests a result.  Neither blocks: results come back
/// later as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Post,
    Get,
}

/// Positional call arguments before they cross the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CallParams {
    /// Structured values, encoded as a JSON array.
    Values(Vec<Value>),
    /// JSON text produced by the caller, forwarded untouched.
    Stringified(String),
}

impl CallParams {
    /// The JSON text that travels across the boundary.
    pub fn into_text(self) -> Result<String> {
        match self {
            Self::Values(values) => codec::encode_params(&values),
            Self::Stringified(text) => Ok(text),
        }
    }
}

impl From<Vec<Value>> for CallParams {
    fn from(values: Vec<Value>) -> Self {
        Self::Values(values)
    }
}

impl From<String> for CallParams {
    fn from(text: String) -> Self {
        Self::Stringified(text)
    }
}

impl From<&str> for CallParams {
    fn from(text: &str) -> Self {
        Self::Stringified(text.to_owned())
    }
}

/// A method call as it crosses the runtime boundary.
///
/// Parameters are always pre-encoded JSON text so the boundary never needs
/// to understand anything beyond strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    #[serde(skip, default = "default_kind")]
    pub kind: CallKind,
    pub function_name: String,
    #[serde(rename = "stringifiedParams")]
    pub params: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
}

fn default_kind() -> CallKind {
    CallKind::Post
}

impl MethodCall {
    pub fn new(
        kind: CallKind,
        function_name: impl Into<String>,
        params: impl Into<String>,
        plugin: Option<&str>,
    ) -> Self {
        Self {
            kind,
            function_name: function_name.into(),
            params: params.into(),
            plugin: plugin.map(str::to_owned),
        }
    }

    pub fn post(
        function_name: impl Into<String>,
        params: impl Into<String>,
        plugin: Option<&str>,
    ) -> Self {
        Self::new(CallKind::Post, function_name, params, plugin)
    }

    pub fn get(
        function_name: impl Into<String>,
        params: impl Into<String>,
        plugin: Option<&str>,
    ) -> Self {
        Self::new(CallKind::Get, function_name, params, plugin)
    }

    /// Bridge role this call is addressed to.
    pub fn role(&self) -> BridgeRole {
        BridgeRole::for_function(&self.function_name)
    }

    /// The runtime-side event channel the call is published on.
    ///
    /// Versioned bridge methods are their own channel; free-form XMPP
    /// functions are wrapped in the generic post/get channels.
    pub fn channel(&self) -> &str {
        if methods::is_versioned(&self.function_name) {
            &self.function_name
        } else {
            match self.kind {
                CallKind::Post => XMPP_POST_METHOD,
                CallKind::Get => XMPP_GET_METHOD,
            }
        }
    }

    /// Decode the positional parameters of a free-form XMPP call.
    pub fn positional_params(&self) -> Result<Vec<Value>> {
        codec::decode_params(&self.params)
    }
}

/// A one-way notification from the runtime to native listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub body: EventBody,
}

impl Event {
    pub fn new(name: impl Into<String>, body: EventBody) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    /// An event with an empty body.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, EventBody::new())
    }

    /// Decode an event whose body arrived as JSON text.
    pub fn from_json(name: impl Into<String>, body: &str) -> Result<Self> {
        Ok(Self::new(name, codec::decode_body(body)?))
    }
}

/// A presence-style key/value pair attached to a conference session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "commandName", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl Command {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Commands currently attached to a session, keyed by name.
///
/// Adding is last-writer-wins per name; removing an absent name is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSet {
    commands: BTreeMap<String, Value>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a command, returning the value it replaced.
    pub fn upsert(&mut self, command: Command) -> Option<Value> {
        self.commands.insert(command.name, command.value)
    }

    /// Remove a command, returning its last value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.commands.remove(name)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.commands.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ---------------------------------------------------------------------------
// Method payloads
// ---------------------------------------------------------------------------

/// Local user details passed along with connection options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Options for establishing the signaling connection and joining a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
    #[serde(default)]
    pub audio_muted: bool,
    #[serde(default)]
    pub video_muted: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub feature_flags: Map<String, Value>,
}

impl ConferenceOptions {
    /// Options for a room with everything else defaulted.
    pub fn for_room(room: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            ..Self::default()
        }
    }
}

/// Room to join plus the initial mute state of the local media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConference {
    pub room: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub audio_muted: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub video_muted: bool,
}

impl JoinConference {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            audio_muted: false,
            video_muted: false,
        }
    }
}

/// Kind of local media device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "audioinput")]
    AudioInput,
    #[serde(rename = "videoinput")]
    VideoInput,
}

/// Mute or unmute one kind of local media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteMedia {
    pub kind: MediaKind,
    pub muted: bool,
}

/// Which camera is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Front,
    Back,
}

impl CameraFacing {
    pub fn switched(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

/// Placeholder shown in the in-focus view before video arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderData {
    pub title: String,
    pub image_url: String,
}

/// Start and target of the pre-show countdown, in `YYYY/MM/DD hh:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    #[serde(with = "countdown_format")]
    pub from_date: NaiveDateTime,
    #[serde(with = "countdown_format")]
    pub to_date: NaiveDateTime,
}

impl Countdown {
    /// Whole minutes between start and target; negative if reversed.
    pub fn minutes(&self) -> i64 {
        (self.to_date - self.from_date).num_minutes()
    }
}

/// New profile image for a conference participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAvatar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub avatar_url: String,
}

mod countdown_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub const FORMAT: &str = "%Y/%m/%d %H:%M";

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn videoconf_names_route_to_videoconf_bridge() {
        assert_eq!(
            BridgeRole::for_function(methods::MUTE_MEDIA),
            BridgeRole::VideoConf
        );
        assert_eq!(BridgeRole::for_function("sendIQ"), BridgeRole::Xmpp);
        assert_eq!(
            BridgeRole::for_function(methods::XMPP_CONNECT),
            BridgeRole::Xmpp
        );
    }

    #[test]
    fn free_form_calls_use_generic_channels() {
        let post = MethodCall::post("sendIQ", "[]", None);
        let get = MethodCall::get("getJid", "[]", Some("muc"));
        assert_eq!(post.channel(), XMPP_POST_METHOD);
        assert_eq!(get.channel(), XMPP_GET_METHOD);
        assert_eq!((post.kind, get.kind), (CallKind::Post, CallKind::Get));
        assert_eq!(get.plugin.as_deref(), Some("muc"));

        let mute = MethodCall::post(methods::MUTE_MEDIA, "{}", None);
        assert_eq!(mute.channel(), methods::MUTE_MEDIA);
    }

    #[test]
    fn method_call_serializes_to_runtime_shape() {
        let call = MethodCall::post("join", "[\"room\"]", Some("muc"));
        let value = serde_json::to_value(&call).expect("serialize");
        assert_eq!(
            value,
            json!({"functionName": "join", "stringifiedParams": "[\"room\"]", "plugin": "muc"})
        );

        let no_plugin = MethodCall::post("ping", "", None);
        let value = serde_json::to_value(&no_plugin).expect("serialize");
        assert!(value.get("plugin").is_none());
    }

    #[test]
    fn call_params_values_become_json_array() {
        let text = CallParams::from(vec![json!("a"), json!(1)])
            .into_text()
            .expect("encode");
        assert_eq!(text, "[\"a\",1]");

        let text = CallParams::from("[true]").into_text().expect("passthrough");
        assert_eq!(text, "[true]");
    }

    #[test]
    fn command_set_last_writer_wins() {
        let mut set = CommandSet::new();
        assert!(set.upsert(Command::new("hand", json!(1))).is_none());
        assert_eq!(set.upsert(Command::new("hand", json!(2))), Some(json!(1)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("hand"), Some(&json!(2)));
    }

    #[test]
    fn command_set_remove_absent_is_noop() {
        let mut set = CommandSet::new();
        assert!(set.remove("hand").is_none());
        assert!(set.remove("hand").is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn command_accepts_name_alias() {
        let cmd: Command =
            serde_json::from_str(r#"{"name":"stats","value":{"a":1}}"#).expect("decode");
        assert_eq!(cmd.name, "stats");
        let encoded = serde_json::to_value(&cmd).expect("encode");
        assert_eq!(encoded, json!({"commandName": "stats", "value": {"a": 1}}));
    }

    #[test]
    fn mute_media_wire_shape() {
        let mute = MuteMedia {
            kind: MediaKind::AudioInput,
            muted: true,
        };
        assert_eq!(
            serde_json::to_string(&mute).expect("encode"),
            r#"{"kind":"audioinput","muted":true}"#
        );
    }

    #[test]
    fn countdown_uses_slash_format() {
        let countdown: Countdown =
            serde_json::from_str(r#"{"fromDate":"2026/10/18 09:00","toDate":"2026/10/18 09:45"}"#)
                .expect("decode");
        assert_eq!(countdown.minutes(), 45);

        let bad = serde_json::from_str::<Countdown>(r#"{"fromDate":"18-10-2026","toDate":"x"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn join_conference_omits_false_mute_flags() {
        let join = JoinConference::new("test");
        assert_eq!(serde_json::to_string(&join).expect("encode"), r#"{"room":"test"}"#);
    }

    #[test]
    fn camera_switch_toggles() {
        assert_eq!(CameraFacing::Front.switched(), CameraFacing::Back);
        assert_eq!(CameraFacing::Back.switched(), CameraFacing::Front);
    }
}
