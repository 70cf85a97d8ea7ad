// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted conference session: drives a view through a full join, in-call
// and leave cycle against the simulated runtime, logging every delegate
// callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, Utc};
use confbridge_core::error::Result;
use confbridge_core::types::{ConferenceOptions, EventBody, UserInfo};
use confbridge_view::{ConferenceView, ViewDelegate};
use serde_json::{Value, json};
use tokio::task::yield_now;
use tracing::{info, warn};

use crate::services::app_services::AppServices;

const COUNTDOWN_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Logs every callback and counts them.
#[derive(Default)]
pub struct LoggingDelegate {
    received: AtomicUsize,
}

impl LoggingDelegate {
    pub fn received(&self) -> usize {
        self.received.load(Ordering::Relaxed)
    }

    fn log(&self, callback: &str, data: &EventBody) {
        self.received.fetch_add(1, Ordering::Relaxed);
        let data = Value::Object(data.clone());
        info!(callback, data = %data, "delegate");
    }
}

impl ViewDelegate for LoggingDelegate {
    fn conference_joined(&self, data: &EventBody) {
        self.log("conference_joined", data);
    }

    fn conference_will_join(&self, data: &EventBody) {
        self.log("conference_will_join", data);
    }

    fn conference_terminated(&self, data: &EventBody) {
        self.log("conference_terminated", data);
    }

    fn xmpp_result(&self, data: &EventBody) {
        self.log("xmpp_result", data);
    }

    fn command_value(&self, data: &EventBody) {
        self.log("command_value", data);
    }

    fn undefined_jitsi_error(&self, data: &EventBody) {
        self.received.fetch_add(1, Ordering::Relaxed);
        let data = Value::Object(data.clone());
        warn!(data = %data, "delegate: undefined_jitsi_error");
    }

    fn swipe_event(&self, data: &EventBody) {
        self.log("swipe_event", data);
    }

    fn shop_button_event(&self, data: &EventBody) {
        self.log("shop_button_event", data);
    }

    fn enter_picture_in_picture(&self, data: &EventBody) {
        self.log("enter_picture_in_picture", data);
    }

    fn participant_joined(&self, data: &EventBody) {
        self.log("participant_joined", data);
    }

    fn participant_left(&self, data: &EventBody) {
        self.log("participant_left", data);
    }

    fn local_stats_event(&self, data: &EventBody) {
        self.log("local_stats_event", data);
    }
}

/// Run the scripted session in `room`.
pub async fn run_session(svc: &AppServices, view: &ConferenceView, room: &str) -> Result<()> {
    let runtime = &svc.runtime;
    runtime.register_plugin(
        "muc",
        Arc::new(|function_name: &str, _: &[Value]| -> Result<Value> {
            match function_name {
                "getOccupants" => Ok(json!(["alice@meet.local", "bob@meet.local"])),
                _ => Ok(Value::Null),
            }
        }),
    );

    let options = ConferenceOptions {
        server_url: svc.config.server_url.clone(),
        user_info: Some(UserInfo {
            display_name: Some("Confbridge demo".into()),
            ..UserInfo::default()
        }),
        ..ConferenceOptions::for_room(room)
    };
    view.join(&options)?;
    yield_now().await;

    view.call_xmpp_get_method("getOccupants", "[]", Some("muc"))?;
    view.call_xmpp_get_method("getJid", "[]", None)?;
    view.mute_media(r#"{"kind":"audioinput","muted":true}"#)?;
    view.switch_camera()?;
    yield_now().await;

    view.add_jitsi_command_listener("raise-hand")?;
    view.send_jitsi_command(r#"{"commandName":"raise-hand","value":true}"#)?;
    runtime.participant_joined("alice@meet.local");
    runtime.report_local_stats(json!({"rtt": 40, "bitrate": {"upload": 128}}).to_string());
    view.set_current_swiper_index("1")?;
    runtime.swipe(2)?;
    yield_now().await;

    let start = Utc::now().naive_utc();
    let countdown = json!({
        "fromDate": start.format(COUNTDOWN_FORMAT).to_string(),
        "toDate": (start + Duration::minutes(15)).format(COUNTDOWN_FORMAT).to_string(),
    });
    view.set_countdown(&countdown.to_string())?;
    view.show_speaker_view(true)?;
    view.enter_picture_in_picture()?;
    runtime.press_shop_button("merch");
    yield_now().await;

    view.remove_jitsi_command("raise-hand")?;
    runtime.participant_left("alice@meet.local");
    view.leave()?;
    yield_now().await;

    let delivered = runtime.delivered().len();
    info!(delivered, state = ?view.state(), "session script complete");
    Ok(())
}
