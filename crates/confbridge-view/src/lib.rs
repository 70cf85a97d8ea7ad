// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confbridge: the host-facing conference view.
//
// `ConferenceView` is what a host UI embeds: it drives the sub-bridges,
// tracks the conference session, and hands every event to its delegate on
// the UI scheduling context.

pub mod delegate;
pub mod session;
pub mod ui;
pub mod view;

pub use delegate::ViewDelegate;
pub use session::{ConferenceState, Session};
pub use ui::{UiHandle, UiLoop, ui_context};
pub use view::ConferenceView;
