// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confbridge: native-side conference bridge
//
// Entry point. Initialises logging, loads configuration, wires the bridge
// services and runs a scripted session in the room named on the command line
// (default "lobby").

mod demo;
mod services;

use std::sync::Arc;

use confbridge_view::ui_context;

use demo::LoggingDelegate;
use services::app_services::{self, AppServices};
use services::data_dir;

#[tokio::main]
async fn main() {
    let config_path = data_dir::config_path();
    let (config, config_warning) = app_services::load_config(&config_path);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!(config = %config_path.display(), "Confbridge starting");
    if let Some(warning) = config_warning {
        tracing::warn!("{warning}");
    }

    let room = std::env::args().nth(1).unwrap_or_else(|| "lobby".to_owned());
    let svc = AppServices::init(config);

    // The UI context runs on its own task; events from the runtime are
    // marshaled onto it.
    let (ui, ui_loop) = ui_context();
    let ui_task = tokio::spawn(ui_loop.run());

    let delegate = Arc::new(LoggingDelegate::default());
    let view = svc.open_view(ui);
    view.set_delegate(&delegate);

    if let Err(e) = demo::run_session(&svc, &view, &room).await {
        tracing::error!(error = %e, "session script failed");
    }

    // Dropping the view detaches it and closes the UI context.
    drop(view);
    if let Err(e) = ui_task.await {
        tracing::error!(error = %e, "UI loop panicked");
    }

    tracing::info!(callbacks = delegate.received(), "Confbridge finished");
}
