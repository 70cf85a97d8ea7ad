// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The UI scheduling context.
//
// Events are produced on whatever thread the runtime happens to use.  They
// are posted here as tasks and run, in posting order, by whoever owns the
// `UiLoop`: a tokio task in the app, or a test calling `run_pending`.

use tokio::sync::mpsc;
use tracing::{debug, trace};

type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Create a connected handle/loop pair.
pub fn ui_context() -> (UiHandle, UiLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiHandle { tx }, UiLoop { rx })
}

/// Posts work onto the UI context.  Cheap to clone; usable from any thread.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiTask>,
}

impl UiHandle {
    /// Queue `task`.  Returns false when the loop is gone and the task was
    /// dropped.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        let posted = self.tx.send(Box::new(task)).is_ok();
        if !posted {
            debug!("UI loop gone, task dropped");
        }
        posted
    }
}

/// Owner side of the UI context.
pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl UiLoop {
    /// Run tasks until every `UiHandle` has been dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
        debug!("UI loop finished");
    }

    /// Run whatever is queued right now on the calling thread.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        trace!(ran, "ran pending UI tasks");
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn tasks_run_in_posting_order() {
        let (ui, mut ui_loop) = ui_context();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let seen = seen.clone();
            assert!(ui.post(move || seen.lock().expect("seen").push(i)));
        }
        assert_eq!(ui_loop.run_pending(), 3);
        assert_eq!(*seen.lock().expect("seen"), vec![0, 1, 2]);
        assert_eq!(ui_loop.run_pending(), 0);
    }

    #[test]
    fn posting_after_loop_is_gone_fails() {
        let (ui, ui_loop) = ui_context();
        drop(ui_loop);
        assert!(!ui.post(|| {}));
    }

    #[tokio::test]
    async fn run_drains_until_handles_drop() {
        let (ui, ui_loop) = ui_context();
        let seen = Arc::new(Mutex::new(0));
        let task = tokio::spawn(ui_loop.run());

        let from_thread = {
            let ui = ui.clone();
            let seen = seen.clone();
            std::thread::spawn(move || {
                ui.post(move || *seen.lock().expect("seen") += 1);
            })
        };
        from_thread.join().expect("producer thread");
        drop(ui);

        task.await.expect("ui loop");
        assert_eq!(*seen.lock().expect("seen"), 1);
    }
}
