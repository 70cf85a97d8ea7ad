// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confbridge: Core types, wire names and error definitions shared across all
// crates.

pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod methods;
pub mod types;

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use events::ViewEvent;
pub use methods::BridgeMethod;
pub use types::*;
