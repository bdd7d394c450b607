// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payplug core: types, errors and result encoding shared across all crates.

pub mod authorization;
pub mod config;
pub mod encoding;
pub mod error;
pub mod types;

pub use config::{BridgeConfig, SessionConflictPolicy};
pub use error::{BridgeError, ValidationErrors};
pub use types::*;
