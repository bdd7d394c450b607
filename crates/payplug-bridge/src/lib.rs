// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payplug: command bridge over callback-driven payment provider SDKs.
//
// `Bridge` takes named commands with loosely-typed arguments, routes them to
// the card, redirect wallet or in-app authorization adapters, and resolves
// each request exactly once through a `PendingResponse`. The provider SDK is
// reached through the traits in `traits`; desktop/CI builds link the
// simulator in `sim`.

pub mod card;
pub mod completion;
pub mod decode;
pub mod dispatch;
pub mod resume;
pub mod session;
pub mod sim;
pub mod traits;
pub mod wallet;

use std::sync::Arc;

pub use completion::{PendingResponse, Response};
pub use dispatch::Bridge;
pub use resume::ResumeOutcome;

/// The provider SDK for this build.
///
/// Only the simulator is linked here; a host embedding a vendor SDK passes its
/// own `ProviderSdk` to `Bridge::new` instead.
pub fn provider_sdk() -> Arc<dyn traits::ProviderSdk> {
    Arc::new(sim::SimulatedSdk::new())
}
