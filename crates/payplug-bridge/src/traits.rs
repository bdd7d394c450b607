// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provider SDK boundary.
//
// The vendor SDK (card tokenization, redirect wallets, in-app wallet sheet)
// and the host's presentation layer are external collaborators. These traits
// describe exactly what the bridge needs from them; the host links a real
// implementation, desktop/CI builds use `sim::SimulatedSdk`.

use std::fmt;

use payplug_core::authorization::{
    Cart, ConsumerProfile, MerchantProfile, ReceivedPrime, SessionId,
};
use payplug_core::error::Result;
use payplug_core::{ProviderSetupConfig, WalletKind};

use crate::completion::Completion;

/// What a tokenizing SDK call reports: a prime, no prime, or a
/// `BridgeError::Provider` failure.
pub type TokenOutcome = Result<Option<String>>;

/// Everything the bridge uses from the linked provider SDK.
pub trait ProviderSdk: CardSdk + AuthorizationSdk + PresentationSurface + Send + Sync {
    /// Human-readable platform name (e.g. "iOS 17.4").
    fn platform_name(&self) -> String;

    /// The redirect wallet of the given family.
    fn wallet(&self, kind: WalletKind) -> &dyn RedirectWalletSdk;

    /// Hand credentials and environment to the SDK.
    fn apply_setup(&self, config: &ProviderSetupConfig);
}

/// Card checks and tokenization.
pub trait CardSdk {
    /// Local format checks only; never touches the network.
    fn validate(&self, card: &CardDetails) -> CardCheck;

    /// One network round-trip. `done` must be completed exactly once.
    fn create_token(&self, card: CardDetails, geo_location: &str, done: Completion<TokenOutcome>);
}

/// A wallet that leaves the app and comes back through a return link.
pub trait RedirectWalletSdk: Send + Sync {
    /// Whether the counterpart app is installed/supported. No I/O.
    fn is_available(&self) -> bool;

    /// Fetch a prime. `done` must be completed exactly once.
    fn get_prime(&self, return_url: &str, done: Completion<TokenOutcome>);

    /// Leave the app for the wallet. The outcome never comes back through
    /// this call, only through a later resume notification.
    fn redirect(&self, return_url: &str, payment_url: &str, view: Option<&ViewHandle>) -> Result<()>;
}

/// The in-app wallet payment sheet.
pub trait AuthorizationSdk {
    /// Whether the device can pay with any of the given networks.
    fn can_make_payments(&self, networks: &[String]) -> bool;

    /// Put the payment sheet on screen. Its callbacks come back through
    /// `Bridge::authorization_event` tagged with `request.session`.
    fn present(&self, request: &AuthorizationRequest, view: Option<&ViewHandle>) -> Result<()>;
}

/// Access to whatever is currently on screen.
pub trait PresentationSurface {
    fn active_view(&self) -> Option<ViewHandle>;
}

/// Decides whether a received prime turned into a successful payment.
///
/// Stands in for "send the prime to the merchant backend and charge it";
/// the answer dismisses the payment sheet with success or failure.
pub trait PaymentConfirmer: Send + Sync {
    fn confirm(&self, prime: &ReceivedPrime) -> bool;
}

/// Confirms every prime.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PaymentConfirmer for AcceptAll {
    fn confirm(&self, _prime: &ReceivedPrime) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Value types crossing the boundary
// ---------------------------------------------------------------------------

/// Raw card fields as the caller sent them. Empty means missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub due_month: String,
    pub due_year: String,
    pub ccv: String,
}

impl CardDetails {
    /// Last four digits, everything else masked.
    pub fn masked_number(&self) -> String {
        let digits: Vec<char> = self.number.chars().filter(char::is_ascii_digit).collect();
        let keep = digits.len().min(4);
        let tail: String = digits[digits.len() - keep..].iter().collect();
        format!("{}{tail}", "*".repeat(digits.len() - keep))
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &self.masked_number())
            .field("due_month", &self.due_month)
            .field("due_year", &self.due_year)
            .field("ccv", &"***")
            .finish()
    }
}

/// Per-field result of the SDK's local card check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardCheck {
    pub number_valid: bool,
    pub expiry_valid: bool,
    pub ccv_valid: bool,
}

impl CardCheck {
    pub fn all_valid(&self) -> bool {
        self.number_valid && self.expiry_valid && self.ccv_valid
    }
}

/// Opaque handle to a host view controller / activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(pub usize);

/// Frozen configuration handed to the payment sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub session: SessionId,
    pub merchant: MerchantProfile,
    pub consumer: ConsumerProfile,
    pub cart: Cart,
}
