// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simulated provider SDK for desktop/CI builds where no vendor SDK is linked.
//
// Card checks are real (Luhn, expiry, CCV length); tokenization answers
// immediately with a fresh `sim_` prime; redirects and payment sheets are
// recorded instead of shown, so the host drives their outcome through resume
// notifications and authorization events.

use std::sync::{Mutex, PoisonError};

use chrono::{Datelike, Utc};
use payplug_core::error::{BridgeError, Result};
use payplug_core::{ProviderSetupConfig, WalletKind};
use tracing::{debug, info};
use uuid::Uuid;

use crate::completion::Completion;
use crate::traits::*;

/// Provider status reported when the SDK is used before setup.
pub const STATUS_NOT_SET_UP: i64 = 88010;
/// Provider status reported for a card that fails the local checks.
pub const STATUS_INVALID_CARD: i64 = 10003;

const KNOWN_NETWORKS: &[&str] = &["visa", "mastercard", "jcb", "amex"];

/// No-network stand-in for the vendor SDK.
pub struct SimulatedSdk {
    setup: Mutex<Option<ProviderSetupConfig>>,
    easy_wallet: SimulatedWallet,
    line_pay: SimulatedWallet,
    view: Option<ViewHandle>,
    presented: Mutex<Vec<AuthorizationRequest>>,
}

impl SimulatedSdk {
    pub fn new() -> Self {
        Self {
            setup: Mutex::new(None),
            easy_wallet: SimulatedWallet::new(WalletKind::EasyWallet),
            line_pay: SimulatedWallet::new(WalletKind::LinePay),
            view: Some(ViewHandle(1)),
            presented: Mutex::new(Vec::new()),
        }
    }

    /// A simulator with nothing on screen.
    pub fn without_view() -> Self {
        Self {
            view: None,
            ..Self::new()
        }
    }

    /// A simulator where the `kind` wallet app is not installed.
    pub fn without_wallet(kind: WalletKind) -> Self {
        let mut sdk = Self::new();
        match kind {
            WalletKind::EasyWallet => sdk.easy_wallet.installed = false,
            WalletKind::LinePay => sdk.line_pay.installed = false,
        }
        sdk
    }

    pub fn setup(&self) -> Option<ProviderSetupConfig> {
        self.setup.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Payment sheets presented so far.
    pub fn presented(&self) -> Vec<AuthorizationRequest> {
        self.presented
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn simulated_wallet(&self, kind: WalletKind) -> &SimulatedWallet {
        match kind {
            WalletKind::EasyWallet => &self.easy_wallet,
            WalletKind::LinePay => &self.line_pay,
        }
    }

    fn require_setup(&self) -> Result<()> {
        if self.setup().is_some() {
            Ok(())
        } else {
            Err(BridgeError::Provider {
                status: STATUS_NOT_SET_UP,
                message: "sdk not set up".into(),
            })
        }
    }
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderSdk for SimulatedSdk {
    fn platform_name(&self) -> String {
        format!("{} (simulated)", std::env::consts::OS)
    }

    fn wallet(&self, kind: WalletKind) -> &dyn RedirectWalletSdk {
        self.simulated_wallet(kind)
    }

    fn apply_setup(&self, config: &ProviderSetupConfig) {
        info!(app_id = config.app_id, environment = ?config.environment, "simulated sdk set up");
        *self.setup.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
    }
}

impl CardSdk for SimulatedSdk {
    fn validate(&self, card: &CardDetails) -> CardCheck {
        CardCheck {
            number_valid: luhn_valid(&card.number),
            expiry_valid: expiry_valid(&card.due_month, &card.due_year),
            ccv_valid: ccv_valid(&card.ccv),
        }
    }

    fn create_token(&self, card: CardDetails, geo_location: &str, done: Completion<TokenOutcome>) {
        debug!(card = %card.masked_number(), geo_location, "simulated token request");
        let outcome = self.require_setup().and_then(|()| {
            if self.validate(&card).all_valid() {
                Ok(Some(fresh_prime("card")))
            } else {
                Err(BridgeError::Provider {
                    status: STATUS_INVALID_CARD,
                    message: "Invalid card".into(),
                })
            }
        });
        done.complete(outcome);
    }
}

impl AuthorizationSdk for SimulatedSdk {
    fn can_make_payments(&self, networks: &[String]) -> bool {
        networks
            .iter()
            .any(|n| KNOWN_NETWORKS.contains(&n.as_str()))
    }

    fn present(&self, request: &AuthorizationRequest, _view: Option<&ViewHandle>) -> Result<()> {
        info!(session = %request.session, total = request.cart.total(), "simulated payment sheet presented");
        self.presented
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(())
    }
}

impl PresentationSurface for SimulatedSdk {
    fn active_view(&self) -> Option<ViewHandle> {
        self.view
    }
}

// ---------------------------------------------------------------------------
// Redirect wallets
// ---------------------------------------------------------------------------

/// A redirect issued to the simulated wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRedirect {
    pub return_url: String,
    pub payment_url: String,
}

/// Simulated redirect wallet.
pub struct SimulatedWallet {
    kind: WalletKind,
    installed: bool,
    redirects: Mutex<Vec<RecordedRedirect>>,
}

impl SimulatedWallet {
    fn new(kind: WalletKind) -> Self {
        Self {
            kind,
            installed: true,
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<RecordedRedirect> {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RedirectWalletSdk for SimulatedWallet {
    fn is_available(&self) -> bool {
        self.installed
    }

    fn get_prime(&self, return_url: &str, done: Completion<TokenOutcome>) {
        debug!(wallet = %self.kind, return_url, "simulated prime request");
        if !self.installed {
            done.complete(Err(BridgeError::PlatformUnavailable));
            return;
        }
        done.complete(Ok(Some(fresh_prime(self.kind.label()))));
    }

    fn redirect(&self, return_url: &str, payment_url: &str, _view: Option<&ViewHandle>) -> Result<()> {
        if !self.installed {
            return Err(BridgeError::PlatformUnavailable);
        }
        info!(wallet = %self.kind, payment_url, "simulated redirect");
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRedirect {
                return_url: return_url.to_owned(),
                payment_url: payment_url.to_owned(),
            });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local card checks
// ---------------------------------------------------------------------------

fn fresh_prime(source: &str) -> String {
    format!("sim_{source}_{}", Uuid::new_v4().simple())
}

/// Luhn checksum over 12 to 19 digits.
pub fn luhn_valid(number: &str) -> bool {
    let digits: Option<Vec<u32>> = number
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(10))
        .collect();
    let Some(digits) = digits else {
        return false;
    };
    if !(12..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Month 1 to 12 and a two- or four-digit year, not before the current month.
pub fn expiry_valid(month: &str, year: &str) -> bool {
    let Ok(month) = month.parse::<u32>() else {
        return false;
    };
    if !(1..=12).contains(&month) {
        return false;
    }
    let year = match (year.len(), year.parse::<i32>()) {
        (2, Ok(y)) => 2000 + y,
        (4, Ok(y)) => y,
        _ => return false,
    };
    let today = Utc::now().date_naive();
    (year, month) >= (today.year(), today.month())
}

/// Three or four digits.
pub fn ccv_valid(ccv: &str) -> bool {
    (3..=4).contains(&ccv.len()) && ccv.chars().all(|c| c.is_ascii_digit())
}
