// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redirect wallet adapter (EasyWallet, LinePay).
//
// `get_prime` is an ordinary one-shot call. `redirect` leaves the app: the
// completion is parked in the resume channel and only fires when the host
// reports that control came back.

use payplug_core::{TokenizationResult, TransactionResult, WalletKind};
use tracing::{info, warn};

use crate::card::token_result;
use crate::completion::Completion;
use crate::decode::RedirectParams;
use crate::resume::ResumeChannel;
use crate::traits::ProviderSdk;

pub const EMPTY_LINK: &str = "universalLink is empty";
pub const NO_SURFACE: &str = "no presentation surface";

/// One wallet family, bound to the SDK and the shared resume channel.
pub struct RedirectWallet<'a> {
    kind: WalletKind,
    sdk: &'a dyn ProviderSdk,
    resume: &'a ResumeChannel,
}

impl<'a> RedirectWallet<'a> {
    pub fn new(kind: WalletKind, sdk: &'a dyn ProviderSdk, resume: &'a ResumeChannel) -> Self {
        Self { kind, sdk, resume }
    }

    pub fn is_available(&self) -> bool {
        self.sdk.wallet(self.kind).is_available()
    }

    /// An empty return link fails at once without reaching the SDK.
    pub fn get_prime(&self, return_link: &str, done: Completion<TokenizationResult>) {
        if return_link.is_empty() {
            done.complete(TokenizationResult::failure(EMPTY_LINK));
            return;
        }
        self.sdk
            .wallet(self.kind)
            .get_prime(return_link, done.map(token_result));
    }

    pub fn redirect(&self, params: RedirectParams, done: Completion<TransactionResult>) {
        let view = self.sdk.active_view();
        if self.kind == WalletKind::LinePay && view.is_none() {
            warn!(wallet = %self.kind, "redirect needs a presentation surface");
            done.complete(TransactionResult::failure(NO_SURFACE));
            return;
        }

        let id = self.resume.register(self.kind, done);
        let return_link = self.resume.tag_return_link(&params.return_link, id);

        match self
            .sdk
            .wallet(self.kind)
            .redirect(&return_link, &params.payment_url, view.as_ref())
        {
            Ok(()) => info!(wallet = %self.kind, correlation = %id, "left app for wallet"),
            Err(err) => {
                warn!(wallet = %self.kind, error = %err, "redirect refused");
                if let Some(done) = self.resume.withdraw(id) {
                    done.complete(TransactionResult::from_error(&err));
                }
            }
        }
    }
}
