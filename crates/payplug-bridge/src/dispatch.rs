// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatcher.
//
// `Bridge::dispatch` never blocks and never fails: it decodes the arguments,
// routes to an adapter and hands back a `PendingResponse` that resolves at
// most once. Every error is folded into the response value of its command
// family here.

use std::sync::{Arc, PoisonError, RwLock};

use payplug_core::authorization::{AuthorizationEvent, EventReply, SessionId, SessionState};
use payplug_core::encoding::{encode_tokenization, encode_transaction};
use payplug_core::error::{BridgeError, Result};
use payplug_core::{
    ArgumentMap, BridgeConfig, Command, ProviderSetupConfig, TokenizationResult, TransactionResult,
    WalletKind,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::completion::{self, Completion, PendingResponse, Responder, Response};
use crate::resume::{ResumeChannel, ResumeOutcome};
use crate::session::AuthorizationDesk;
use crate::traits::{AcceptAll, AuthorizationRequest, PaymentConfirmer, ProviderSdk};
use crate::wallet::{NO_SURFACE, RedirectWallet};
use crate::{card, decode};

pub const NOT_SET_UP: &str = "provider not set up";

/// The command bridge.
pub struct Bridge {
    sdk: Arc<dyn ProviderSdk>,
    confirmer: Arc<dyn PaymentConfirmer>,
    config: BridgeConfig,
    setup: RwLock<Option<ProviderSetupConfig>>,
    resume: ResumeChannel,
    desk: AuthorizationDesk,
}

impl Bridge {
    pub fn new(sdk: Arc<dyn ProviderSdk>, config: BridgeConfig) -> Self {
        Self {
            resume: ResumeChannel::new(config.correlation_param.clone()),
            desk: AuthorizationDesk::new(config.session_conflict_policy),
            sdk,
            confirmer: Arc::new(AcceptAll),
            config,
            setup: RwLock::new(None),
        }
    }

    /// Replace the default confirmer, which approves every prime.
    pub fn with_confirmer(mut self, confirmer: Arc<dyn PaymentConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_set_up(&self) -> bool {
        self.setup
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Handle one inbound request.
    #[instrument(skip(self, args))]
    pub fn dispatch(&self, name: &str, args: Value) -> PendingResponse {
        let command = Command::parse(name);
        let (responder, pending) = completion::channel(command);

        match ArgumentMap::try_from(args) {
            Ok(args) => self.route(command, &args, responder),
            Err(err) => {
                warn!(%command, "arguments are not a map");
                responder.send(Response::text(err.to_string()));
            }
        }
        pending
    }

    fn route(&self, command: Command, args: &ArgumentMap, responder: Responder) {
        match command {
            Command::SetupProvider => responder.send(text_result(self.setup_provider(args))),

            Command::ValidateCard => {
                let valid = card::validate(&*self.sdk, &decode::card(args));
                responder.send(Response::Flag(valid));
            }

            Command::TokenizeCard => {
                let done = tokenization(responder);
                match self.require_setup() {
                    Ok(()) => card::tokenize(
                        &*self.sdk,
                        decode::card(args),
                        &self.config.geo_location,
                        done,
                    ),
                    Err(err) => done.complete(TokenizationResult::from_error(&err)),
                }
            }

            Command::CheckWalletAvailable(kind) => {
                responder.send(Response::Flag(self.wallet(kind).is_available()));
            }

            Command::GetWalletPrime(kind) => {
                let done = tokenization(responder);
                let link = decode::return_link(args);
                // An empty link is reported as such even before setup.
                match self.require_setup() {
                    Err(err) if !link.is_empty() => {
                        done.complete(TokenizationResult::from_error(&err))
                    }
                    _ => self.wallet(kind).get_prime(&link, done),
                }
            }

            Command::RedirectToWallet(kind) => {
                let done = self.transaction(responder);
                match decode::redirect(args).and_then(|params| {
                    self.require_setup()?;
                    Ok(params)
                }) {
                    Ok(params) => self.wallet(kind).redirect(params, done),
                    Err(err) => done.complete(TransactionResult::from_error(&err)),
                }
            }

            Command::ConfigureMerchant => {
                let outcome = decode::merchant(args).map(|merchant| self.desk.configure_merchant(merchant));
                responder.send(text_result(outcome));
            }

            Command::ConfigureConsumer => {
                self.desk.configure_consumer(decode::consumer(args));
                responder.send(Response::text(""));
            }

            Command::ConfigureCart => {
                let (amount_pending, show_total) = decode::cart_flags(args);
                self.desk.configure_cart(amount_pending, show_total);
                responder.send(Response::text(""));
            }

            Command::AddCartItem => {
                let outcome = decode::cart_item(args).and_then(|item| self.desk.add_item(item));
                responder.send(text_result(outcome));
            }

            Command::CanAuthorize => match self.desk.merchant() {
                Ok(merchant) => {
                    responder.send(Response::Flag(
                        self.sdk.can_make_payments(&merchant.supported_networks),
                    ));
                }
                Err(err) => responder.send(Response::text(err.to_string())),
            },

            Command::StartAuthorization => {
                let done = tokenization(responder);
                if let Err(err) = self.require_setup() {
                    done.complete(TokenizationResult::from_error(&err));
                    return;
                }
                if let Ok(request) = self.desk.start(done) {
                    self.present(&request);
                }
            }

            Command::Unrecognized => responder.send(Response::text(self.sdk.platform_name())),
        }
    }

    fn setup_provider(&self, args: &ArgumentMap) -> Result<()> {
        let config = decode::setup(args)?;
        self.sdk.apply_setup(&config);
        info!(app_id = config.app_id, environment = ?config.environment, "provider set up");
        *self.setup.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
        Ok(())
    }

    fn require_setup(&self) -> Result<()> {
        if self.is_set_up() {
            Ok(())
        } else {
            Err(BridgeError::Configuration(NOT_SET_UP.into()))
        }
    }

    fn present(&self, request: &AuthorizationRequest) {
        let shown = match self.sdk.active_view() {
            Some(view) => self.sdk.present(request, Some(&view)),
            None => Err(BridgeError::Configuration(NO_SURFACE.into())),
        };
        if let Err(err) = shown {
            self.desk.abort(request.session, &err);
        }
    }

    fn wallet(&self, kind: WalletKind) -> RedirectWallet<'_> {
        RedirectWallet::new(kind, &*self.sdk, &self.resume)
    }

    fn transaction(&self, responder: Responder) -> Completion<TransactionResult> {
        let unknown = self.config.unknown_field_marker.clone();
        responder.completion(move |result: TransactionResult| {
            Response::Text(encode_transaction(&result, &unknown))
        })
    }

    // -----------------------------------------------------------------------
    // Host notifications
    // -----------------------------------------------------------------------

    /// A redirect wallet returned control to the app.
    pub fn resume(&self, kind: WalletKind, payload: Option<&str>) -> ResumeOutcome {
        self.resume.resume(kind, payload)
    }

    /// Custom-scheme URL opened by the system; LinePay returns this way.
    pub fn open_url(&self, url: &str) -> ResumeOutcome {
        self.resume(WalletKind::LinePay, Some(url))
    }

    /// Universal link continuation; EasyWallet returns this way.
    pub fn universal_link(&self, url: &str) -> ResumeOutcome {
        self.resume(WalletKind::EasyWallet, Some(url))
    }

    /// Redirects of `kind` still waiting to be resumed.
    pub fn pending_redirects(&self, kind: WalletKind) -> usize {
        self.resume.pending_count(kind)
    }

    /// One payment sheet callback for `session`.
    #[instrument(skip(self, event), fields(event = event.label()))]
    pub fn authorization_event(
        &self,
        session: SessionId,
        event: AuthorizationEvent,
    ) -> Result<EventReply> {
        self.desk.handle(session, event, &*self.confirmer)
    }

    /// Id and state of the session currently on screen.
    pub fn authorization_state(&self) -> Option<(SessionId, SessionState)> {
        self.desk.active()
    }

    pub fn authorization_desk(&self) -> &AuthorizationDesk {
        &self.desk
    }
}

fn tokenization(responder: Responder) -> Completion<TokenizationResult> {
    responder.completion(|result: TokenizationResult| Response::Text(encode_tokenization(&result)))
}

/// `""` on success, the error message otherwise.
fn text_result(outcome: Result<()>) -> Response {
    match outcome {
        Ok(()) => Response::text(""),
        Err(err) => Response::text(err.to_string()),
    }
}
