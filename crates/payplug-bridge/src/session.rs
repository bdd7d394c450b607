// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Authorization session state machine.
//
// Configuration commands write a draft. `start` freezes the draft into the
// active session under a new generation, so later configuration never leaks
// into a flow that is already on screen. Payment sheet callbacks enter through
// `handle`, which checks the session id and the current state before doing
// anything. Completions and the confirmer run with the lock released.

use std::sync::{Mutex, PoisonError};

use payplug_core::authorization::{
    AuthorizationEvent, Cart, ConsumerProfile, EventReply, LineItem, MerchantProfile,
    ReceivedPrime, SessionId, SessionState,
};
use payplug_core::error::{BridgeError, Result};
use payplug_core::{SessionConflictPolicy, TokenizationResult};
use tracing::{debug, info, warn};

use crate::card::token_result;
use crate::completion::Completion;
use crate::traits::{AuthorizationRequest, PaymentConfirmer};

pub const CANCELLED: &str = "authorization cancelled";
pub const FINISHED_WITHOUT_PRIME: &str = "authorization finished without prime";

#[derive(Default)]
struct Draft {
    merchant: Option<MerchantProfile>,
    consumer: Option<ConsumerProfile>,
    cart: Option<Cart>,
}

impl Draft {
    fn state(&self) -> SessionState {
        match (&self.merchant, &self.consumer, &self.cart) {
            (Some(_), Some(_), Some(_)) => SessionState::CartSet,
            (Some(_), Some(_), None) => SessionState::ConsumerSet,
            (Some(_), None, _) => SessionState::MerchantSet,
            _ => SessionState::Idle,
        }
    }
}

struct ActiveSession {
    request: AuthorizationRequest,
    state: SessionState,
    /// Resolves the `StartAuthorization` request; taken once it has fired.
    done: Option<Completion<TokenizationResult>>,
}

#[derive(Default)]
struct Desk {
    draft: Draft,
    active: Option<ActiveSession>,
    generation: u64,
}

/// Owns the draft configuration and at most one active session.
pub struct AuthorizationDesk {
    policy: SessionConflictPolicy,
    inner: Mutex<Desk>,
}

/// Work left to do once the lock is released.
enum FollowUp {
    None,
    Resolve(Completion<TokenizationResult>, TokenizationResult),
    Confirm(Option<Completion<TokenizationResult>>, ReceivedPrime),
}

impl AuthorizationDesk {
    pub fn new(policy: SessionConflictPolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(Desk::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Desk> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Draft configuration --

    pub fn configure_merchant(&self, merchant: MerchantProfile) {
        debug!(identifier = %merchant.identifier, networks = ?merchant.supported_networks, "merchant configured");
        self.lock().draft.merchant = Some(merchant);
    }

    pub fn configure_consumer(&self, consumer: ConsumerProfile) {
        self.lock().draft.consumer = Some(consumer);
    }

    /// Start a fresh, empty cart.
    pub fn configure_cart(&self, amount_pending: bool, show_total: bool) {
        self.lock().draft.cart = Some(Cart::new(amount_pending, show_total));
    }

    pub fn add_item(&self, item: LineItem) -> Result<()> {
        let mut desk = self.lock();
        let cart = desk
            .draft
            .cart
            .as_mut()
            .ok_or_else(|| BridgeError::Configuration("cart not configured".into()))?;
        cart.push(item);
        Ok(())
    }

    pub fn merchant(&self) -> Result<MerchantProfile> {
        self.lock()
            .draft
            .merchant
            .clone()
            .ok_or_else(|| BridgeError::Configuration("merchant not configured".into()))
    }

    pub fn draft_state(&self) -> SessionState {
        self.lock().draft.state()
    }

    // -- Session lifecycle --

    /// Freeze the draft into a new session.
    ///
    /// On error `done` is resolved with the failure before returning, so the
    /// caller always hears back.
    pub fn start(&self, done: Completion<TokenizationResult>) -> Result<AuthorizationRequest> {
        let mut desk = self.lock();
        let (request, replaced) = match self.try_start(&mut desk) {
            Ok(started) => started,
            Err(err) => {
                drop(desk);
                done.complete(TokenizationResult::from_error(&err));
                return Err(err);
            }
        };
        desk.active = Some(ActiveSession {
            request: request.clone(),
            state: SessionState::Started,
            done: Some(done),
        });
        drop(desk);

        // Dropping the replaced session's completion resolves its caller to `None`.
        drop(replaced);
        info!(session = %request.session, total = request.cart.total(), "authorization started");
        Ok(request)
    }

    fn try_start(&self, desk: &mut Desk) -> Result<(AuthorizationRequest, Option<ActiveSession>)> {
        let draft = &desk.draft;
        let (Some(merchant), Some(consumer), Some(cart)) =
            (draft.merchant.clone(), draft.consumer.clone(), draft.cart.clone())
        else {
            let missing: Vec<&str> = [
                ("merchant", draft.merchant.is_none()),
                ("consumer", draft.consumer.is_none()),
                ("cart", draft.cart.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(BridgeError::Configuration(format!(
                "{} not configured",
                missing.join("/")
            )));
        };

        let current = desk
            .active
            .as_ref()
            .map(|active| (active.request.session, active.state));
        let replaced = match (current, self.policy) {
            (None, _) => None,
            (Some((session, state)), SessionConflictPolicy::Reject) => {
                warn!(%session, %state, "authorization already in progress");
                return Err(BridgeError::Configuration(
                    "authorization already in progress".into(),
                ));
            }
            (Some((session, state)), SessionConflictPolicy::Replace) => {
                warn!(%session, %state, "replacing unfinished authorization");
                desk.active.take()
            }
        };

        desk.generation += 1;
        let request = AuthorizationRequest {
            session: SessionId(desk.generation),
            merchant,
            consumer,
            cart,
        };
        Ok((request, replaced))
    }

    /// Tear down `session` before the sheet ever showed, resolving its request
    /// with `err`.
    pub fn abort(&self, session: SessionId, err: &BridgeError) {
        let aborted = {
            let mut desk = self.lock();
            if desk
                .active
                .as_ref()
                .is_some_and(|active| active.request.session == session)
            {
                desk.active.take()
            } else {
                None
            }
        };
        if let Some(done) = aborted.and_then(|active| active.done) {
            warn!(%session, error = %err, "authorization aborted");
            done.complete(TokenizationResult::from_error(err));
        }
    }

    /// The active session's id and state.
    pub fn active(&self) -> Option<(SessionId, SessionState)> {
        self.lock()
            .active
            .as_ref()
            .map(|active| (active.request.session, active.state))
    }

    /// The configuration frozen into the active session.
    pub fn active_request(&self) -> Option<AuthorizationRequest> {
        self.lock().active.as_ref().map(|active| active.request.clone())
    }

    // -- Payment sheet events --

    /// Apply one payment sheet callback to the active session.
    pub fn handle(
        &self,
        session: SessionId,
        event: AuthorizationEvent,
        confirmer: &dyn PaymentConfirmer,
    ) -> Result<EventReply> {
        let (reply, follow_up) = {
            let mut guard = self.lock();
            let desk = &mut *guard;
            let active = match desk.active.as_mut() {
                Some(active) if active.request.session == session => active,
                _ => return Err(BridgeError::StaleSession(session.to_string())),
            };

            let from = active.state;
            let Some(to) = next_state(from, &event) else {
                warn!(%session, state = %from, event = event.label(), "event rejected");
                return Err(BridgeError::ProtocolViolation {
                    state: from.to_string(),
                    event: event.label().to_owned(),
                });
            };
            active.state = to;
            debug!(%session, %from, %to, event = event.label(), "authorization transition");

            let cart = active.request.cart.clone();
            match event {
                AuthorizationEvent::Started => (EventReply::Ack, FollowUp::None),
                AuthorizationEvent::ShippingMethodSelected { .. }
                | AuthorizationEvent::PaymentMethodSelected { .. } => (
                    EventReply::Selection { cart, permit: true },
                    FollowUp::None,
                ),
                AuthorizationEvent::ContactAuthorizationRequested => {
                    (EventReply::Decision { approved: true }, FollowUp::None)
                }
                // The reply is the confirmer's answer, computed below.
                AuthorizationEvent::PrimeReceived(received) => {
                    (EventReply::Ack, FollowUp::Confirm(active.done.take(), received))
                }
                AuthorizationEvent::PaymentSucceeded { .. } => (EventReply::Ack, FollowUp::None),
                AuthorizationEvent::PaymentFailed { status, message } => (
                    EventReply::Ack,
                    resolve(
                        active.done.take(),
                        TokenizationResult::Failure {
                            status: Some(status),
                            message,
                        },
                    ),
                ),
                AuthorizationEvent::Cancelled => (
                    EventReply::Ack,
                    resolve(active.done.take(), TokenizationResult::failure(CANCELLED)),
                ),
                AuthorizationEvent::Finished => {
                    let done = active.done.take();
                    desk.active = None;
                    info!(%session, "authorization finished");
                    (
                        EventReply::Ack,
                        resolve(done, TokenizationResult::failure(FINISHED_WITHOUT_PRIME)),
                    )
                }
            }
        };

        match follow_up {
            FollowUp::None => Ok(reply),
            FollowUp::Resolve(done, result) => {
                done.complete(result);
                Ok(reply)
            }
            FollowUp::Confirm(done, received) => {
                let result = token_result(Ok(Some(received.prime.clone())));
                let usable = result.is_success();
                if let Some(done) = done {
                    done.complete(result);
                }
                if !usable {
                    warn!(%session, "payment sheet delivered an empty prime");
                    return Ok(EventReply::Decision { approved: false });
                }
                let approved = confirmer.confirm(&received);
                info!(%session, approved, "prime received");
                Ok(EventReply::Decision { approved })
            }
        }
    }
}

fn resolve(done: Option<Completion<TokenizationResult>>, result: TokenizationResult) -> FollowUp {
    match done {
        Some(done) => FollowUp::Resolve(done, result),
        None => FollowUp::None,
    }
}

/// The state an event moves the session to, or `None` if the event is not
/// accepted in `from`.
fn next_state(from: SessionState, event: &AuthorizationEvent) -> Option<SessionState> {
    use SessionState::*;
    let to = match event {
        AuthorizationEvent::Started if from == Started => Started,
        AuthorizationEvent::ShippingMethodSelected { .. } if from.is_collecting() => {
            AwaitingShippingMethod
        }
        AuthorizationEvent::PaymentMethodSelected { .. } if from.is_collecting() => {
            AwaitingPaymentMethod
        }
        AuthorizationEvent::ContactAuthorizationRequested if from.is_collecting() => {
            AwaitingContactAuthorization
        }
        AuthorizationEvent::PrimeReceived(_) if from.is_collecting() => PrimeReceived,
        AuthorizationEvent::PaymentSucceeded { .. } if from == PrimeReceived => ResultShown,
        AuthorizationEvent::PaymentFailed { .. }
            if from.is_collecting() || from == PrimeReceived =>
        {
            ResultShown
        }
        AuthorizationEvent::Cancelled
            if from.is_collecting() || matches!(from, PrimeReceived | ResultShown) =>
        {
            Cancelled
        }
        AuthorizationEvent::Finished if matches!(from, PrimeReceived | ResultShown | Cancelled) => {
            Finished
        }
        _ => return None,
    };
    Some(to)
}
