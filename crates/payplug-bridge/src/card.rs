// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Card adapter: local validation and one-shot tokenization.

use payplug_core::TokenizationResult;
use tracing::{debug, warn};

use crate::completion::Completion;
use crate::traits::{CardDetails, CardSdk, TokenOutcome};

/// True iff number, expiry and CCV all pass the SDK's local check.
pub fn validate(sdk: &dyn CardSdk, card: &CardDetails) -> bool {
    let check = sdk.validate(card);
    debug!(card = %card.masked_number(), ?check, "card validated");
    check.all_valid()
}

/// Request a card token. `done` fires exactly once, from whichever thread the
/// SDK answers on. No retry.
pub fn tokenize(
    sdk: &dyn CardSdk,
    card: CardDetails,
    geo_location: &str,
    done: Completion<TokenizationResult>,
) {
    debug!(card = %card.masked_number(), "requesting card token");
    sdk.create_token(card, geo_location, done.map(token_result));
}

/// Fold a raw SDK outcome into a tokenization result.
///
/// A success callback that carries no prime is reported as a failure so the
/// caller still hears back.
pub fn token_result(outcome: TokenOutcome) -> TokenizationResult {
    match outcome {
        Ok(Some(prime)) if !prime.is_empty() => TokenizationResult::Success { prime },
        Ok(_) => {
            warn!("provider reported success without a prime");
            TokenizationResult::failure("provider returned no prime")
        }
        Err(err) => {
            debug!(status = ?err.provider_status(), "tokenization failed");
            TokenizationResult::from_error(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CardCheck;
    use payplug_core::BridgeError;
    use std::sync::Mutex;

    /// Answers every token request with a canned outcome and records the
    /// geo location it was given.
    struct ScriptedCards {
        answer: Mutex<Option<TokenOutcome>>,
        geo: Mutex<Vec<String>>,
    }

    impl ScriptedCards {
        fn answering(outcome: TokenOutcome) -> Self {
            Self {
                answer: Mutex::new(Some(outcome)),
                geo: Mutex::new(Vec::new()),
            }
        }
    }

    impl CardSdk for ScriptedCards {
        fn validate(&self, card: &CardDetails) -> CardCheck {
            CardCheck {
                number_valid: !card.number.is_empty(),
                expiry_valid: !card.due_month.is_empty() && !card.due_year.is_empty(),
                ccv_valid: !card.ccv.is_empty(),
            }
        }

        fn create_token(&self, _card: CardDetails, geo: &str, done: Completion<TokenOutcome>) {
            self.geo.lock().expect("lock").push(geo.to_owned());
            let answer = self.answer.lock().expect("lock").take().expect("one request");
            done.complete(answer);
        }
    }

    fn full_card() -> CardDetails {
        CardDetails {
            number: "4242424242424242".into(),
            due_month: "01".into(),
            due_year: "30".into(),
            ccv: "123".into(),
        }
    }

    #[test]
    fn any_single_bad_field_invalidates() {
        let sdk = ScriptedCards::answering(Ok(None));
        assert!(validate(&sdk, &full_card()));
        for broken in [
            CardDetails { number: String::new(), ..full_card() },
            CardDetails { due_year: String::new(), ..full_card() },
            CardDetails { ccv: String::new(), ..full_card() },
        ] {
            assert!(!validate(&sdk, &broken));
        }
    }

    #[tokio::test]
    async fn tokenize_passes_geo_location_and_prime() {
        let sdk = ScriptedCards::answering(Ok(Some("tok_1".into())));
        let (done, rx) = Completion::oneshot();
        tokenize(&sdk, full_card(), "UNKNOWN", done);
        assert_eq!(
            rx.await.expect("resolved"),
            TokenizationResult::Success { prime: "tok_1".into() }
        );
        assert_eq!(*sdk.geo.lock().expect("lock"), vec!["UNKNOWN".to_string()]);
    }

    #[tokio::test]
    async fn provider_failure_is_verbatim() {
        let sdk = ScriptedCards::answering(Err(BridgeError::Provider {
            status: 915,
            message: "Unknown error".into(),
        }));
        let (done, rx) = Completion::oneshot();
        tokenize(&sdk, full_card(), "UNKNOWN", done);
        assert_eq!(
            rx.await.expect("resolved"),
            TokenizationResult::Failure {
                status: Some(915),
                message: "Unknown error".into()
            }
        );
    }

    #[test]
    fn missing_prime_is_a_failure() {
        assert_eq!(
            token_result(Ok(None)),
            TokenizationResult::failure("provider returned no prime")
        );
        assert_eq!(
            token_result(Ok(Some(String::new()))),
            TokenizationResult::failure("provider returned no prime")
        );
    }
}
