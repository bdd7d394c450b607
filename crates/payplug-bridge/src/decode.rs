// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Argument decoder: loosely-typed argument maps to per-command parameters.
//
// Lookups default rather than fail (see `ArgumentMap`), so a missing key and an
// explicitly empty one are the same thing here. Commands with required fields
// validate collect-all: every bad field is reported, in declaration order.

use payplug_core::authorization::{ConsumerProfile, LineItem, MerchantProfile};
use payplug_core::error::Result;
use payplug_core::{ArgumentMap, Environment, ProviderSetupConfig, ValidationErrors};

use crate::traits::CardDetails;

/// `setupTappay {appId, appKey, serverType}`.
pub fn setup(args: &ArgumentMap) -> Result<ProviderSetupConfig> {
    let app_id = args.int32("appId");
    let app_key = args.string("appKey");
    let server_type = args.string("serverType");

    let mut errors = ValidationErrors::new();
    errors.check(app_id == 0, "appId");
    errors.check(app_key.is_empty(), "appKey");
    errors.check(server_type.is_empty(), "serverType");

    errors.finish(ProviderSetupConfig {
        app_id,
        app_key,
        environment: Environment::from_server_type(&server_type),
    })
}

/// `isCardValid` / `getPrime {cardNumber, dueMonth, dueYear, ccv}`.
///
/// No validation: the SDK's local check decides, and treats empty as invalid.
pub fn card(args: &ArgumentMap) -> CardDetails {
    CardDetails {
        number: args.string("cardNumber"),
        due_month: args.string("dueMonth"),
        due_year: args.string("dueYear"),
        ccv: args.string("ccv"),
    }
}

/// Return link for a wallet `getPrime`. Emptiness is the adapter's call.
pub fn return_link(args: &ArgumentMap) -> String {
    args.string("universalLink")
}

/// Parameters of a wallet redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectParams {
    pub return_link: String,
    pub payment_url: String,
}

/// `redirectTo* {universalLink, paymentUrl}`.
pub fn redirect(args: &ArgumentMap) -> Result<RedirectParams> {
    let return_link = args.string("universalLink");
    let payment_url = args.string("paymentUrl");

    let mut errors = ValidationErrors::new();
    errors.check(return_link.is_empty(), "universalLink");
    errors.check(payment_url.is_empty(), "paymentUrl");

    errors.finish(RedirectParams {
        return_link,
        payment_url,
    })
}

/// `configureMerchant {merchantName, merchantIdentifier, countryCode,
/// currencyCode, supportedNetworks}`.
///
/// `supportedNetworks` is comma-separated; names are trimmed and lower-cased.
pub fn merchant(args: &ArgumentMap) -> Result<MerchantProfile> {
    let identifier = args.string("merchantIdentifier");
    let country_code = args.string("countryCode");
    let currency_code = args.string("currencyCode");
    let supported_networks: Vec<String> = args
        .string("supportedNetworks")
        .split(',')
        .map(|n| n.trim().to_ascii_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    let mut errors = ValidationErrors::new();
    errors.check(identifier.is_empty(), "merchantIdentifier");
    errors.check(!is_code(&country_code, 2), "countryCode");
    errors.check(!is_code(&currency_code, 3), "currencyCode");
    errors.check(supported_networks.is_empty(), "supportedNetworks");

    errors.finish(MerchantProfile {
        name: args.string("merchantName"),
        identifier,
        country_code: country_code.to_ascii_uppercase(),
        currency_code: currency_code.to_ascii_uppercase(),
        supported_networks,
    })
}

/// `configureConsumer {requireShippingAddress, requireBillingAddress,
/// requireEmail, requirePhone}`.
pub fn consumer(args: &ArgumentMap) -> ConsumerProfile {
    ConsumerProfile {
        require_shipping_address: args.flag("requireShippingAddress"),
        require_billing_address: args.flag("requireBillingAddress"),
        require_email: args.flag("requireEmail"),
        require_phone: args.flag("requirePhone"),
    }
}

/// `configureCart {isAmountPending, showTotalAmount}` as `(amount_pending, show_total)`.
pub fn cart_flags(args: &ArgumentMap) -> (bool, bool) {
    (args.flag("isAmountPending"), args.flag("showTotalAmount"))
}

/// `addCartItem {itemName, amount}`; amount in minor units, must be positive.
pub fn cart_item(args: &ArgumentMap) -> Result<LineItem> {
    let name = args.string("itemName");
    let amount = args.integer("amount");

    let mut errors = ValidationErrors::new();
    errors.check(name.is_empty(), "itemName");
    errors.check(amount <= 0, "amount");

    errors.finish(LineItem { name, amount })
}

fn is_code(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ArgumentMap {
        ArgumentMap::try_from(value).expect("map")
    }

    #[test]
    fn setup_collects_every_bad_field() {
        let err = setup(&args(json!({"appId": 0, "appKey": "", "serverType": ""}))).unwrap_err();
        assert_eq!(err.to_string(), "appId error/appKey error/serverType error");

        let err = setup(&ArgumentMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "appId error/appKey error/serverType error");
    }

    #[test]
    fn setup_reports_only_what_is_wrong() {
        let err = setup(&args(json!({"appId": 11334, "appKey": "", "serverType": "sandBox"})))
            .unwrap_err();
        assert_eq!(err.to_string(), "appKey error");
    }

    #[test]
    fn setup_maps_server_type() {
        let config = setup(&args(json!({
            "appId": 11334,
            "appKey": "app_key",
            "serverType": "sandBox",
        })))
        .expect("valid");
        assert_eq!(config.app_id, 11334);
        assert_eq!(config.environment, Environment::Sandbox);

        let config = setup(&args(json!({
            "appId": 11334,
            "appKey": "app_key",
            "serverType": "anything",
        })))
        .expect("valid");
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn card_fields_default_to_empty() {
        let details = card(&args(json!({"cardNumber": "4242424242424242", "ccv": 123})));
        assert_eq!(details.number, "4242424242424242");
        assert_eq!(details.due_month, "");
        assert_eq!(details.ccv, "");
    }

    #[test]
    fn redirect_requires_both_links() {
        let err = redirect(&ArgumentMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "universalLink error/paymentUrl error");

        let params = redirect(&args(json!({
            "universalLink": "https://app.example/return",
            "paymentUrl": "https://pay.example/1",
        })))
        .expect("valid");
        assert_eq!(params.payment_url, "https://pay.example/1");
    }

    #[test]
    fn merchant_normalises_networks_and_codes() {
        let profile = merchant(&args(json!({
            "merchantName": "Tea House",
            "merchantIdentifier": "merchant.com.example",
            "countryCode": "tw",
            "currencyCode": "twd",
            "supportedNetworks": "Visa, MasterCard,,jcb",
        })))
        .expect("valid");
        assert_eq!(profile.country_code, "TW");
        assert_eq!(profile.currency_code, "TWD");
        assert_eq!(profile.supported_networks, vec!["visa", "mastercard", "jcb"]);
    }

    #[test]
    fn merchant_collects_errors() {
        let err = merchant(&args(json!({"countryCode": "TWN", "currencyCode": "TWD"}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "merchantIdentifier error/countryCode error/supportedNetworks error"
        );
    }

    #[test]
    fn cart_item_rejects_non_positive_amounts() {
        let err = cart_item(&args(json!({"itemName": "", "amount": 0}))).unwrap_err();
        assert_eq!(err.to_string(), "itemName error/amount error");

        let item = cart_item(&args(json!({"itemName": "tea", "amount": 120}))).expect("valid");
        assert_eq!(item.amount, 120);
    }

    #[test]
    fn consumer_and_cart_flags_default_false() {
        let profile = consumer(&args(json!({"requireEmail": true})));
        assert!(profile.require_email);
        assert!(!profile.require_phone);
        assert_eq!(cart_flags(&ArgumentMap::new()), (false, false));
    }
}
