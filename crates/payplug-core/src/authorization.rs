// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Types for the in-app wallet authorization flow: the staged merchant,
// consumer and cart configuration, session identity and state, and the
// events the payment sheet raises while it is on screen.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Merchant identity and the card networks it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub name: String,
    pub identifier: String,
    pub country_code: String,
    pub currency_code: String,
    /// Lower-cased network names, e.g. `visa`, `mastercard`, `jcb`.
    pub supported_networks: Vec<String>,
}

/// Which contact details the payment sheet must collect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerProfile {
    pub require_shipping_address: bool,
    pub require_billing_address: bool,
    pub require_email: bool,
    pub require_phone: bool,
}

/// One cart line. Amounts are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub amount: i64,
}

/// Ordered line items plus display flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<LineItem>,
    pub amount_pending: bool,
    pub show_total: bool,
}

impl Cart {
    pub fn new(amount_pending: bool, show_total: bool) -> Self {
        Self {
            items: Vec::new(),
            amount_pending,
            show_total,
        }
    }

    pub fn push(&mut self, item: LineItem) {
        self.items.push(item);
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(|item| item.amount).sum()
    }
}

/// Identifies one authorization session. The generation only ever grows, so
/// an id from a replaced session never matches the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auth-{}", self.0)
    }
}

/// Lifecycle of an authorization session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    MerchantSet,
    ConsumerSet,
    CartSet,
    Started,
    AwaitingShippingMethod,
    AwaitingPaymentMethod,
    AwaitingContactAuthorization,
    PrimeReceived,
    ResultShown,
    Finished,
    Cancelled,
}

impl SessionState {
    /// Started, or waiting on one of the sheet's selection queries.
    pub fn is_collecting(&self) -> bool {
        matches!(
            self,
            Self::Started
                | Self::AwaitingShippingMethod
                | Self::AwaitingPaymentMethod
                | Self::AwaitingContactAuthorization
        )
    }

    /// A flow is on screen and has not been closed yet.
    pub fn is_in_flight(&self) -> bool {
        self.is_collecting()
            || matches!(self, Self::PrimeReceived | Self::ResultShown | Self::Cancelled)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Card details the wallet reports alongside a prime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardInfo {
    pub bin_code: Option<String>,
    pub last_four: Option<String>,
    pub issuer: Option<String>,
    pub card_type: Option<String>,
    pub funding: Option<String>,
}

/// Terminal success signal from the payment sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedPrime {
    pub prime: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub card_info: CardInfo,
    #[serde(default)]
    pub merchant_reference_info: serde_json::Value,
}

/// Callbacks raised by the payment sheet, in the order it raises them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AuthorizationEvent {
    Started,
    ShippingMethodSelected {
        identifier: String,
    },
    PaymentMethodSelected {
        network: String,
    },
    ContactAuthorizationRequested,
    PrimeReceived(ReceivedPrime),
    PaymentSucceeded {
        #[serde(default)]
        status: i64,
        #[serde(default)]
        message: String,
    },
    PaymentFailed {
        status: i64,
        message: String,
    },
    Cancelled,
    Finished,
}

impl AuthorizationEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::ShippingMethodSelected { .. } => "shippingMethodSelected",
            Self::PaymentMethodSelected { .. } => "paymentMethodSelected",
            Self::ContactAuthorizationRequested => "contactAuthorizationRequested",
            Self::PrimeReceived(_) => "primeReceived",
            Self::PaymentSucceeded { .. } => "paymentSucceeded",
            Self::PaymentFailed { .. } => "paymentFailed",
            Self::Cancelled => "cancelled",
            Self::Finished => "finished",
        }
    }
}

/// What the bridge answers to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "camelCase")]
pub enum EventReply {
    Ack,
    /// Updated cart snapshot and whether the sheet may proceed.
    Selection { cart: Cart, permit: bool },
    Decision { approved: bool },
}
