// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Payplug command bridge.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{BridgeError, Result};

/// The two redirect-based wallet families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletKind {
    EasyWallet,
    LinePay,
}

impl WalletKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::EasyWallet => "easyWallet",
            Self::LinePay => "linePay",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A command parsed from an inbound request name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SetupProvider,
    ValidateCard,
    TokenizeCard,
    CheckWalletAvailable(WalletKind),
    GetWalletPrime(WalletKind),
    RedirectToWallet(WalletKind),
    ConfigureMerchant,
    ConfigureConsumer,
    ConfigureCart,
    AddCartItem,
    CanAuthorize,
    StartAuthorization,
    Unrecognized,
}

impl Command {
    /// Resolve a request name. Unknown names become `Unrecognized`.
    pub fn parse(name: &str) -> Self {
        use WalletKind::*;
        match name {
            "setupTappay" => Self::SetupProvider,
            "isCardValid" => Self::ValidateCard,
            "getPrime" => Self::TokenizeCard,
            "isEasyWalletAvailable" => Self::CheckWalletAvailable(EasyWallet),
            "getEasyWalletPrime" => Self::GetWalletPrime(EasyWallet),
            "redirectToEasyWallet" => Self::RedirectToWallet(EasyWallet),
            "isLinePayAvailable" => Self::CheckWalletAvailable(LinePay),
            "getLinePayPrime" => Self::GetWalletPrime(LinePay),
            "redirectToLinePay" => Self::RedirectToWallet(LinePay),
            "configureMerchant" => Self::ConfigureMerchant,
            "configureConsumer" => Self::ConfigureConsumer,
            "configureCart" => Self::ConfigureCart,
            "addCartItem" => Self::AddCartItem,
            "canAuthorize" => Self::CanAuthorize,
            "startAuthorization" => Self::StartAuthorization,
            _ => Self::Unrecognized,
        }
    }

    /// The request name this command answers to.
    pub fn wire_name(&self) -> &'static str {
        use WalletKind::*;
        match self {
            Self::SetupProvider => "setupTappay",
            Self::ValidateCard => "isCardValid",
            Self::TokenizeCard => "getPrime",
            Self::CheckWalletAvailable(EasyWallet) => "isEasyWalletAvailable",
            Self::GetWalletPrime(EasyWallet) => "getEasyWalletPrime",
            Self::RedirectToWallet(EasyWallet) => "redirectToEasyWallet",
            Self::CheckWalletAvailable(LinePay) => "isLinePayAvailable",
            Self::GetWalletPrime(LinePay) => "getLinePayPrime",
            Self::RedirectToWallet(LinePay) => "redirectToLinePay",
            Self::ConfigureMerchant => "configureMerchant",
            Self::ConfigureConsumer => "configureConsumer",
            Self::ConfigureCart => "configureCart",
            Self::AddCartItem => "addCartItem",
            Self::CanAuthorize => "canAuthorize",
            Self::StartAuthorization => "startAuthorization",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Loosely-typed command arguments.
///
/// Lookups never fail: an absent or mistyped key yields the type's default
/// (`""`, `0`, `false`). Whether that default is acceptable is decided per
/// command, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentMap(Map<String, Value>);

impl ArgumentMap {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn string(&self, key: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default()
    }

    /// 32-bit integer; values outside the range count as mistyped.
    pub fn int32(&self, key: &str) -> i32 {
        self.0
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(0)
    }

    pub fn integer(&self, key: &str) -> i64 {
        self.0.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

impl TryFrom<Value> for ArgumentMap {
    type Error = BridgeError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(BridgeError::Decode("args cast error".into())),
        }
    }
}

/// Provider backend the SDK talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    /// `"sandBox"` selects the sandbox; any other string is production.
    pub fn from_server_type(server_type: &str) -> Self {
        if server_type == "sandBox" {
            Self::Sandbox
        } else {
            Self::Production
        }
    }
}

/// Process-wide provider credentials written by `SetupProvider`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSetupConfig {
    pub app_id: i32,
    pub app_key: String,
    pub environment: Environment,
}

impl fmt::Debug for ProviderSetupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSetupConfig")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Outcome of a card or wallet tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizationResult {
    /// Single-use token; never cached by the bridge.
    Success { prime: String },
    /// `status` is `None` for failures raised before reaching the provider.
    Failure { status: Option<i64>, message: String },
}

impl TokenizationResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            status: None,
            message: message.into(),
        }
    }

    pub fn from_error(err: &BridgeError) -> Self {
        Self::Failure {
            status: err.provider_status(),
            message: err.payload_message(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Fields reported by a redirect wallet when control returns.
///
/// `None` means the provider did not report the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub status: Option<String>,
    pub rec_trade_id: Option<String>,
    pub order_number: Option<String>,
    pub bank_transaction_id: Option<String>,
}

/// Outcome of a redirect-based payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResult {
    Success(TransactionRecord),
    Failure { status: Option<i64>, message: String },
}

impl TransactionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            status: None,
            message: message.into(),
        }
    }

    pub fn from_error(err: &BridgeError) -> Self {
        Self::Failure {
            status: err.provider_status(),
            message: err.payload_message(),
        }
    }
}

/// Correlates an outgoing redirect with the notification that resumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_wire_name_parses_back() {
        let commands = [
            Command::SetupProvider,
            Command::ValidateCard,
            Command::TokenizeCard,
            Command::CheckWalletAvailable(WalletKind::EasyWallet),
            Command::GetWalletPrime(WalletKind::EasyWallet),
            Command::RedirectToWallet(WalletKind::EasyWallet),
            Command::CheckWalletAvailable(WalletKind::LinePay),
            Command::GetWalletPrime(WalletKind::LinePay),
            Command::RedirectToWallet(WalletKind::LinePay),
            Command::ConfigureMerchant,
            Command::ConfigureConsumer,
            Command::ConfigureCart,
            Command::AddCartItem,
            Command::CanAuthorize,
            Command::StartAuthorization,
        ];
        for command in commands {
            assert_eq!(Command::parse(command.wire_name()), command);
        }
    }

    #[test]
    fn unknown_name_is_unrecognized() {
        assert_eq!(Command::parse("getPlatformVersion"), Command::Unrecognized);
        assert_eq!(Command::parse(""), Command::Unrecognized);
    }

    #[test]
    fn non_map_args_fail_to_decode() {
        for value in [json!(null), json!("x"), json!([1, 2]), json!(3)] {
            let err = ArgumentMap::try_from(value).unwrap_err();
            assert_eq!(err.to_string(), "args cast error");
        }
    }

    #[test]
    fn mistyped_args_fall_back_to_defaults() {
        let args = ArgumentMap::try_from(json!({
            "appId": "12345",
            "appKey": 42,
            "big": 4_000_000_000i64,
            "flag": "yes",
        }))
        .expect("map");
        assert_eq!(args.int32("appId"), 0);
        assert_eq!(args.string("appKey"), "");
        assert_eq!(args.int32("big"), 0);
        assert_eq!(args.integer("big"), 4_000_000_000);
        assert!(!args.flag("flag"));
        assert_eq!(args.string("absent"), "");
    }

    #[test]
    fn only_exact_sandbox_string_selects_sandbox() {
        assert_eq!(Environment::from_server_type("sandBox"), Environment::Sandbox);
        assert_eq!(Environment::from_server_type("sandbox"), Environment::Production);
        assert_eq!(Environment::from_server_type("production"), Environment::Production);
    }

    #[test]
    fn setup_debug_hides_app_key() {
        let config = ProviderSetupConfig {
            app_id: 11334,
            app_key: "app_secret_value".into(),
            environment: Environment::Sandbox,
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("app_secret_value"));
        assert!(shown.contains("11334"));
    }
}
