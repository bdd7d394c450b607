// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result encoder: fixed-field string payloads handed back to the caller.
//
// The payloads are pre-formatted strings with a literal layout:
//
//   {"status":"", "message":"", "prime":"<token>"}
//   {"status":"0", "recTradeId":"…", "orderNumber":"…", "bankTransactionId":"…"}
//
// Values are escaped as JSON string contents, so each payload also parses as
// a JSON object.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::types::{TokenizationResult, TransactionResult};

/// Encode a card/wallet tokenization outcome.
pub fn encode_tokenization(result: &TokenizationResult) -> String {
    match result {
        TokenizationResult::Success { prime } => {
            render(&[("status", ""), ("message", ""), ("prime", prime)])
        }
        TokenizationResult::Failure { status, message } => {
            let status = status.map(|s| s.to_string()).unwrap_or_default();
            render(&[("status", &status), ("message", message), ("prime", "")])
        }
    }
}

/// Encode a redirect wallet outcome. Absent fields render as `unknown`.
pub fn encode_transaction(result: &TransactionResult, unknown: &str) -> String {
    match result {
        TransactionResult::Success(record) => {
            let field = |value: &Option<String>| value.clone().unwrap_or_else(|| unknown.to_owned());
            render(&[
                ("status", &field(&record.status)),
                ("recTradeId", &field(&record.rec_trade_id)),
                ("orderNumber", &field(&record.order_number)),
                ("bankTransactionId", &field(&record.bank_transaction_id)),
            ])
        }
        TransactionResult::Failure { status, message } => {
            let status = status.map(|s| s.to_string()).unwrap_or_default();
            render(&[
                ("status", &status),
                ("recTradeId", ""),
                ("orderNumber", ""),
                ("bankTransactionId", ""),
                ("message", message),
            ])
        }
    }
}

fn render(fields: &[(&str, &str)]) -> String {
    let body: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("\"{key}\":{}", Value::from(*value)))
        .collect();
    format!("{{{}}}", body.join(", "))
}

// ---------------------------------------------------------------------------
// Decoding (for callers and tests that need the fields back)
// ---------------------------------------------------------------------------

/// Fields of an encoded tokenization payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenizationPayload {
    pub status: String,
    pub message: String,
    pub prime: String,
}

/// Fields of an encoded transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub status: String,
    pub rec_trade_id: String,
    pub order_number: String,
    pub bank_transaction_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn decode_tokenization(payload: &str) -> Result<TokenizationPayload> {
    Ok(serde_json::from_str(payload)?)
}

pub fn decode_transaction(payload: &str) -> Result<TransactionPayload> {
    Ok(serde_json::from_str(payload)?)
}
