// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line protocol between the host process and the bridge.
//
// One JSON object per line in each direction. Requests are tagged by `type`;
// replies are matched back by command id or session id, and command replies
// may come out of order.

use payplug_bridge::{Bridge, PendingResponse, Response};
use payplug_core::WalletKind;
use payplug_core::authorization::{AuthorizationEvent, EventReply, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// One inbound line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostRequest {
    Command {
        id: u64,
        name: String,
        #[serde(default)]
        args: Value,
    },
    Resume {
        kind: WalletKind,
        #[serde(default)]
        payload: Option<String>,
    },
    Authorization {
        session: SessionId,
        event: AuthorizationEvent,
    },
}

/// One outbound line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostReply {
    /// `response` is `null` when the request can no longer resolve.
    Command {
        id: u64,
        response: Option<Response>,
    },
    Event {
        session: SessionId,
        reply: EventReply,
    },
    EventError {
        session: SessionId,
        error: String,
    },
    Malformed {
        error: String,
    },
}

impl HostReply {
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// What handling a line produced.
#[derive(Debug)]
pub enum Handled {
    Reply(HostReply),
    /// A command whose response arrives later.
    Pending { id: u64, response: PendingResponse },
    Silent,
}

impl Handled {
    /// Wait for the reply, if there is one.
    pub async fn into_reply(self) -> Option<HostReply> {
        match self {
            Self::Reply(reply) => Some(reply),
            Self::Pending { id, response } => Some(HostReply::Command {
                id,
                response: response.recv().await,
            }),
            Self::Silent => None,
        }
    }
}

/// Decode one line and hand it to the bridge. Never blocks.
pub fn handle_line(bridge: &Bridge, line: &str) -> Handled {
    match serde_json::from_str::<HostRequest>(line) {
        Ok(request) => handle_request(bridge, request),
        Err(e) => {
            warn!(error = %e, "malformed request line");
            Handled::Reply(HostReply::Malformed {
                error: e.to_string(),
            })
        }
    }
}

pub fn handle_request(bridge: &Bridge, request: HostRequest) -> Handled {
    match request {
        HostRequest::Command { id, name, args } => {
            let mut response = bridge.dispatch(&name, args);
            match response.try_take() {
                std::task::Poll::Ready(response) => {
                    Handled::Reply(HostReply::Command { id, response })
                }
                std::task::Poll::Pending => Handled::Pending { id, response },
            }
        }
        HostRequest::Resume { kind, payload } => {
            let outcome = bridge.resume(kind, payload.as_deref());
            debug!(wallet = %kind, ?outcome, "resume handled");
            Handled::Silent
        }
        HostRequest::Authorization { session, event } => {
            match bridge.authorization_event(session, event) {
                Ok(reply) => Handled::Reply(HostReply::Event { session, reply }),
                Err(e) => Handled::Reply(HostReply::EventError {
                    session,
                    error: e.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payplug_bridge::provider_sdk;
    use payplug_core::BridgeConfig;

    fn bridge() -> Bridge {
        Bridge::new(provider_sdk(), BridgeConfig::default())
    }

    fn reply_line(handled: Handled) -> String {
        match handled {
            Handled::Reply(reply) => reply.to_line().expect("json"),
            other => panic!("expected an immediate reply, got {other:?}"),
        }
    }

    #[test]
    fn immediate_command_reply() {
        let bridge = bridge();
        let line = reply_line(handle_line(
            &bridge,
            r#"{"type":"command","id":1,"name":"setupTappay","args":{"appId":0}}"#,
        ));
        assert_eq!(
            line,
            r#"{"id":1,"response":"appId error/appKey error/serverType error"}"#
        );

        let line = reply_line(handle_line(
            &bridge,
            r#"{"type":"command","id":2,"name":"isLinePayAvailable","args":{}}"#,
        ));
        assert_eq!(line, r#"{"id":2,"response":true}"#);
    }

    #[test]
    fn missing_args_are_not_a_map() {
        let bridge = bridge();
        let line = reply_line(handle_line(
            &bridge,
            r#"{"type":"command","id":3,"name":"getPrime"}"#,
        ));
        assert_eq!(line, r#"{"id":3,"response":"args cast error"}"#);
    }

    #[tokio::test]
    async fn redirect_reply_follows_resume() {
        let bridge = bridge();
        handle_line(
            &bridge,
            r#"{"type":"command","id":1,"name":"setupTappay","args":{"appId":1,"appKey":"k","serverType":"sandBox"}}"#,
        );
        let handled = handle_line(
            &bridge,
            r#"{"type":"command","id":9,"name":"redirectToLinePay","args":{"universalLink":"app://r","paymentUrl":"https://pay.example"}}"#,
        );
        assert!(matches!(handled, Handled::Pending { id: 9, .. }));

        let resumed = handle_line(
            &bridge,
            r#"{"type":"resume","kind":"linePay","payload":"app://r?status=0&rec_trade_id=T"}"#,
        );
        assert!(matches!(resumed, Handled::Silent));

        let line = handled
            .into_reply()
            .await
            .expect("reply")
            .to_line()
            .expect("json");
        assert_eq!(
            line,
            r#"{"id":9,"response":"{\"status\":\"0\", \"recTradeId\":\"T\", \"orderNumber\":\"nil\", \"bankTransactionId\":\"nil\"}"}"#
        );
    }

    #[test]
    fn authorization_events_for_unknown_sessions_report_an_error() {
        let bridge = bridge();
        let line = reply_line(handle_line(
            &bridge,
            r#"{"type":"authorization","session":4,"event":{"kind":"started"}}"#,
        ));
        assert_eq!(
            line,
            r#"{"session":4,"error":"authorization session auth-4 is not active"}"#
        );
    }

    #[test]
    fn garbage_lines_are_reported() {
        let bridge = bridge();
        let line = reply_line(handle_line(&bridge, "not json"));
        assert!(line.starts_with(r#"{"error":"#));
    }
}
