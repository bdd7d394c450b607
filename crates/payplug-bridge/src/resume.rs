// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redirect resume channel.
//
// A redirect leaves the app; its result comes back later as a URL the host
// hands to the bridge. Each outgoing redirect registers a pending completion
// under a fresh correlation id, which is appended to the return link. On the
// way back the id picks the pending entry; notifications without one go to
// the oldest pending redirect of the same wallet kind.
//
// Unresolved redirects are never expired here. `pending_count` lets a caller
// see what is still outstanding and apply its own timeout.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use payplug_core::{CorrelationId, TransactionRecord, TransactionResult, WalletKind};
use tracing::{debug, info, warn};
use url::Url;

use crate::completion::Completion;

struct PendingRedirect {
    kind: WalletKind,
    seq: u64,
    issued_at: DateTime<Utc>,
    completion: Completion<TransactionResult>,
}

#[derive(Default)]
struct Table {
    next_seq: u64,
    entries: HashMap<CorrelationId, PendingRedirect>,
}

/// What a notification payload carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeNotice {
    pub correlation: Option<CorrelationId>,
    pub record: TransactionRecord,
}

/// Outcome of feeding one notification to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    Delivered(CorrelationId),
    /// Nothing pending matched the notification.
    Unmatched,
    /// The payload could not be read and the wallet kind drops such payloads.
    Ignored,
}

/// Pending-redirect table shared by both redirect wallets.
pub struct ResumeChannel {
    correlation_param: String,
    table: Mutex<Table>,
}

impl ResumeChannel {
    pub fn new(correlation_param: impl Into<String>) -> Self {
        Self {
            correlation_param: correlation_param.into(),
            table: Mutex::new(Table::default()),
        }
    }

    /// Park a completion until the matching notification arrives.
    pub fn register(&self, kind: WalletKind, completion: Completion<TransactionResult>) -> CorrelationId {
        let id = CorrelationId::new();
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = table.next_seq;
        table.next_seq += 1;
        table.entries.insert(
            id,
            PendingRedirect {
                kind,
                seq,
                issued_at: Utc::now(),
                completion,
            },
        );
        debug!(wallet = %kind, correlation = %id, "redirect registered");
        id
    }

    /// Remove a pending entry without resolving it, handing its completion back.
    pub fn withdraw(&self, id: CorrelationId) -> Option<Completion<TransactionResult>> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(&id)
            .map(|entry| entry.completion)
    }

    /// Append the correlation parameter to `link` when it is an absolute URL.
    /// Anything else is returned unchanged.
    pub fn tag_return_link(&self, link: &str, id: CorrelationId) -> String {
        match Url::parse(link) {
            Ok(mut url) if !url.cannot_be_a_base() => {
                url.query_pairs_mut()
                    .append_pair(&self.correlation_param, &id.to_string());
                url.into()
            }
            _ => {
                debug!(correlation = %id, "return link is not an absolute URL, left untagged");
                link.to_owned()
            }
        }
    }

    /// Redirects of `kind` still waiting for a notification.
    pub fn pending_count(&self, kind: WalletKind) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .filter(|entry| entry.kind == kind)
            .count()
    }

    /// Read a notification payload: an absolute URL or a bare query string.
    pub fn parse_notice(&self, payload: &str) -> Option<ResumeNotice> {
        let query: Vec<(String, String)> = match Url::parse(payload) {
            Ok(url) => url.query_pairs().into_owned().collect(),
            Err(_) if payload.contains('=') => {
                url::form_urlencoded::parse(payload.trim_start_matches('?').as_bytes())
                    .into_owned()
                    .collect()
            }
            Err(_) => return None,
        };

        let lookup = |keys: &[&str]| {
            keys.iter().find_map(|key| {
                query
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
            })
        };

        Some(ResumeNotice {
            correlation: lookup(&[self.correlation_param.as_str()])
                .and_then(|v| CorrelationId::parse(&v)),
            record: TransactionRecord {
                status: lookup(&["status"]),
                rec_trade_id: lookup(&["rec_trade_id", "recTradeId"]),
                order_number: lookup(&["order_number", "orderNumber"]),
                bank_transaction_id: lookup(&["bank_transaction_id", "bankTransactionId"]),
            },
        })
    }

    /// Feed one notification of `kind`.
    ///
    /// EasyWallet payloads that are absent, unreadable or carry no `status`
    /// are dropped. LinePay ones still resolve the oldest pending LinePay
    /// redirect, with every field unknown.
    pub fn resume(&self, kind: WalletKind, payload: Option<&str>) -> ResumeOutcome {
        let notice = payload
            .and_then(|p| self.parse_notice(p))
            .filter(|notice| kind == WalletKind::LinePay || notice.record.status.is_some());
        let notice = match (notice, kind) {
            (Some(notice), _) => notice,
            (None, WalletKind::EasyWallet) => {
                warn!(wallet = %kind, "unreadable resume payload ignored");
                return ResumeOutcome::Ignored;
            }
            (None, WalletKind::LinePay) => {
                warn!(wallet = %kind, "unreadable resume payload, resolving with unknown fields");
                ResumeNotice {
                    correlation: None,
                    record: TransactionRecord::default(),
                }
            }
        };

        let record = &notice.record;
        debug!(
            wallet = %kind,
            status = ?record.status,
            order_number = ?record.order_number,
            rec_trade_id = ?record.rec_trade_id,
            bank_transaction_id = ?record.bank_transaction_id,
            "resume notification"
        );

        let Some((id, entry)) = self.take(kind, notice.correlation) else {
            warn!(wallet = %kind, correlation = ?notice.correlation, "no pending redirect for notification");
            return ResumeOutcome::Unmatched;
        };

        info!(
            wallet = %kind,
            correlation = %id,
            waited_ms = (Utc::now() - entry.issued_at).num_milliseconds(),
            "redirect resumed"
        );
        entry.completion.complete(TransactionResult::Success(notice.record));
        ResumeOutcome::Delivered(id)
    }

    fn take(
        &self,
        kind: WalletKind,
        correlation: Option<CorrelationId>,
    ) -> Option<(CorrelationId, PendingRedirect)> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let id = match correlation {
            Some(id) => table
                .entries
                .get(&id)
                .filter(|entry| entry.kind == kind)
                .map(|_| id)?,
            None => table
                .entries
                .iter()
                .filter(|(_, entry)| entry.kind == kind)
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(id, _)| *id)?,
        };
        table.entries.remove(&id).map(|entry| (id, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn channel() -> ResumeChannel {
        ResumeChannel::new("payplug_ref")
    }

    fn park(channel: &ResumeChannel, kind: WalletKind) -> (CorrelationId, oneshot::Receiver<TransactionResult>) {
        let (completion, rx) = Completion::oneshot();
        (channel.register(kind, completion), rx)
    }

    #[test]
    fn tagging_appends_correlation_param() {
        let channel = channel();
        let id = CorrelationId::new();
        let tagged = channel.tag_return_link("https://app.example/return?x=1", id);
        assert_eq!(tagged, format!("https://app.example/return?x=1&payplug_ref={id}"));

        assert_eq!(channel.tag_return_link("not a url", id), "not a url");
    }

    #[test]
    fn notice_reads_both_key_styles() {
        let channel = channel();
        let notice = channel
            .parse_notice("app://return?status=0&recTradeId=D1&order_number=O1")
            .expect("parse");
        assert_eq!(notice.record.status.as_deref(), Some("0"));
        assert_eq!(notice.record.rec_trade_id.as_deref(), Some("D1"));
        assert_eq!(notice.record.order_number.as_deref(), Some("O1"));
        assert_eq!(notice.record.bank_transaction_id, None);
        assert_eq!(notice.correlation, None);

        let bare = channel.parse_notice("?status=1").expect("bare query");
        assert_eq!(bare.record.status.as_deref(), Some("1"));
        assert!(channel.parse_notice("garbage").is_none());
    }

    #[test]
    fn correlation_id_selects_the_entry() {
        let channel = channel();
        let (first, mut first_rx) = park(&channel, WalletKind::EasyWallet);
        let (second, mut second_rx) = park(&channel, WalletKind::EasyWallet);

        let payload = format!("https://app.example/return?status=0&payplug_ref={second}");
        assert_eq!(
            channel.resume(WalletKind::EasyWallet, Some(&payload)),
            ResumeOutcome::Delivered(second)
        );
        assert!(second_rx.try_recv().is_ok());
        assert!(first_rx.try_recv().is_err());
        assert_eq!(channel.pending_count(WalletKind::EasyWallet), 1);

        let payload = format!("https://app.example/return?status=0&payplug_ref={first}");
        channel.resume(WalletKind::EasyWallet, Some(&payload));
        assert!(first_rx.try_recv().is_ok());
    }

    #[test]
    fn untagged_notice_goes_to_oldest_of_its_kind() {
        let channel = channel();
        let (_line, mut line_rx) = park(&channel, WalletKind::LinePay);
        let (older, mut older_rx) = park(&channel, WalletKind::EasyWallet);
        let (_newer, mut newer_rx) = park(&channel, WalletKind::EasyWallet);

        assert_eq!(
            channel.resume(WalletKind::EasyWallet, Some("app://r?status=0")),
            ResumeOutcome::Delivered(older)
        );
        assert!(older_rx.try_recv().is_ok());
        assert!(newer_rx.try_recv().is_err());
        assert!(line_rx.try_recv().is_err());
    }

    #[test]
    fn unreadable_easy_wallet_payload_is_dropped() {
        let channel = channel();
        let (_id, mut rx) = park(&channel, WalletKind::EasyWallet);

        assert_eq!(channel.resume(WalletKind::EasyWallet, None), ResumeOutcome::Ignored);
        assert_eq!(channel.resume(WalletKind::EasyWallet, Some("%%%")), ResumeOutcome::Ignored);
        assert!(rx.try_recv().is_err());
        assert_eq!(channel.pending_count(WalletKind::EasyWallet), 1);
    }

    #[test]
    fn easy_wallet_notice_without_status_is_dropped() {
        let channel = channel();
        let (id, mut rx) = park(&channel, WalletKind::EasyWallet);

        for payload in ["https://app.example/return", "junk=1"] {
            assert_eq!(channel.resume(WalletKind::EasyWallet, Some(payload)), ResumeOutcome::Ignored);
        }
        let tagged = format!("https://app.example/return?payplug_ref={id}");
        assert_eq!(channel.resume(WalletKind::EasyWallet, Some(&tagged)), ResumeOutcome::Ignored);
        assert!(rx.try_recv().is_err());
        assert_eq!(channel.pending_count(WalletKind::EasyWallet), 1);
    }

    #[test]
    fn unreadable_line_pay_payload_resolves_with_unknown_fields() {
        let channel = channel();
        let (_id, mut rx) = park(&channel, WalletKind::LinePay);

        channel.resume(WalletKind::LinePay, None);
        let result = rx.try_recv().expect("delivered");
        assert_eq!(result, TransactionResult::Success(TransactionRecord::default()));
    }

    #[test]
    fn unknown_correlation_and_wrong_kind_are_unmatched() {
        let channel = channel();
        let (id, mut rx) = park(&channel, WalletKind::LinePay);

        let stale = format!("app://r?payplug_ref={}", CorrelationId::new());
        assert_eq!(channel.resume(WalletKind::LinePay, Some(&stale)), ResumeOutcome::Unmatched);

        let wrong_kind = format!("app://r?status=0&payplug_ref={id}");
        assert_eq!(
            channel.resume(WalletKind::EasyWallet, Some(&wrong_kind)),
            ResumeOutcome::Unmatched
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn second_notification_for_same_redirect_is_unmatched() {
        let channel = channel();
        let (id, _rx) = park(&channel, WalletKind::LinePay);
        let payload = format!("app://r?status=0&payplug_ref={id}");
        assert_eq!(
            channel.resume(WalletKind::LinePay, Some(&payload)),
            ResumeOutcome::Delivered(id)
        );
        assert_eq!(
            channel.resume(WalletKind::LinePay, Some(&payload)),
            ResumeOutcome::Unmatched
        );
    }

    #[test]
    fn withdraw_hands_back_the_completion() {
        let channel = channel();
        let (id, rx) = park(&channel, WalletKind::LinePay);
        let completion = channel.withdraw(id).expect("pending");
        assert_eq!(channel.pending_count(WalletKind::LinePay), 0);
        completion.complete(TransactionResult::failure("gone"));
        assert!(rx.blocking_recv().is_ok());
    }
}
