// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-delivery completion primitives.
//
// Every inbound request gets one `Responder`/`PendingResponse` pair backed by
// a tokio oneshot channel. `Responder::send` and `Completion::complete` take
// `self`, so a request can be answered at most once. Both are `Send` and can
// be fired from whichever thread the provider SDK calls back on.

use std::fmt;
use std::task::Poll;

use payplug_core::Command;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::debug;

/// The single value a request resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Text(String),
    Flag(bool),
}

impl Response {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Text(_) => None,
        }
    }
}

/// Create the channel for one request.
pub fn channel(command: Command) -> (Responder, PendingResponse) {
    let (tx, rx) = oneshot::channel();
    (Responder { tx, command }, PendingResponse { rx, command })
}

/// Write side of a request. Dropping it unanswered resolves the caller to `None`.
pub struct Responder {
    tx: oneshot::Sender<Response>,
    command: Command,
}

impl Responder {
    pub fn command(&self) -> Command {
        self.command
    }

    pub fn send(self, response: Response) {
        let Self { tx, command } = self;
        if tx.send(response).is_err() {
            debug!(%command, "caller dropped the request before it resolved");
        }
    }

    /// Turn this responder into a typed completion that encodes its value.
    pub fn completion<T: 'static>(
        self,
        encode: impl FnOnce(T) -> Response + Send + 'static,
    ) -> Completion<T> {
        Completion::new(move |value| self.send(encode(value)))
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

/// Read side of a request, held by the caller.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Response>,
    command: Command,
}

impl PendingResponse {
    pub fn command(&self) -> Command {
        self.command
    }

    /// Wait for the result. `None` means the request can no longer resolve.
    ///
    /// Redirect requests may wait indefinitely; wrap this in a timeout if the
    /// caller needs one.
    pub async fn recv(self) -> Option<Response> {
        self.rx.await.ok()
    }

    /// Check for a result without waiting.
    pub fn try_take(&mut self) -> Poll<Option<Response>> {
        match self.rx.try_recv() {
            Ok(response) => Poll::Ready(Some(response)),
            Err(oneshot::error::TryRecvError::Empty) => Poll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => Poll::Ready(None),
        }
    }
}

/// One-shot callback handed to a provider SDK.
pub struct Completion<T> {
    deliver: Box<dyn FnOnce(T) + Send>,
}

impl<T: 'static> Completion<T> {
    pub fn new(deliver: impl FnOnce(T) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    pub fn complete(self, value: T) {
        (self.deliver)(value)
    }

    /// Adapt the input type.
    pub fn map<U: 'static>(self, f: impl FnOnce(U) -> T + Send + 'static) -> Completion<U> {
        Completion::new(move |value| self.complete(f(value)))
    }
}

impl<T: Send + 'static> Completion<T> {
    /// A completion whose value can be awaited on the returned receiver.
    pub fn oneshot() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self::new(move |value| {
            let _ = tx.send(value);
        });
        (completion, rx)
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_until_sent() {
        let (responder, mut pending) = channel(Command::ValidateCard);
        assert_eq!(pending.try_take(), Poll::Pending);
        responder.send(Response::Flag(true));
        assert_eq!(pending.try_take(), Poll::Ready(Some(Response::Flag(true))));
    }

    #[test]
    fn dropped_responder_resolves_to_none() {
        let (responder, mut pending) = channel(Command::RedirectToWallet(
            payplug_core::WalletKind::LinePay,
        ));
        drop(responder);
        assert_eq!(pending.try_take(), Poll::Ready(None));
    }

    #[tokio::test]
    async fn completion_encodes_and_delivers_from_another_thread() {
        let (responder, pending) = channel(Command::TokenizeCard);
        let completion = responder.completion(|n: u32| Response::text(format!("n={n}")));

        std::thread::spawn(move || completion.complete(7))
            .join()
            .expect("join");

        assert_eq!(pending.recv().await, Some(Response::text("n=7")));
    }

    #[tokio::test]
    async fn map_adapts_input() {
        let (completion, rx) = Completion::<String>::oneshot();
        let mapped = completion.map(|n: i64| format!("#{n}"));
        mapped.complete(42);
        assert_eq!(rx.await.expect("value"), "#42");
    }

    #[test]
    fn send_after_caller_left_is_harmless() {
        let (responder, pending) = channel(Command::TokenizeCard);
        drop(pending);
        responder.send(Response::text("late"));
    }

    #[test]
    fn responses_serialize_untagged() {
        assert_eq!(
            serde_json::to_string(&Response::Flag(false)).expect("json"),
            "false"
        );
        assert_eq!(
            serde_json::to_string(&Response::text("ok")).expect("json"),
            "\"ok\""
        );
    }
}
