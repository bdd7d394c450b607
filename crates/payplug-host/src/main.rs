// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payplug host harness.
//
// Entry point. Loads config, initialises logging on stderr, then serves the
// line protocol: requests on stdin, replies on stdout.

mod protocol;
mod settings;

use payplug_bridge::{Bridge, provider_sdk};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use protocol::Handled;
use settings::ConfigSource;

#[tokio::main]
async fn main() {
    let (config, source) = settings::load();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    match &source {
        ConfigSource::Defaults => info!("no {} set, using default config", settings::CONFIG_ENV),
        ConfigSource::File(path) => info!(path = %path.display(), "config loaded"),
        ConfigSource::Unreadable { path, reason } => {
            warn!(path = %path.display(), %reason, "config unreadable, using defaults")
        }
    }

    let bridge = Bridge::new(provider_sdk(), config);
    info!("Payplug host ready");

    let (out, mut lines_out) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = lines_out.recv().await {
            let written = async {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await
            };
            if let Err(e) = written.await {
                error!(error = %e, "stdout closed");
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let handled = protocol::handle_line(&bridge, &line);
        let out = out.clone();
        match handled {
            Handled::Silent => {}
            Handled::Reply(_) => emit(&out, handled).await,
            Handled::Pending { .. } => {
                tokio::spawn(async move { emit(&out, handled).await });
            }
        }
    }

    // Dropping the bridge releases every unresolved request, so the waiting
    // tasks reply `null` and the writer drains.
    info!(
        easy_wallet = bridge.pending_redirects(payplug_core::WalletKind::EasyWallet),
        line_pay = bridge.pending_redirects(payplug_core::WalletKind::LinePay),
        "stdin closed, shutting down"
    );
    drop(bridge);
    drop(out);
    if let Err(e) = writer.await {
        error!(error = %e, "writer task failed");
    }
}

async fn emit(out: &mpsc::UnboundedSender<String>, handled: Handled) {
    let Some(reply) = handled.into_reply().await else {
        return;
    };
    match reply.to_line() {
        Ok(line) => {
            if out.send(line).is_err() {
                warn!("reply dropped, writer gone");
            }
        }
        Err(e) => error!(error = %e, "reply serialization failed"),
    }
}
