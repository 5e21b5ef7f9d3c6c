//! Long-polling update loop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use notebot_core::{defaults, Error, Result};
use notebot_telegram::TelegramClient;

use crate::handlers::App;

/// Pulls updates from the Bot API and hands each event to the [`App`] on its
/// own task.
pub struct Poller {
    client: TelegramClient,
    app: App,
    error_backoff: Duration,
}

impl Poller {
    pub fn new(client: TelegramClient, app: App) -> Self {
        Self {
            client,
            app,
            error_backoff: Duration::from_millis(defaults::POLL_ERROR_BACKOFF_MS),
        }
    }

    /// Pause after a failed poll.
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Poll until a shutdown signal arrives, then wait for in-flight handlers.
    ///
    /// Only a rejected bot token ends the loop with an error; every other
    /// polling failure is retried after the backoff.
    pub async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) -> Result<()> {
        info!(
            subsystem = "poller",
            poll_timeout_secs = self.client.config().poll_timeout_secs,
            "Update poller started"
        );

        let mut offset: i64 = 0;
        let mut tasks = JoinSet::new();
        let mut outcome = Ok(());

        loop {
            let polled = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(subsystem = "poller", "Update poller received shutdown signal");
                    break;
                }
                polled = self.client.get_updates(offset) => polled,
            };

            match polled {
                Ok(updates) => {
                    if !updates.is_empty() {
                        debug!(subsystem = "poller", count = updates.len(), offset, "Updates received");
                    }
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let update_id = update.update_id;
                        match update.into_event() {
                            Some(event) => {
                                let app = self.app.clone();
                                tasks.spawn(async move { app.handle(event).await });
                            }
                            None => debug!(subsystem = "poller", update_id, "Update skipped"),
                        }
                    }
                }
                Err(e @ Error::Config(_)) => {
                    error!(subsystem = "poller", error = %e, "Bot API rejected the token, stopping");
                    outcome = Err(e);
                    break;
                }
                Err(e) => {
                    warn!(
                        subsystem = "poller",
                        error = %e,
                        backoff_ms = self.error_backoff.as_millis() as u64,
                        "Polling failed, retrying"
                    );
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            info!(subsystem = "poller", "Update poller received shutdown signal");
                            break;
                        }
                        _ = sleep(self.error_backoff) => {}
                    }
                }
            }

            while let Some(result) = tasks.try_join_next() {
                if let Err(e) = result {
                    error!(subsystem = "poller", error = ?e, "Update handler panicked");
                }
            }
        }

        if !tasks.is_empty() {
            info!(subsystem = "poller", in_flight = tasks.len(), "Waiting for handlers to finish");
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(subsystem = "poller", error = ?e, "Update handler panicked");
            }
        }

        info!(subsystem = "poller", "Update poller stopped");
        outcome
    }
}
