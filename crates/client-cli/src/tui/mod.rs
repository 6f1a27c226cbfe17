//! Dashboard TUI.
//!
//! The [`App`] runs the blocking terminal loop; the bridge here owns the
//! async side: it executes the app's commands against the backend API and
//! relays session-gate transitions. Commands are processed sequentially,
//! so a list refresh requested after a send can never overtake it.

mod app;

pub use app::{App, AppCommand, AppEvent};

use std::sync::mpsc;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::unbounded_channel;

use shared::Language;

use crate::api::{ApiClient, ApiError};
use crate::session::SessionGate;

/// Run the dashboard until the user quits or the session is lost.
/// Returns whether the session was lost, so the caller can print the
/// log-in notice after the terminal is restored.
pub async fn run(api: Arc<ApiClient>, gate: Arc<SessionGate>, language: Language) -> Result<bool> {
    let (cmd_tx, mut cmd_rx) = unbounded_channel::<AppCommand>();
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();

    // Relay gate transitions into the app. The watch channel delivers
    // states in order; only the loss of the session matters here.
    let mut session_rx = gate.subscribe();
    let session_event_tx = event_tx.clone();
    let session_task = tokio::spawn(async move {
        while session_rx.changed().await.is_ok() {
            let authenticated = session_rx.borrow_and_update().is_authenticated();
            if !authenticated {
                // App may already be gone; late events are discarded
                let _ = session_event_tx.send(AppEvent::SessionLost);
                break;
            }
        }
    });

    // Execute app commands one at a time.
    let worker_api = api.clone();
    let worker_task = tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            match command {
                AppCommand::Refresh => {
                    let event = match worker_api.list_invoices().await {
                        Ok(invoices) => AppEvent::Invoices(Ok(invoices)),
                        Err(ApiError::Unauthorized) => AppEvent::SessionLost,
                        Err(e) => AppEvent::Invoices(Err(e.to_string())),
                    };
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
                AppCommand::Send(invoice_id) => {
                    let event = match worker_api.send_invoice(&invoice_id).await {
                        Ok(()) => AppEvent::SendSettled {
                            invoice_id,
                            result: Ok(()),
                        },
                        Err(ApiError::Unauthorized) => AppEvent::SessionLost,
                        Err(e) => AppEvent::SendSettled {
                            invoice_id,
                            result: Err(e.to_string()),
                        },
                    };
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        }
    });

    // The terminal loop blocks; keep it off the async runtime.
    let mut dashboard = App::new(language, cmd_tx, event_rx);
    let session_lost = tokio::task::spawn_blocking(move || {
        dashboard.run()?;
        Ok::<bool, std::io::Error>(dashboard.session_lost())
    })
    .await??;

    worker_task.abort();
    session_task.abort();

    Ok(session_lost)
}
