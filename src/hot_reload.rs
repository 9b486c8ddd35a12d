use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use notify_debouncer_full::{
    new_debouncer, DebouncedEvent,
    notify::{Error as NotifyError, RecursiveMode, Watcher},
};
use tracing::{debug, error, info};

use crate::content_loader::{reload_content, CONTENT_DIR};
use crate::state::{AppState, RefreshBroadcaster};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(tx): State<RefreshBroadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, tx))
}

async fn handle_socket(mut socket: WebSocket, tx: RefreshBroadcaster) {
    let mut rx = tx.subscribe();

    // One reload message per connection; the page reconnects after reloading.
    if rx.recv().await.is_ok() {
        if socket.send(Message::Text("reload".to_string().into())).await.is_err() {
            debug!("Client disconnected before reload message could be sent");
        }
    }
}

/// Modify/create/remove under `content/`, ignoring editor temp files
/// (Emacs `.#*` lockfiles and `~` backups).
fn is_relevant(event: &DebouncedEvent) -> bool {
    let relevant_kind = event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove();
    if !relevant_kind {
        return false;
    }

    !event.event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(".#") || name.ends_with('~'))
    })
}

pub fn start_content_watcher(tx: RefreshBroadcaster, app_state: Arc<AppState>) {
    info!("Starting content watcher for hot-reload...");
    tokio::spawn(async move {
        let (watcher_tx, mut watcher_rx) = tokio::sync::mpsc::channel(1);

        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            None,
            move |res: Result<Vec<DebouncedEvent>, Vec<NotifyError>>| match res {
                Ok(events) => {
                    if events.iter().any(is_relevant) {
                        debug!(
                            "Content change: {:?}",
                            events.iter().flat_map(|e| &e.event.paths).map(|p| p.display()).collect::<Vec<_>>()
                        );
                        if let Err(e) = watcher_tx.blocking_send(()) {
                            error!("Failed to send watcher event: {}", e);
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        error!("Watcher error: {}", e);
                    }
                }
            },
        )
        .expect("Failed to create debouncer");

        debouncer
            .watcher()
            .watch(CONTENT_DIR.as_ref(), RecursiveMode::Recursive)
            .expect("Failed to start watching content directory");

        // The debouncer must stay alive for as long as events are consumed.
        while watcher_rx.recv().await.is_some() {
            info!("Content change detected, reloading and notifying clients...");
            reload_content(&app_state).await;

            if tx.send(()).is_err() {
                debug!("No live reload clients connected");
            }
        }
    });
}
