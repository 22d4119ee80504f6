async fn stream_viewer(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| viewer_socket(socket, state))
}

/// Read-only world feed. A full snapshot goes out on connect and again
/// after any lag gap, so slow viewers resynchronize instead of stalling
/// the tick loop.
async fn viewer_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.handle.subscribe_viewer();
    let mut dropped: u64 = 0;
    info!("viewer connected");

    match state.handle.viewer_snapshot().await {
        Ok(snapshot) => {
            if send_json_message(&mut socket, &snapshot).await.is_err() {
                return;
            }
        }
        Err(_) => return,
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                if !keep_socket_open(&mut socket, incoming).await {
                    break;
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(message) => {
                        let is_shutdown = matches!(message, ViewerMessage::Shutdown { .. });
                        if send_json_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                        if is_shutdown {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        dropped += skipped;
                        warn!(dropped, "viewer lagged; resyncing with a fresh snapshot");
                        match state.handle.viewer_snapshot().await {
                            Ok(snapshot) => {
                                if send_json_message(&mut socket, &snapshot).await.is_err() {
                                    break;
                                }
                            }
                            Err(_) => break,
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!(dropped, "viewer disconnected");
}
