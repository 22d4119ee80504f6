async fn stream_ticks(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| tick_socket(socket, state))
}

async fn tick_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.handle.subscribe_ticks();
    info!("tick feed subscriber connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                if !keep_socket_open(&mut socket, incoming).await {
                    break;
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(event) => {
                        if send_json_message(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "tick feed subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("tick feed subscriber disconnected");
}

#[derive(Debug, Deserialize)]
struct ObserveQuery {
    lease_id: String,
    entity_id: String,
}

async fn stream_observations(
    State(state): State<AppState>,
    Query(query): Query<ObserveQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, HttpApiError> {
    let valid = state
        .handle
        .validate_lease(query.lease_id.clone(), query.entity_id.clone())
        .await
        .map_err(HttpApiError::runtime_stopped)?;
    if !valid {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(ApiError::new(
                ErrorCode::InvalidLease,
                "lease is missing, expired, or bound to another entity",
                None,
            )),
        )
            .into_response());
    }
    Ok(ws.on_upgrade(move |socket| observation_socket(socket, state, query)))
}

/// Forwards this entity's observation each tick for as long as the lease
/// stays valid; a lapsed lease closes the stream with `lease_expired`.
async fn observation_socket(mut socket: WebSocket, state: AppState, query: ObserveQuery) {
    let mut rx = state.handle.subscribe_observations();
    let mut dropped: u64 = 0;
    info!(entity_id = %query.entity_id, "observation stream started");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                if !keep_socket_open(&mut socket, incoming).await {
                    break;
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(observation) => {
                        if observation.self_entity.entity_id != query.entity_id {
                            continue;
                        }
                        let still_valid = state
                            .handle
                            .validate_lease(query.lease_id.clone(), query.entity_id.clone())
                            .await
                            .unwrap_or(false);
                        if !still_valid {
                            let _ = socket
                                .send(Message::Text(r#"{"type":"lease_expired"}"#.into()))
                                .await;
                            info!(entity_id = %query.entity_id, "observation stream closed: lease expired");
                            break;
                        }
                        if send_json_message(&mut socket, &observation).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        dropped += skipped;
                        warn!(entity_id = %query.entity_id, dropped, "observation subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!(entity_id = %query.entity_id, dropped, "observation stream ended");
}

/// Answers pings and reports whether the peer is still connected.
async fn keep_socket_open(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, axum::Error>>,
) -> bool {
    match incoming {
        Some(Ok(Message::Ping(payload))) => socket.send(Message::Pong(payload)).await.is_ok(),
        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => false,
        _ => true,
    }
}
