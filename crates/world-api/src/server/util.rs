fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

async fn send_json_message<T: Serialize>(
    socket: &mut WebSocket,
    message: &T,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}
