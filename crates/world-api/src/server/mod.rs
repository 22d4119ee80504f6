use std::fmt;
use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    AcquireLeaseRequest, ApiError, DiscoveryEntry, ErrorCode, LeaseResponse,
    ReleaseLeaseRequest, ReleaseLeaseResponse, RenewLeaseRequest, SubmitIntentRequest,
    SubmitIntentResponse, ViewerMessage,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::runtime::{RuntimeError, WorldHandle};

include!("error.rs");
include!("state.rs");
include!("routes/lease.rs");
include!("routes/intent.rs");
include!("routes/discovery.rs");
include!("routes/stream.rs");
include!("routes/viewer.rs");
include!("util.rs");

pub async fn serve(addr: SocketAddr, handle: WorldHandle) -> Result<(), ServerError> {
    let state = AppState::new(handle);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/lease/acquire", post(acquire_lease))
        .route("/api/v1/lease/renew", post(renew_lease))
        .route("/api/v1/lease/release", post(release_lease))
        .route("/api/v1/intents", post(submit_intent))
        .route("/api/v1/entities", get(list_entities))
        .route("/api/v1/ticks", get(stream_ticks))
        .route("/api/v1/observe", get(stream_observations))
        .route("/api/v1/viewer", get(stream_viewer))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}
