async fn acquire_lease(
    State(state): State<AppState>,
    Json(request): Json<AcquireLeaseRequest>,
) -> Result<Json<LeaseResponse>, HttpApiError> {
    let response = state
        .handle
        .acquire_lease(request.entity_id, request.controller_id)
        .await
        .map_err(HttpApiError::runtime_stopped)?;
    Ok(Json(response))
}

async fn renew_lease(
    State(state): State<AppState>,
    Json(request): Json<RenewLeaseRequest>,
) -> Result<Json<LeaseResponse>, HttpApiError> {
    let response = state
        .handle
        .renew_lease(request.lease_id)
        .await
        .map_err(HttpApiError::runtime_stopped)?;
    Ok(Json(response))
}

async fn release_lease(
    State(state): State<AppState>,
    Json(request): Json<ReleaseLeaseRequest>,
) -> Result<Json<ReleaseLeaseResponse>, HttpApiError> {
    let response = state
        .handle
        .release_lease(request.lease_id)
        .await
        .map_err(HttpApiError::runtime_stopped)?;
    Ok(Json(response))
}
