#[derive(Debug, Serialize, Deserialize)]
struct DiscoveryResponse {
    entities: Vec<DiscoveryEntry>,
}

async fn list_entities(
    State(state): State<AppState>,
) -> Result<Json<DiscoveryResponse>, HttpApiError> {
    let entities = state
        .handle
        .list_entities()
        .await
        .map_err(HttpApiError::runtime_stopped)?;
    Ok(Json(DiscoveryResponse { entities }))
}
