async fn submit_intent(
    State(state): State<AppState>,
    Json(request): Json<SubmitIntentRequest>,
) -> Result<Json<SubmitIntentResponse>, HttpApiError> {
    let response = state
        .handle
        .submit_intent(request)
        .await
        .map_err(HttpApiError::runtime_stopped)?;
    Ok(Json(response))
}
