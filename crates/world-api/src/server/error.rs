#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn runtime_stopped(err: RuntimeError) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: ApiError::new(
                ErrorCode::InternalError,
                "world runtime is not running",
                Some(err.to_string()),
            ),
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
