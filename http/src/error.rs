use axum::{
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("The metrics registry could not be encoded: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("The request body is not a valid report: {0}")]
    InvalidReport(#[from] serde_json::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidReport(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status(),
            axum::Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
