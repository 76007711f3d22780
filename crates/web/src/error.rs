use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fill in the contact name and the message")]
    Incomplete,

    #[error("a message is already being sent, wait for it to finish")]
    Busy { job_id: String },

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

impl Error {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Incomplete | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Busy { .. } => StatusCode::CONFLICT,
            Self::JobNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "level": match self {
                Self::Incomplete | Self::Busy { .. } => "warning",
                Self::JobNotFound(_) | Self::BadRequest(_) => "error",
            },
            "error": self.to_string(),
        });
        if let Self::Busy { ref job_id } = self {
            body["job_id"] = serde_json::json!(job_id);
        }
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
