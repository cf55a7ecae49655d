use crate::dispatch::DispatchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure of an API request; the message is the response body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid address")]
    InvalidAddress,

    #[error("Bad JWT Token")]
    BadJwt,

    #[error("{0}")]
    RateLimited(String),

    #[error("Faucet queue is too long, please try again later")]
    QueueFull,

    #[error("Bad Request")]
    BadRequest,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidAddress | Self::BadJwt | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label.
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidAddress | Self::BadJwt | Self::BadRequest => "bad_request",
            Self::RateLimited(_) => "rate_limited",
            Self::QueueFull => "queue_full",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "error",
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::QueueFull => Self::QueueFull,
            DispatchError::Transfer(e) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
