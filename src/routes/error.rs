use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::new_subscriber::NewSubscriberError;
use crate::email_client::EmailError;
use crate::notifier::NotifierError;
use crate::store::StoreError;
use crate::utils::error_chain_fmt;

/// Errors returned by the HTTP handlers, rendered as `{"detail": "..."}`.
#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("Email already registered")]
    EmailAlreadyRegistered,
    #[error("Invalid unit")]
    InvalidUnit,
    #[error("{0}")]
    InvalidEmail(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Distance from Earth is currently unavailable")]
    DistanceUnavailable,
    #[error("Failed to send the notification email")]
    SendEmail(#[source] EmailError),
    #[error("Failed to access the subscribers")]
    Store(#[source] StoreError),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailAlreadyRegistered => ApiError::EmailAlreadyRegistered,
            err => ApiError::Store(err),
        }
    }
}

impl From<NotifierError> for ApiError {
    fn from(err: NotifierError) -> Self {
        match err {
            NotifierError::Store(err) => ApiError::from(err),
            NotifierError::SendEmail(err) => ApiError::SendEmail(err),
        }
    }
}

impl From<NewSubscriberError> for ApiError {
    fn from(err: NewSubscriberError) -> Self {
        match err {
            NewSubscriberError::InvalidEmail(reason) => ApiError::InvalidEmail(reason),
            NewSubscriberError::InvalidUnit(_) => ApiError::InvalidUnit,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmailAlreadyRegistered | ApiError::InvalidUnit | ApiError::InvalidEmail(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::DistanceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SendEmail(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "detail": self.to_string()
        }))
    }
}
