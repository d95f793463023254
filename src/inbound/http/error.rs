//! Failure responses of the HTTP boundary.
//!
//! Every failure leaves the service as `{ "message": ... }` with a status code. Causes of
//! server-side failures are logged here and never written into the body.

use std::borrow::Cow;

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::{commands, ports::storage};

const INVALID_INPUT: &str = "Invalid inputs passed, please check your data.";
const INTERNAL: &str = "Something went wrong, please try again later.";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Missing, malformed, expired or tampered token
    pub fn authentication_failed() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication failed!")
    }

    pub fn invalid_input() -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, INVALID_INPUT)
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<commands::Error> for ApiError {
    fn from(err: commands::Error) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %err, "request failed");
        } else {
            debug!(error = %err, "request rejected");
        }
        Self::new(status, err.user_message())
    }
}

impl From<storage::Error> for ApiError {
    fn from(err: storage::Error) -> Self {
        match err {
            storage::Error::UnsupportedMediaType(_) => {
                debug!(error = %err, "upload rejected");
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Invalid mime type!")
            }
            err => {
                error!(error = %err, "storing upload failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "malformed JSON body");
        Self::invalid_input()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        debug!(error = %err, "malformed multipart body");
        Self::invalid_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::database;
    use rstest::*;
    use speculoos::prelude::*;
    use tower::BoxError;

    #[rstest]
    #[case(commands::Error::Validation("Invalid inputs passed, please check your data.".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(commands::Error::NotFound("Could not find place for the provided id.".into()), StatusCode::NOT_FOUND)]
    #[case(commands::Error::Forbidden("You are not allowed to delete this place.".into()), StatusCode::FORBIDDEN)]
    #[case(commands::Error::Unauthorized, StatusCode::FORBIDDEN)]
    #[case(commands::Error::Persistence(database::Error::Adapter("connection reset".into())), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_from_command_error(#[case] err: commands::Error, #[case] expected: StatusCode) {
        let message = err.user_message();

        let api = ApiError::from(err);

        assert_that!(api.status()).is_equal_to(expected);
        assert_that!(api.message()).is_equal_to(message.as_ref());
    }

    #[rstest]
    #[case(storage::Error::UnsupportedMediaType("image/gif".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(storage::Error::Adapter("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_from_storage_error(#[case] err: storage::Error, #[case] expected: StatusCode) {
        assert_that!(ApiError::from(err).status()).is_equal_to(expected);
    }

    #[tokio::test]
    async fn test_into_response() -> Result<(), BoxError> {
        let res = ApiError::authentication_failed().into_response();

        assert_that!(res.status()).is_equal_to(StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&body)?;
        assert_that!(body).is_equal_to(serde_json::json!({ "message": "Authentication failed!" }));

        Ok(())
    }
}
