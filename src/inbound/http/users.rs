use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tower::Service;
use tracing::debug;

use crate::commands::{self, ListUsersRequest, LoginRequest, SignupRequest};

use super::{
    dto::{AuthDto, LoginBody, UserDto, UsersEnvelope},
    error::ApiError,
    upload::{discard, UploadForm},
    AppState,
};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersEnvelope>, ApiError> {
    let users = state.users.clone().call(ListUsersRequest).await?;

    Ok(Json(UsersEnvelope {
        users: users.into_iter().map(UserDto::from).collect(),
    }))
}

pub async fn signup(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AuthDto>), ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let image = form.take_image()?.store(state.files.clone()).await?;

    let req = SignupRequest::new(
        form.text("name"),
        form.text("email"),
        form.text("password"),
        image.clone(),
    );
    let res = match req {
        Ok(req) => state.users.clone().call(req).await,
        Err(err) => Err(err),
    };

    match res {
        Ok(res) => Ok((StatusCode::CREATED, Json(res.into()))),
        Err(err) => {
            discard(state.files.clone(), image).await;
            Err(err.into())
        }
    }
}

/// A body without usable credentials fails like wrong credentials do
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<AuthDto>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "unreadable login body");
        ApiError::from(commands::Error::Unauthorized)
    })?;
    let res = state
        .users
        .clone()
        .call(LoginRequest::new(&body.email, body.password))
        .await?;

    Ok(Json(res.into()))
}
