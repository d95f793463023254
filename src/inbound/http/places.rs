use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tower::Service;
use uuid::Uuid;

use crate::{
    commands::{
        CreatePlaceRequest, DeletePlaceRequest, GetPlaceRequest, GetPlacesByUserRequest,
        UpdatePlaceRequest,
    },
    domain::{PlaceId, UserId},
};

use super::{
    auth::Requester,
    dto::{MessageDto, PlaceDto, PlaceEnvelope, PlacesEnvelope, UpdatePlaceBody},
    error::ApiError,
    upload::{discard, UploadForm},
    AppState,
};

// Workflows are always ready, so handlers `call` a clone directly instead of going through
// `ServiceExt::oneshot`, whose generic future axum cannot prove `Send`.

/// Ids that do not parse cannot name an existing place
fn place_id(raw: &str) -> Result<PlaceId, ApiError> {
    Uuid::parse_str(raw)
        .map(PlaceId)
        .map_err(|_| ApiError::not_found("Could not find place for the provided id."))
}

fn user_id(raw: &str) -> Result<UserId, ApiError> {
    Uuid::parse_str(raw)
        .map(UserId)
        .map_err(|_| ApiError::not_found("Could not find places for the provided user id."))
}

pub async fn get_place(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaceEnvelope>, ApiError> {
    let req = GetPlaceRequest::new(place_id(&id)?);
    let place = state.places.clone().call(req).await?;

    Ok(Json(PlaceEnvelope {
        place: place.into(),
    }))
}

pub async fn get_places_by_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<PlacesEnvelope>, ApiError> {
    let req = GetPlacesByUserRequest::new(user_id(&uid)?);
    let places = state.places.clone().call(req).await?;

    Ok(Json(PlacesEnvelope {
        places: places.into_iter().map(PlaceDto::from).collect(),
    }))
}

pub async fn create_place(
    State(state): State<AppState>,
    Requester(identity): Requester,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PlaceEnvelope>), ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let image = form.take_image()?.store(state.files.clone()).await?;

    let req = CreatePlaceRequest::new(
        form.text("title"),
        form.text("description"),
        form.text("address"),
        image.clone(),
        identity.user_id,
    );
    let res = match req {
        Ok(req) => state.places.clone().call(req).await,
        Err(err) => Err(err),
    };

    match res {
        Ok(place) => Ok((
            StatusCode::CREATED,
            Json(PlaceEnvelope {
                place: place.into(),
            }),
        )),
        Err(err) => {
            discard(state.files.clone(), image).await;
            Err(err.into())
        }
    }
}

pub async fn update_place(
    State(state): State<AppState>,
    Requester(identity): Requester,
    Path(id): Path<String>,
    body: Result<Json<UpdatePlaceBody>, JsonRejection>,
) -> Result<Json<PlaceEnvelope>, ApiError> {
    let place_id = place_id(&id)?;
    let Json(body) = body?;
    let req = UpdatePlaceRequest::new(place_id, body.title, body.description, identity.user_id)?;
    let place = state.places.clone().call(req).await?;

    Ok(Json(PlaceEnvelope {
        place: place.into(),
    }))
}

pub async fn delete_place(
    State(state): State<AppState>,
    Requester(identity): Requester,
    Path(id): Path<String>,
) -> Result<Json<MessageDto>, ApiError> {
    let req = DeletePlaceRequest::new(place_id(&id)?, identity.user_id);
    state.places.clone().call(req).await?;

    Ok(Json(MessageDto {
        message: "Deleted place.",
    }))
}
