//! HTTP boundary.
//!
//! Maps requests onto the place and user workflows and their results onto JSON. Authentication
//! happens here, before any workflow runs.

use std::{path::Path, sync::Arc};

use axum::{
    http::{
        header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    commands::{PlaceLogic, UserLogic},
    ports::{
        credentials::PasswordHasherPort, database::DatabasePort, geocoding::GeocodingPort,
        storage::FileStoragePort, tokens::TokenPort,
    },
};

pub mod auth;
pub mod dto;
pub mod error;
mod places;
mod upload;
mod users;

#[cfg(test)]
mod tests;

use error::ApiError;

/// URL prefix stored uploads are served under
pub const UPLOADS_PATH: &str = "/uploads/images";

pub type Places = PlaceLogic<dyn DatabasePort, dyn GeocodingPort, dyn FileStoragePort>;
pub type Users = UserLogic<dyn DatabasePort, dyn PasswordHasherPort, dyn TokenPort>;

#[derive(Clone)]
pub struct AppState {
    pub places: Places,
    pub users: Users,
    /// Uploads are stored and discarded by the boundary itself
    pub files: Arc<dyn FileStoragePort>,
    pub tokens: Arc<dyn TokenPort>,
}

impl AppState {
    pub fn new(
        database: Arc<dyn DatabasePort>,
        geocoder: Arc<dyn GeocodingPort>,
        files: Arc<dyn FileStoragePort>,
        hasher: Arc<dyn PasswordHasherPort>,
        tokens: Arc<dyn TokenPort>,
    ) -> Self {
        Self {
            places: PlaceLogic::new(database.clone(), geocoder, files.clone()),
            users: UserLogic::new(database, hasher, tokens.clone()),
            files,
            tokens,
        }
    }
}

pub fn router(state: AppState, upload_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        .route("/places", post(places::create_place))
        .route(
            "/places/{id}",
            get(places::get_place)
                .patch(places::update_place)
                .delete(places::delete_place),
        )
        .route("/places/users/{uid}", get(places::get_places_by_user))
        .route("/users", get(users::list_users))
        .route("/users/signup", post(users::signup))
        .route("/users/login", post(users::login));

    Router::new()
        .nest("/api", api)
        .nest_service(UPLOADS_PATH, ServeDir::new(upload_dir.as_ref()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

async fn not_found() -> ApiError {
    ApiError::not_found("Could not find this route.")
}
