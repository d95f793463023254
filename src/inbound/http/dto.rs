//! JSON bodies of the HTTP boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    commands::AuthResponse,
    domain::{Location, Place, User},
};

#[derive(Debug, Serialize)]
pub struct LocationDto {
    pub lat: f64,
    pub lng: f64,
}

impl From<Location> for LocationDto {
    fn from(location: Location) -> Self {
        Self {
            lat: location.lat,
            lng: location.lng,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: LocationDto,
    pub image: String,
    pub creator: Uuid,
}

impl From<Place> for PlaceDto {
    fn from(place: Place) -> Self {
        Self {
            id: place.id.0,
            location: place.location().into(),
            image: place.image().to_string(),
            creator: place.creator().0,
            title: place.title,
            description: place.description,
            address: place.address,
        }
    }
}

/// A user as shown to other clients: no credential
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: String,
    pub places: Vec<Uuid>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.0,
            name: user.name,
            email: user.email,
            image: user.image.to_string(),
            places: user.places.into_iter().map(|id| id.0).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDto {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

impl From<AuthResponse> for AuthDto {
    fn from(res: AuthResponse) -> Self {
        Self {
            user_id: res.identity.user_id.0,
            email: res.identity.email,
            token: res.token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceEnvelope {
    pub place: PlaceDto,
}

#[derive(Debug, Serialize)]
pub struct PlacesEnvelope {
    pub places: Vec<PlaceDto>,
}

#[derive(Debug, Serialize)]
pub struct UsersEnvelope {
    pub users: Vec<UserDto>,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaceBody {
    pub title: String,
    pub description: String,
}
