use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use crate::domain::Identity;
use crate::ports::{credentials, database, geocoding, tokens};

pub mod create_place;
pub mod delete_place;
pub mod get_place;
pub mod get_places_by_user;
pub mod list_users;
pub mod login;
pub mod signup;
pub mod update_place;

#[cfg(test)]
pub(crate) mod test_support;

pub use create_place::CreatePlaceRequest;
pub use delete_place::DeletePlaceRequest;
pub use get_place::GetPlaceRequest;
pub use get_places_by_user::GetPlacesByUserRequest;
pub use list_users::ListUsersRequest;
pub use login::LoginRequest;
pub use signup::SignupRequest;
pub use update_place::UpdatePlaceRequest;

/// Future returned by every workflow service
pub type WorkflowFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

const MIN_DESCRIPTION_LEN: usize = 5;
const MIN_PASSWORD_LEN: usize = 5;

/// Place workflow: every mutation of a place goes through here
///
/// Ports may be concrete adapters or trait objects (`PlaceLogic<dyn DatabasePort, ..>`).
pub struct PlaceLogic<D: ?Sized, G: ?Sized, F: ?Sized> {
    database: Arc<D>,
    geocoder: Arc<G>,
    files: Arc<F>,
}

impl<D: ?Sized, G: ?Sized, F: ?Sized> PlaceLogic<D, G, F> {
    pub fn new(database: Arc<D>, geocoder: Arc<G>, files: Arc<F>) -> Self {
        Self {
            database,
            geocoder,
            files,
        }
    }
}

impl<D: ?Sized, G: ?Sized, F: ?Sized> Clone for PlaceLogic<D, G, F> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
            geocoder: Arc::clone(&self.geocoder),
            files: Arc::clone(&self.files),
        }
    }
}

/// User workflow: signup, login and listing
pub struct UserLogic<D: ?Sized, H: ?Sized, T: ?Sized> {
    database: Arc<D>,
    hasher: Arc<H>,
    tokens: Arc<T>,
}

impl<D: ?Sized, H: ?Sized, T: ?Sized> UserLogic<D, H, T> {
    pub fn new(database: Arc<D>, hasher: Arc<H>, tokens: Arc<T>) -> Self {
        Self {
            database,
            hasher,
            tokens,
        }
    }
}

impl<D: ?Sized, H: ?Sized, T: ?Sized> Clone for UserLogic<D, H, T> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
            hasher: Arc::clone(&self.hasher),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

/// Successful signup or login
#[derive(Debug, PartialEq, Eq)]
pub struct AuthResponse {
    pub identity: Identity,
    pub token: String,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed or missing input
    #[error("invalid input: {0}")]
    Validation(Cow<'static, str>),

    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// Authenticated, but not the owner
    #[error("forbidden: {0}")]
    Forbidden(Cow<'static, str>),

    /// Unknown email or wrong password, deliberately indistinguishable
    #[error("invalid credentials")]
    Unauthorized,

    /// Duplicate unique field
    #[error("conflict: {0}")]
    Conflict(Cow<'static, str>),

    #[error("geocoding port error: {0}")]
    Geocoding(#[from] geocoding::Error),

    #[error("database port error: {0}")]
    Persistence(database::Error),

    /// Credential hashing or token signing failed
    #[error("internal error: {0}")]
    Internal(Cow<'static, str>),
}

impl Error {
    /// HTTP status code for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::Conflict(_) | Error::Geocoding(_) => 422,
            Error::NotFound(_) => 404,
            Error::Forbidden(_) | Error::Unauthorized => 403,
            Error::Persistence(_) | Error::Internal(_) => 500,
        }
    }

    /// Stable message safe to show to clients
    pub fn user_message(&self) -> Cow<'static, str> {
        match self {
            Error::Validation(message)
            | Error::NotFound(message)
            | Error::Forbidden(message)
            | Error::Conflict(message) => message.clone(),
            Error::Unauthorized => "Invalid credentials, could not log you in.".into(),
            Error::Geocoding(_) => "Could not find location for the specified address.".into(),
            Error::Persistence(_) | Error::Internal(_) => {
                "Something went wrong, please try again later.".into()
            }
        }
    }
}

impl From<database::Error> for Error {
    fn from(err: database::Error) -> Self {
        match err {
            database::Error::UserNotFound(_) => {
                Error::NotFound("Could not find user for the provided id.".into())
            }
            database::Error::PlaceNotFound(_) => {
                Error::NotFound("Could not find place for the provided id.".into())
            }
            database::Error::EmailTaken(_) => {
                Error::Conflict("User exists already, please login instead.".into())
            }
            err @ database::Error::Adapter(_) => Error::Persistence(err),
        }
    }
}

impl From<credentials::Error> for Error {
    fn from(err: credentials::Error) -> Self {
        Error::Internal(format!("credential hashing failed: {err}").into())
    }
}

impl From<tokens::Error> for Error {
    fn from(err: tokens::Error) -> Self {
        Error::Internal(format!("token signing failed: {err}").into())
    }
}

fn invalid_input() -> Error {
    Error::Validation("Invalid inputs passed, please check your data.".into())
}

/// Title must be present, description must have a minimum length
fn validate_place_fields(title: &str, description: &str) -> Result<(), Error> {
    if title.trim().is_empty() || description.chars().count() < MIN_DESCRIPTION_LEN {
        return Err(invalid_input());
    }
    Ok(())
}
