use crate::domain::{Place, PlaceId, User, UserId};

/// Identity store and place store
///
/// `create_place` and `delete_place` are the two atomic units of the service: an implementation
/// must make the place record and the owner's place list change together or not at all.
#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort: Send + Sync {
    async fn get_user(&self, user_id: UserId) -> Result<User, Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;
    async fn list_users(&self) -> Result<Vec<User>, Error>;
    async fn insert_user(&self, user: User) -> Result<User, Error>;

    async fn get_place(&self, place_id: PlaceId) -> Result<Place, Error>;
    /// Places owned by a user, in the order of the user's place list
    async fn get_places_by_user(&self, user_id: UserId) -> Result<Vec<Place>, Error>;
    /// Persist a new place and append it to its creator's place list
    async fn create_place(&self, place: Place) -> Result<Place, Error>;
    /// Store the editable fields of an existing place
    async fn update_place(&self, place: Place) -> Result<Place, Error>;
    /// Remove a place and drop it from its creator's place list, returning the removed place
    async fn delete_place(&self, place_id: PlaceId) -> Result<Place, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Domain-level error when a user does not exist
    #[error("user {0} does not exist")]
    UserNotFound(UserId),

    /// Domain-level error when a place does not exist
    #[error("place {0} does not exist")]
    PlaceNotFound(PlaceId),

    /// Another user already registered this email address
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
