use std::fmt;

use uuid::Uuid;

/// Unique identifier for a [`User`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a [`Place`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceId(pub Uuid);

impl PlaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Geographic coordinates resolved from an address
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Reference to an uploaded image asset
///
/// The core never looks inside this value. It is recorded on creation and handed back to the
/// storage port when the owning record goes away.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered account
#[derive(Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Normalised email address, unique across users
    pub email: String,
    /// One-way credential hash. Never leaves the service.
    pub password_hash: String,
    pub image: ImageRef,
    /// Places created by this user, in creation order
    ///
    /// Only the place workflow changes this list, and only together with the place itself.
    pub places: Vec<PlaceId>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        image: ImageRef,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            image,
            places: Vec::default(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            email: self.email.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("image", &self.image)
            .field("places", &self.places)
            .finish_non_exhaustive()
    }
}

/// A geocoded place owned by a single user
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub id: PlaceId,
    pub title: String,
    pub description: String,
    pub address: String,
    location: Location,
    image: ImageRef,
    creator: UserId,
}

impl Place {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        address: impl Into<String>,
        location: Location,
        image: ImageRef,
        creator: UserId,
    ) -> Self {
        Self::restore(
            PlaceId::new(),
            title.into(),
            description.into(),
            address.into(),
            location,
            image,
            creator,
        )
    }

    /// Rebuild a place that was already persisted
    pub fn restore(
        id: PlaceId,
        title: String,
        description: String,
        address: String,
        location: Location,
        image: ImageRef,
        creator: UserId,
    ) -> Self {
        Self {
            id,
            title,
            description,
            address,
            location,
            image,
            creator,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn creator(&self) -> UserId {
        self.creator
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.creator == user_id
    }

    /// Replace the editable fields
    ///
    /// Location, image and creator are fixed at creation.
    pub fn revise(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.title = title.into();
        self.description = description.into();
    }
}

/// Identity asserted by a verified token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose syntactic check: one `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    }
}
