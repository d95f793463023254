use crate::{
    domain::{Place, PlaceId, User, UserId},
    ports::database::{DatabasePort, Error},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// In-process store
///
/// Users and places live behind a single lock. Every atomic unit checks all of its
/// preconditions before its first write, so a failed unit leaves nothing behind.
#[derive(Clone, Debug)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    places: HashMap<PlaceId, Place>,
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn get_user(&self, user_id: UserId) -> Result<User, Error> {
        self.state
            .lock()?
            .users
            .get(&user_id)
            .cloned()
            .ok_or(Error::UserNotFound(user_id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = self
            .state
            .lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned();

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        let mut users: Vec<User> = self.state.lock()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.email.cmp(&b.email)));

        Ok(users)
    }

    async fn insert_user(&self, user: User) -> Result<User, Error> {
        let mut state = self.state.lock()?;
        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(Error::EmailTaken(user.email));
        }
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_place(&self, place_id: PlaceId) -> Result<Place, Error> {
        self.state
            .lock()?
            .places
            .get(&place_id)
            .cloned()
            .ok_or(Error::PlaceNotFound(place_id))
    }

    async fn get_places_by_user(&self, user_id: UserId) -> Result<Vec<Place>, Error> {
        let state = self.state.lock()?;
        let user = state
            .users
            .get(&user_id)
            .ok_or(Error::UserNotFound(user_id))?;
        let places = user
            .places
            .iter()
            .filter_map(|place_id| state.places.get(place_id))
            .cloned()
            .collect();

        Ok(places)
    }

    async fn create_place(&self, place: Place) -> Result<Place, Error> {
        let mut guard = self.state.lock()?;
        let State { users, places } = &mut *guard;

        // Check the owner before touching anything
        let owner = users
            .get_mut(&place.creator())
            .ok_or(Error::UserNotFound(place.creator()))?;

        places.insert(place.id, place.clone());
        owner.places.push(place.id);

        Ok(place)
    }

    async fn update_place(&self, place: Place) -> Result<Place, Error> {
        let mut state = self.state.lock()?;
        let stored = state
            .places
            .get_mut(&place.id)
            .ok_or(Error::PlaceNotFound(place.id))?;
        // Only the editable fields are taken over
        stored.revise(place.title, place.description);

        Ok(stored.clone())
    }

    async fn delete_place(&self, place_id: PlaceId) -> Result<Place, Error> {
        let mut guard = self.state.lock()?;
        let State { users, places } = &mut *guard;

        let removed = places
            .remove(&place_id)
            .ok_or(Error::PlaceNotFound(place_id))?;
        if let Some(owner) = users.get_mut(&removed.creator()) {
            owner.places.retain(|id| *id != place_id);
        }

        Ok(removed)
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
