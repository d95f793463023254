//! Seed data shared by the command tests.

use crate::{
    adapters::database::memory::MemoryDatabase,
    domain::{ImageRef, Location, Place, User},
    ports::database::DatabasePort,
};

pub(crate) fn user(name: &str) -> User {
    User::new(
        name,
        format!("{}@test.com", name.to_lowercase()),
        "hash",
        ImageRef::new(format!("uploads/images/{}.png", name.to_lowercase())),
    )
}

pub(crate) fn place_for(user: &User, title: &str) -> Place {
    Place::new(
        title,
        "One of the most famous sky scrapers in the world!",
        "20 W 34th St, New York, NY 10001",
        Location {
            lat: 40.7484405,
            lng: -73.9878584,
        },
        ImageRef::new(format!("uploads/images/{}.png", title.to_lowercase())),
        user.id,
    )
}

/// A database holding one user who owns one place
pub(crate) async fn seeded_database() -> (MemoryDatabase, User, Place) {
    let database = MemoryDatabase::default();
    let owner = database.insert_user(user("Alice")).await.unwrap();
    let place = database
        .create_place(place_for(&owner, "Empire"))
        .await
        .unwrap();
    let owner = database.get_user(owner.id).await.unwrap();
    (database, owner, place)
}
