//! PostgreSQL store.
//!
//! A user's owned places live in `user_places`, ordered by an insertion sequence. Creating and
//! deleting a place touch `places` and `user_places` inside one SQL transaction.

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    domain::{ImageRef, Location, Place, PlaceId, User, UserId},
    ports::database::{DatabasePort, Error},
};

const SCHEMA: &str = include_str!("schema.sql");
const MAX_CONNECTIONS: u32 = 5;

const PLACE_COLUMNS: &str = "id, title, description, address, lat, lng, image, creator_id";

#[derive(Clone, Debug)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Connect and make sure the schema exists
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    image: String,
    places: Vec<Uuid>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            image: ImageRef::new(row.image),
            places: row.places.into_iter().map(PlaceId).collect(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlaceRow {
    id: Uuid,
    title: String,
    description: String,
    address: String,
    lat: f64,
    lng: f64,
    image: String,
    creator_id: Uuid,
}

impl From<PlaceRow> for Place {
    fn from(row: PlaceRow) -> Self {
        Place::restore(
            PlaceId(row.id),
            row.title,
            row.description,
            row.address,
            Location {
                lat: row.lat,
                lng: row.lng,
            },
            ImageRef::new(row.image),
            UserId(row.creator_id),
        )
    }
}

/// Users with their place list aggregated in insertion order
fn user_query(clause: &str) -> String {
    format!(
        "SELECT u.id, u.name, u.email, u.password_hash, u.image, \
             COALESCE( \
                 array_agg(up.place_id ORDER BY up.position) FILTER (WHERE up.place_id IS NOT NULL), \
                 '{{}}' \
             ) AS places \
         FROM users u \
         LEFT JOIN user_places up ON up.user_id = u.id \
         {clause}"
    )
}

fn adapter(err: sqlx::Error) -> Error {
    Error::Adapter(Box::new(err))
}

#[async_trait::async_trait]
impl DatabasePort for PostgresDatabase {
    async fn get_user(&self, user_id: UserId) -> Result<User, Error> {
        let sql = user_query("WHERE u.id = $1 GROUP BY u.id");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(adapter)?
            .map(User::from)
            .ok_or(Error::UserNotFound(user_id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let sql = user_query("WHERE u.email = $1 GROUP BY u.id");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(adapter)?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        let sql = user_query("GROUP BY u.id ORDER BY u.name, u.email");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(adapter)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn insert_user(&self, user: User) -> Result<User, Error> {
        let res = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, image) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id.0)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.image.as_str())
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(Error::EmailTaken(user.email))
            }
            Err(err) => Err(adapter(err)),
        }
    }

    async fn get_place(&self, place_id: PlaceId) -> Result<Place, Error> {
        let sql = format!("SELECT {PLACE_COLUMNS} FROM places WHERE id = $1");
        sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(place_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(adapter)?
            .map(Place::from)
            .ok_or(Error::PlaceNotFound(place_id))
    }

    async fn get_places_by_user(&self, user_id: UserId) -> Result<Vec<Place>, Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(adapter)?;
        if !exists {
            return Err(Error::UserNotFound(user_id));
        }

        let rows = sqlx::query_as::<_, PlaceRow>(
            "SELECT p.id, p.title, p.description, p.address, p.lat, p.lng, p.image, p.creator_id \
             FROM user_places up \
             JOIN places p ON p.id = up.place_id \
             WHERE up.user_id = $1 \
             ORDER BY up.position",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(adapter)?;

        Ok(rows.into_iter().map(Place::from).collect())
    }

    async fn create_place(&self, place: Place) -> Result<Place, Error> {
        let mut tx = self.pool.begin().await.map_err(adapter)?;

        // Lock the owner so a concurrent delete of the same user's list waits for us
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(place.creator().0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(adapter)?;
        if owner.is_none() {
            // Dropping the transaction rolls it back
            return Err(Error::UserNotFound(place.creator()));
        }

        let location = place.location();
        sqlx::query(
            "INSERT INTO places (id, title, description, address, lat, lng, image, creator_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(place.id.0)
        .bind(&place.title)
        .bind(&place.description)
        .bind(&place.address)
        .bind(location.lat)
        .bind(location.lng)
        .bind(place.image().as_str())
        .bind(place.creator().0)
        .execute(&mut *tx)
        .await
        .map_err(adapter)?;

        sqlx::query("INSERT INTO user_places (user_id, place_id) VALUES ($1, $2)")
            .bind(place.creator().0)
            .bind(place.id.0)
            .execute(&mut *tx)
            .await
            .map_err(adapter)?;

        tx.commit().await.map_err(adapter)?;
        Ok(place)
    }

    async fn update_place(&self, place: Place) -> Result<Place, Error> {
        let sql = format!(
            "UPDATE places SET title = $2, description = $3 WHERE id = $1 RETURNING {PLACE_COLUMNS}"
        );
        sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(place.id.0)
            .bind(&place.title)
            .bind(&place.description)
            .fetch_optional(&self.pool)
            .await
            .map_err(adapter)?
            .map(Place::from)
            .ok_or(Error::PlaceNotFound(place.id))
    }

    async fn delete_place(&self, place_id: PlaceId) -> Result<Place, Error> {
        let mut tx = self.pool.begin().await.map_err(adapter)?;

        sqlx::query("DELETE FROM user_places WHERE place_id = $1")
            .bind(place_id.0)
            .execute(&mut *tx)
            .await
            .map_err(adapter)?;

        let sql = format!("DELETE FROM places WHERE id = $1 RETURNING {PLACE_COLUMNS}");
        let removed = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(place_id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(adapter)?;
        let Some(removed) = removed else {
            return Err(Error::PlaceNotFound(place_id));
        };

        tx.commit().await.map_err(adapter)?;
        Ok(removed.into())
    }
}
