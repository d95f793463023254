//! Router tests: requests go through the whole stack in-process.

use std::path::PathBuf;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request, Response, StatusCode,
    },
};
use serde_json::{json, Value};
use speculoos::prelude::*;
use tempfile::TempDir;
use tower::{BoxError, ServiceExt};

use super::*;
use crate::{
    adapters::{
        credentials::argon2_hasher::Argon2Hasher, database::memory::MemoryDatabase,
        storage::local::LocalFileStorage, tokens::jwt::JwtTokens,
    },
    domain::{Identity, ImageRef, Location, Place, PlaceId, User},
    ports::{
        database::{self, MockDatabasePort},
        geocoding::{self, MockGeocodingPort},
    },
};

const BOUNDARY: &str = "places-test-boundary";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

struct Harness {
    app: Router,
    database: MemoryDatabase,
    files: LocalFileStorage,
    tokens: Arc<JwtTokens>,
    upload_dir: PathBuf,
    _dir: TempDir,
}

impl Harness {
    async fn new(geocoder: MockGeocodingPort) -> Result<Self, BoxError> {
        let database = MemoryDatabase::default();
        Self::build(geocoder, database.clone(), Arc::new(database)).await
    }

    /// Requests go to `store`; the harness' own memory database stays empty
    async fn with_database(
        geocoder: MockGeocodingPort,
        store: Arc<dyn DatabasePort>,
    ) -> Result<Self, BoxError> {
        Self::build(geocoder, MemoryDatabase::default(), store).await
    }

    async fn build(
        geocoder: MockGeocodingPort,
        database: MemoryDatabase,
        store: Arc<dyn DatabasePort>,
    ) -> Result<Self, BoxError> {
        let dir = tempfile::tempdir()?;
        let upload_dir = dir.path().join("uploads/images");
        let files = LocalFileStorage::new(&upload_dir).await?;
        let tokens = Arc::new(JwtTokens::new(b"test-secret", chrono::Duration::hours(1)));

        let state = AppState::new(
            store,
            Arc::new(geocoder),
            Arc::new(files.clone()),
            Arc::new(Argon2Hasher::default()),
            tokens.clone(),
        );

        Ok(Self {
            app: router(state, &upload_dir),
            database,
            files,
            tokens,
            upload_dir,
            _dir: dir,
        })
    }

    async fn send(&self, req: Request<Body>) -> Result<Response<Body>, BoxError> {
        Ok(self.app.clone().oneshot(req).await?)
    }

    /// A stored user with a token for it
    async fn user(&self, name: &str) -> Result<(User, String), BoxError> {
        let user = self
            .database
            .insert_user(User::new(
                name,
                format!("{}@test.com", name.to_lowercase()),
                "hash",
                ImageRef::new("uploads/images/avatar.png"),
            ))
            .await?;
        let token = self.token_for(&user.identity())?;
        Ok((user, token))
    }

    fn token_for(&self, identity: &Identity) -> Result<String, BoxError> {
        Ok(self.tokens.sign(identity)?)
    }

    /// A stored place owned by `owner` whose image is a real upload
    async fn place(&self, owner: &User) -> Result<Place, BoxError> {
        let image = self.files.store("image/png", PNG.to_vec()).await?;
        let place = Place::new(
            "Empire State Building",
            "One of the most famous sky scrapers in the world!",
            "20 W 34th St, New York, NY 10001",
            Location {
                lat: 40.7484405,
                lng: -73.9878584,
            },
            image,
            owner.id,
        );
        Ok(self.database.create_place(place).await?)
    }

    fn stored_uploads(&self) -> Result<usize, BoxError> {
        Ok(std::fs::read_dir(&self.upload_dir)?.count())
    }
}

fn multipart(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"image\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn multipart_request(uri: &str, token: Option<&str>, body: Body) -> Result<Request<Body>, BoxError> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(body)?)
}

fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Result<Request<Body>, BoxError> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Result<Request<Body>, BoxError> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

async fn json_body(res: Response<Body>) -> Result<Value, BoxError> {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn resolving_geocoder() -> MockGeocodingPort {
    let mut geocoder = MockGeocodingPort::new();
    geocoder.expect_geocode().returning(|_| {
        Ok(Location {
            lat: 37.42,
            lng: -122.08,
        })
    });
    geocoder
}

fn place_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("title", "Googleplex"),
        ("description", "Headquarters of a search company"),
        ("address", "1600 Amphitheatre Parkway"),
    ]
}

#[tokio::test]
async fn test_unknown_route() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;

    let res = harness.send(empty_request("GET", "/api/nothing-here", None)?).await?;

    assert_that!(res.status()).is_equal_to(StatusCode::NOT_FOUND);
    assert_that!(json_body(res).await?)
        .is_equal_to(json!({ "message": "Could not find this route." }));
    Ok(())
}

#[tokio::test]
async fn test_create_place() -> Result<(), BoxError> {
    // GIVEN a registered user and a geocoder resolving the address
    let harness = Harness::new(resolving_geocoder()).await?;
    let (user, token) = harness.user("Max").await?;

    // WHEN posting a new place with an image
    let req = multipart_request(
        "/api/places",
        Some(&token),
        multipart(&place_form(), Some(("image/png", PNG))),
    )?;
    let res = harness.send(req).await?;

    // THEN
    // * the place is created with the derived location
    // * the creator owns it
    // * the image is stored in the upload directory
    assert_that!(res.status()).is_equal_to(StatusCode::CREATED);
    let body = json_body(res).await?;
    let place = &body["place"];
    assert_that!(place["title"]).is_equal_to(json!("Googleplex"));
    assert_that!(place["location"]).is_equal_to(json!({ "lat": 37.42, "lng": -122.08 }));
    assert_that!(place["creator"]).is_equal_to(json!(user.id.0));
    assert_that!(place["image"].as_str().map(|image| image.ends_with(".png")))
        .is_equal_to(Some(true));

    let owner = harness.database.get_user(user.id).await?;
    assert_that!(owner.places.len()).is_equal_to(1);
    assert_that!(json!(owner.places[0].0)).is_equal_to(place["id"].clone());
    assert_that!(harness.stored_uploads()?).is_equal_to(1);

    // AND it can be read back by id
    let uri = format!("/api/places/{}", owner.places[0]);
    let res = harness.send(empty_request("GET", &uri, None)?).await?;
    assert_that!(res.status()).is_equal_to(StatusCode::OK);
    assert_that!(json_body(res).await?["place"].clone()).is_equal_to(place.clone());

    Ok(())
}

#[tokio::test]
async fn test_create_place_unauthenticated() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;

    for token in [None, Some("not-a-token")] {
        let req = multipart_request(
            "/api/places",
            token,
            multipart(&place_form(), Some(("image/png", PNG))),
        )?;
        let res = harness.send(req).await?;

        assert_that!(res.status()).is_equal_to(StatusCode::UNAUTHORIZED);
        assert_that!(json_body(res).await?)
            .is_equal_to(json!({ "message": "Authentication failed!" }));
    }
    assert_that!(harness.stored_uploads()?).is_equal_to(0);

    Ok(())
}

#[tokio::test]
async fn test_create_place_unresolvable_address() -> Result<(), BoxError> {
    // GIVEN a geocoder that knows no location for the address
    let mut geocoder = MockGeocodingPort::new();
    geocoder
        .expect_geocode()
        .times(1)
        .returning(|address| Err(geocoding::Error::NoResults(address.to_string())));
    let harness = Harness::new(geocoder).await?;
    let (user, token) = harness.user("Max").await?;

    // WHEN posting a new place
    let req = multipart_request(
        "/api/places",
        Some(&token),
        multipart(&place_form(), Some(("image/png", PNG))),
    )?;
    let res = harness.send(req).await?;

    // THEN
    // * the request is rejected
    // * the user owns no place
    // * the uploaded image was removed again
    assert_that!(res.status()).is_equal_to(StatusCode::UNPROCESSABLE_ENTITY);
    assert_that!(harness.database.get_user(user.id).await?.places.is_empty()).is_true();
    assert_that!(harness.stored_uploads()?).is_equal_to(0);

    Ok(())
}

#[tokio::test]
async fn test_create_place_persistence_failure() -> Result<(), BoxError> {
    // GIVEN a store that fails while writing the place
    let owner = User::new(
        "Max",
        "max@test.com",
        "hash",
        ImageRef::new("uploads/images/avatar.png"),
    );
    let mut store = MockDatabasePort::new();
    store.expect_get_user().returning({
        let owner = owner.clone();
        move |_| Ok(owner.clone())
    });
    store
        .expect_create_place()
        .times(1)
        .returning(|_| Err(database::Error::Adapter("connection reset by peer".into())));
    let harness = Harness::with_database(resolving_geocoder(), Arc::new(store)).await?;
    let token = harness.token_for(&owner.identity())?;

    // WHEN posting a new place
    let req = multipart_request(
        "/api/places",
        Some(&token),
        multipart(&place_form(), Some(("image/png", PNG))),
    )?;
    let res = harness.send(req).await?;

    // THEN
    // * the failure is reported without its cause
    // * the uploaded image was removed again
    assert_that!(res.status()).is_equal_to(StatusCode::INTERNAL_SERVER_ERROR);
    assert_that!(json_body(res).await?)
        .is_equal_to(json!({ "message": "Something went wrong, please try again later." }));
    assert_that!(harness.stored_uploads()?).is_equal_to(0);

    Ok(())
}

#[tokio::test]
async fn test_create_place_invalid_input() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;
    let (_, token) = harness.user("Max").await?;

    // Description too short
    let fields = [
        ("title", "Googleplex"),
        ("description", "abc"),
        ("address", "1600 Amphitheatre Parkway"),
    ];
    let req = multipart_request(
        "/api/places",
        Some(&token),
        multipart(&fields, Some(("image/png", PNG))),
    )?;
    let res = harness.send(req).await?;

    assert_that!(res.status()).is_equal_to(StatusCode::UNPROCESSABLE_ENTITY);
    assert_that!(harness.stored_uploads()?).is_equal_to(0);

    // Unsupported image type
    let req = multipart_request(
        "/api/places",
        Some(&token),
        multipart(&place_form(), Some(("image/gif", b"GIF89a".as_slice()))),
    )?;
    let res = harness.send(req).await?;

    assert_that!(res.status()).is_equal_to(StatusCode::UNPROCESSABLE_ENTITY);
    assert_that!(harness.stored_uploads()?).is_equal_to(0);

    // No image at all
    let req = multipart_request("/api/places", Some(&token), multipart(&place_form(), None))?;
    let res = harness.send(req).await?;

    assert_that!(res.status()).is_equal_to(StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn test_update_place() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;
    let (owner, owner_token) = harness.user("Alice").await?;
    let (_, other_token) = harness.user("Bob").await?;
    let place = harness.place(&owner).await?;
    let uri = format!("/api/places/{}", place.id);
    let body = json!({ "title": "Empire State", "description": "Still very tall indeed" });

    // Another user may not edit the place
    let res = harness
        .send(json_request("PATCH", &uri, Some(&other_token), body.clone())?)
        .await?;
    assert_that!(res.status()).is_equal_to(StatusCode::FORBIDDEN);
    assert_that!(harness.database.get_place(place.id).await?).is_equal_to(place.clone());

    // The owner may
    let res = harness
        .send(json_request("PATCH", &uri, Some(&owner_token), body)?)
        .await?;
    assert_that!(res.status()).is_equal_to(StatusCode::OK);
    let json = json_body(res).await?;
    assert_that!(json["place"]["title"]).is_equal_to(json!("Empire State"));
    assert_that!(json["place"]["address"]).is_equal_to(json!(place.address));

    // Malformed bodies are rejected
    let res = harness
        .send(json_request(
            "PATCH",
            &uri,
            Some(&owner_token),
            json!({ "title": "Empire State" }),
        )?)
        .await?;
    assert_that!(res.status()).is_equal_to(StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn test_delete_place() -> Result<(), BoxError> {
    // GIVEN a place owned by Alice with a stored image
    let harness = Harness::new(MockGeocodingPort::new()).await?;
    let (owner, owner_token) = harness.user("Alice").await?;
    let (_, other_token) = harness.user("Bob").await?;
    let place = harness.place(&owner).await?;
    let uri = format!("/api/places/{}", place.id);

    // WHEN Bob deletes it
    let res = harness
        .send(empty_request("DELETE", &uri, Some(&other_token))?)
        .await?;

    // THEN nothing changes
    assert_that!(res.status()).is_equal_to(StatusCode::FORBIDDEN);
    assert_that!(harness.database.get_place(place.id).await).is_ok();
    assert_that!(harness.stored_uploads()?).is_equal_to(1);

    // WHEN Alice deletes it
    let res = harness
        .send(empty_request("DELETE", &uri, Some(&owner_token))?)
        .await?;

    // THEN the place, the back-reference and the image are gone
    assert_that!(res.status()).is_equal_to(StatusCode::OK);
    assert_that!(json_body(res).await?).is_equal_to(json!({ "message": "Deleted place." }));
    assert_that!(harness.database.get_place(place.id).await).is_err();
    assert_that!(harness.database.get_user(owner.id).await?.places.is_empty()).is_true();
    assert_that!(harness.stored_uploads()?).is_equal_to(0);

    Ok(())
}

#[tokio::test]
async fn test_get_places_by_user() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;
    let (owner, _) = harness.user("Alice").await?;
    let (other, _) = harness.user("Bob").await?;
    let place = harness.place(&owner).await?;

    let res = harness
        .send(empty_request("GET", &format!("/api/places/users/{}", owner.id), None)?)
        .await?;
    assert_that!(res.status()).is_equal_to(StatusCode::OK);
    let json = json_body(res).await?;
    assert_that!(json["places"][0]["id"]).is_equal_to(json!(place.id.0));

    // A user without places and a malformed id are both not found
    for uid in [other.id.to_string(), "not-a-uuid".to_string()] {
        let res = harness
            .send(empty_request("GET", &format!("/api/places/users/{uid}"), None)?)
            .await?;
        assert_that!(res.status()).is_equal_to(StatusCode::NOT_FOUND);
    }

    Ok(())
}

#[tokio::test]
async fn test_get_place_unknown() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;

    for id in [PlaceId::new().to_string(), "p1".to_string()] {
        let res = harness
            .send(empty_request("GET", &format!("/api/places/{id}"), None)?)
            .await?;

        assert_that!(res.status()).is_equal_to(StatusCode::NOT_FOUND);
        assert_that!(json_body(res).await?)
            .is_equal_to(json!({ "message": "Could not find place for the provided id." }));
    }

    Ok(())
}

#[tokio::test]
async fn test_signup_and_login() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;
    let fields = [
        ("name", "Max"),
        ("email", " Max@Test.com "),
        ("password", "secret-password"),
    ];

    // Signup stores the avatar and returns a working token
    let req = multipart_request(
        "/api/users/signup",
        None,
        multipart(&fields, Some(("image/jpeg", PNG))),
    )?;
    let res = harness.send(req).await?;
    assert_that!(res.status()).is_equal_to(StatusCode::CREATED);
    let json = json_body(res).await?;
    assert_that!(json["email"]).is_equal_to(json!("max@test.com"));
    assert_that!(harness.stored_uploads()?).is_equal_to(1);

    let token = json["token"].as_str().unwrap_or_default().to_string();
    let identity = harness.tokens.verify(&token)?;
    assert_that!(json!(identity.user_id.0)).is_equal_to(json["userId"].clone());

    // Signing up again with the same email is a conflict and leaves no upload behind
    let req = multipart_request(
        "/api/users/signup",
        None,
        multipart(&fields, Some(("image/png", PNG))),
    )?;
    let res = harness.send(req).await?;
    assert_that!(res.status()).is_equal_to(StatusCode::UNPROCESSABLE_ENTITY);
    assert_that!(harness.stored_uploads()?).is_equal_to(1);

    // Login with the right password
    let res = harness
        .send(json_request(
            "POST",
            "/api/users/login",
            None,
            json!({ "email": "max@test.com", "password": "secret-password" }),
        )?)
        .await?;
    assert_that!(res.status()).is_equal_to(StatusCode::OK);
    assert_that!(json_body(res).await?["userId"].clone()).is_equal_to(json["userId"].clone());

    // Wrong password and unknown email look the same
    for (email, password) in [("max@test.com", "wrong-password"), ("nobody@test.com", "secret-password")] {
        let res = harness
            .send(json_request(
                "POST",
                "/api/users/login",
                None,
                json!({ "email": email, "password": password }),
            )?)
            .await?;
        assert_that!(res.status()).is_equal_to(StatusCode::FORBIDDEN);
        assert_that!(json_body(res).await?)
            .is_equal_to(json!({ "message": "Invalid credentials, could not log you in." }));
    }

    // A body without credentials is refused the same way
    for body in [json!({ "password": "secret-password" }), json!({})] {
        let res = harness
            .send(json_request("POST", "/api/users/login", None, body)?)
            .await?;
        assert_that!(res.status()).is_equal_to(StatusCode::FORBIDDEN);
        assert_that!(json_body(res).await?)
            .is_equal_to(json!({ "message": "Invalid credentials, could not log you in." }));
    }

    // Listing users never exposes the credential
    let res = harness.send(empty_request("GET", "/api/users", None)?).await?;
    assert_that!(res.status()).is_equal_to(StatusCode::OK);
    let json = json_body(res).await?;
    assert_that!(json["users"].as_array().map(Vec::len)).is_equal_to(Some(1));
    assert_that!(json["users"][0].get("password_hash")).is_none();

    Ok(())
}

#[tokio::test]
async fn test_serves_uploads() -> Result<(), BoxError> {
    // GIVEN a place whose image lives in an absolute upload directory
    let harness = Harness::new(MockGeocodingPort::new()).await?;
    let (owner, _) = harness.user("Alice").await?;
    let place = harness.place(&owner).await?;
    assert_that!(harness.upload_dir.is_absolute()).is_true();

    // WHEN fetching the recorded image reference
    let res = harness
        .send(empty_request("GET", &format!("/{}", place.image()), None)?)
        .await?;

    // THEN the stored bytes are served under it
    assert_that!(place.image().as_str().starts_with(&UPLOADS_PATH[1..])).is_true();
    assert_that!(res.status()).is_equal_to(StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    assert_that!(bytes.to_vec()).is_equal_to(PNG.to_vec());

    Ok(())
}

#[tokio::test]
async fn test_cors_preflight() -> Result<(), BoxError> {
    let harness = Harness::new(MockGeocodingPort::new()).await?;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/places")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization")
        .body(Body::empty())?;

    let res = harness.send(req).await?;

    assert_that!(res.status().is_success()).is_true();
    assert_that!(res
        .headers()
        .get("access-control-allow-origin")
        .and_then(|value| value.to_str().ok()))
    .is_equal_to(Some("*"));

    Ok(())
}
