use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::{
    domain::{ImageRef, Place, UserId},
    ports::{database::DatabasePort, geocoding::GeocodingPort},
};

use super::{invalid_input, validate_place_fields, Error, PlaceLogic, WorkflowFuture};

pub struct CreatePlaceRequest {
    title: String,
    description: String,
    address: String,
    image: ImageRef,
    requester: UserId,
}

impl CreatePlaceRequest {
    /// Validate the input for a new place
    ///
    /// `image` must reference an upload that was already stored. If the request fails later on,
    /// removing that upload is up to the caller.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        address: impl Into<String>,
        image: ImageRef,
        requester: UserId,
    ) -> Result<Self, Error> {
        let title = title.into();
        let description = description.into();
        let address = address.into();

        validate_place_fields(&title, &description)?;
        if address.trim().is_empty() {
            return Err(invalid_input());
        }

        Ok(Self {
            title,
            description,
            address,
            image,
            requester,
        })
    }
}

impl<D, G, F> Service<CreatePlaceRequest> for PlaceLogic<D, G, F>
where
    D: DatabasePort + ?Sized + 'static,
    G: GeocodingPort + ?Sized + 'static,
    F: ?Sized,
{
    type Response = Place;
    type Error = Error;
    type Future = WorkflowFuture<Place>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CreatePlaceRequest) -> Self::Future {
        let database = self.database.clone();
        let geocoder = self.geocoder.clone();
        Box::pin(async move {
            // Each step depends on the previous one, so they run in sequence
            let location = geocoder.geocode(&req.address).await?;
            let creator = database.get_user(req.requester).await?;

            let place = Place::new(
                req.title,
                req.description,
                req.address,
                location,
                req.image,
                creator.id,
            );

            // Place record and the creator's place list are written as one unit
            let created = database.create_place(place).await?;

            info!(place_id = %created.id, creator = %creator.id, "place created");
            Ok(created)
        })
    }
}
