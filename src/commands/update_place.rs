use std::task::{Context, Poll};

use tower::Service;
use tracing::{info, warn};

use crate::{
    domain::{Place, PlaceId, UserId},
    ports::database::DatabasePort,
};

use super::{validate_place_fields, Error, PlaceLogic, WorkflowFuture};

pub struct UpdatePlaceRequest {
    place_id: PlaceId,
    title: String,
    description: String,
    requester: UserId,
}

impl UpdatePlaceRequest {
    pub fn new(
        place_id: PlaceId,
        title: impl Into<String>,
        description: impl Into<String>,
        requester: UserId,
    ) -> Result<Self, Error> {
        let title = title.into();
        let description = description.into();
        validate_place_fields(&title, &description)?;

        Ok(Self {
            place_id,
            title,
            description,
            requester,
        })
    }
}

impl<D, G, F> Service<UpdatePlaceRequest> for PlaceLogic<D, G, F>
where
    D: DatabasePort + ?Sized + 'static,
    G: ?Sized,
    F: ?Sized,
{
    type Response = Place;
    type Error = Error;
    type Future = WorkflowFuture<Place>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UpdatePlaceRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let mut place = database.get_place(req.place_id).await?;

            if !place.is_owned_by(req.requester) {
                warn!(place_id = %place.id, requester = %req.requester, "refusing update by non-owner");
                return Err(Error::Forbidden(
                    "You are not allowed to edit this place.".into(),
                ));
            }

            place.revise(req.title, req.description);
            let updated = database.update_place(place).await?;

            info!(place_id = %updated.id, "place updated");
            Ok(updated)
        })
    }
}
