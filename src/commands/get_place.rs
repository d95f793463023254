use std::task::{Context, Poll};

use tower::Service;

use crate::{
    domain::{Place, PlaceId},
    ports::database::DatabasePort,
};

use super::{Error, PlaceLogic, WorkflowFuture};

pub struct GetPlaceRequest {
    place_id: PlaceId,
}

impl GetPlaceRequest {
    pub fn new(place_id: PlaceId) -> Self {
        Self { place_id }
    }
}

impl<D, G, F> Service<GetPlaceRequest> for PlaceLogic<D, G, F>
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

    fn call(&mut self, req: GetPlaceRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move { Ok(database.get_place(req.place_id).await?) })
    }
}
