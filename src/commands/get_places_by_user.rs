use std::task::{Context, Poll};

use tower::Service;

use crate::{
    domain::{Place, UserId},
    ports::database::DatabasePort,
};

use super::{Error, PlaceLogic, WorkflowFuture};

pub struct GetPlacesByUserRequest {
    user_id: UserId,
}

impl GetPlacesByUserRequest {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

impl<D, G, F> Service<GetPlacesByUserRequest> for PlaceLogic<D, G, F>
where
    D: DatabasePort + ?Sized + 'static,
    G: ?Sized,
    F: ?Sized,
{
    type Response = Vec<Place>;
    type Error = Error;
    type Future = WorkflowFuture<Vec<Place>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetPlacesByUserRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            let places = database.get_places_by_user(req.user_id).await?;
            // An existing user without places is reported like an unknown user
            if places.is_empty() {
                return Err(Error::NotFound(
                    "Could not find places for the provided user id.".into(),
                ));
            }
            Ok(places)
        })
    }
}
