use std::task::{Context, Poll};

use tower::Service;
use tracing::{info, warn};

use crate::{
    domain::{PlaceId, UserId},
    ports::{database::DatabasePort, storage::FileStoragePort},
};

use super::{Error, PlaceLogic, WorkflowFuture};

pub struct DeletePlaceRequest {
    place_id: PlaceId,
    requester: UserId,
}

impl DeletePlaceRequest {
    pub fn new(place_id: PlaceId, requester: UserId) -> Self {
        Self {
            place_id,
            requester,
        }
    }
}

impl<D, G, F> Service<DeletePlaceRequest> for PlaceLogic<D, G, F>
where
    D: DatabasePort + ?Sized + 'static,
    G: ?Sized,
    F: FileStoragePort + ?Sized + 'static,
{
    type Response = ();
    type Error = Error;
    type Future = WorkflowFuture<()>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DeletePlaceRequest) -> Self::Future {
        let database = self.database.clone();
        let files = self.files.clone();
        Box::pin(async move {
            let place = database.get_place(req.place_id).await?;

            if !place.is_owned_by(req.requester) {
                warn!(place_id = %place.id, requester = %req.requester, "refusing delete by non-owner");
                return Err(Error::Forbidden(
                    "You are not allowed to delete this place.".into(),
                ));
            }

            // Place record and the creator's place list are removed as one unit
            let removed = database.delete_place(place.id).await?;
            info!(place_id = %removed.id, creator = %removed.creator(), "place deleted");

            // Best effort: the records are already gone
            if let Err(err) = files.remove(removed.image()).await {
                warn!(
                    place_id = %removed.id,
                    image = %removed.image(),
                    error = %err,
                    "could not remove place image"
                );
            }

            Ok(())
        })
    }
}
