use std::task::{Context, Poll};

use tower::Service;

use crate::{domain::User, ports::database::DatabasePort};

use super::{Error, UserLogic, WorkflowFuture};

#[derive(Default)]
pub struct ListUsersRequest;

impl<D, H, T> Service<ListUsersRequest> for UserLogic<D, H, T>
where
    D: DatabasePort + ?Sized + 'static,
    H: ?Sized,
    T: ?Sized,
{
    type Response = Vec<User>;
    type Error = Error;
    type Future = WorkflowFuture<Vec<User>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ListUsersRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move { Ok(database.list_users().await?) })
    }
}
