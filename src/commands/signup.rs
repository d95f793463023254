use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::{
    domain::{is_valid_email, normalize_email, ImageRef, User},
    ports::{credentials::PasswordHasherPort, database::DatabasePort, tokens::TokenPort},
};

use super::{invalid_input, AuthResponse, Error, UserLogic, WorkflowFuture, MIN_PASSWORD_LEN};

pub struct SignupRequest {
    name: String,
    email: String,
    password: String,
    image: ImageRef,
}

impl SignupRequest {
    /// Validate and normalise signup input
    pub fn new(
        name: impl Into<String>,
        email: &str,
        password: impl Into<String>,
        image: ImageRef,
    ) -> Result<Self, Error> {
        let name = name.into();
        let email = normalize_email(email);
        let password = password.into();

        if name.trim().is_empty()
            || !is_valid_email(&email)
            || password.chars().count() < MIN_PASSWORD_LEN
        {
            return Err(invalid_input());
        }

        Ok(Self {
            name,
            email,
            password,
            image,
        })
    }
}

impl<D, H, T> Service<SignupRequest> for UserLogic<D, H, T>
where
    D: DatabasePort + ?Sized + 'static,
    H: PasswordHasherPort + ?Sized + 'static,
    T: TokenPort + ?Sized + 'static,
{
    type Response = AuthResponse;
    type Error = Error;
    type Future = WorkflowFuture<AuthResponse>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SignupRequest) -> Self::Future {
        let database = self.database.clone();
        let hasher = self.hasher.clone();
        let tokens = self.tokens.clone();
        Box::pin(async move {
            if database.find_user_by_email(&req.email).await?.is_some() {
                return Err(Error::Conflict(
                    "User exists already, please login instead.".into(),
                ));
            }

            let password_hash = hasher.hash(&req.password).await?;
            // The store enforces email uniqueness too, for signups racing past the check above
            let user = database
                .insert_user(User::new(req.name, req.email, password_hash, req.image))
                .await?;

            let identity = user.identity();
            let token = tokens.sign(&identity)?;

            info!(user_id = %user.id, "user signed up");
            Ok(AuthResponse { identity, token })
        })
    }
}
