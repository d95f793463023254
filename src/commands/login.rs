use std::task::{Context, Poll};

use tower::Service;
use tracing::{debug, info};

use crate::{
    domain::normalize_email,
    ports::{credentials::PasswordHasherPort, database::DatabasePort, tokens::TokenPort},
};

use super::{AuthResponse, Error, UserLogic, WorkflowFuture};

pub struct LoginRequest {
    email: String,
    password: String,
}

impl LoginRequest {
    pub fn new(email: &str, password: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email),
            password: password.into(),
        }
    }
}

impl<D, H, T> Service<LoginRequest> for UserLogic<D, H, T>
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

    fn call(&mut self, req: LoginRequest) -> Self::Future {
        let database = self.database.clone();
        let hasher = self.hasher.clone();
        let tokens = self.tokens.clone();
        Box::pin(async move {
            // Unknown email and wrong password must look the same to the caller
            let Some(user) = database.find_user_by_email(&req.email).await? else {
                debug!("login for unknown email");
                return Err(Error::Unauthorized);
            };
            if !hasher.verify(&req.password, &user.password_hash).await? {
                debug!(user_id = %user.id, "login with wrong password");
                return Err(Error::Unauthorized);
            }

            let identity = user.identity();
            let token = tokens.sign(&identity)?;

            info!(user_id = %user.id, "user logged in");
            Ok(AuthResponse { identity, token })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase,
        commands::test_support::user,
        domain::User,
        ports::{credentials::MockPasswordHasherPort, tokens::MockTokenPort},
    };
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    /// Hasher that accepts exactly one password
    fn hasher(accepted: &'static str) -> MockPasswordHasherPort {
        let mut hasher = MockPasswordHasherPort::new();
        hasher
            .expect_verify()
            .returning(move |password, _| Ok(password == accepted));
        hasher
    }

    fn tokens() -> MockTokenPort {
        let mut tokens = MockTokenPort::new();
        tokens
            .expect_sign()
            .returning(|identity| Ok(format!("token-{}", identity.user_id)));
        tokens
    }

    async fn database_with(user: &User) -> Result<MemoryDatabase, BoxError> {
        let database = MemoryDatabase::default();
        database.insert_user(user.clone()).await?;
        Ok(database)
    }

    #[rstest]
    #[tokio::test]
    async fn test_call() -> Result<(), BoxError> {
        // GIVEN a registered user
        let alice = user("Alice");
        let database = database_with(&alice).await?;
        let domain = UserLogic::new(
            Arc::new(database),
            Arc::new(hasher("secret123")),
            Arc::new(tokens()),
        );

        // WHEN logging in with the right credentials, with different casing
        let res = domain
            .oneshot(LoginRequest::new("ALICE@test.com", "secret123"))
            .await;

        // THEN a token is issued for that user
        assert_that!(res).is_ok().is_equal_to(AuthResponse {
            identity: alice.identity(),
            token: format!("token-{}", alice.id),
        });

        Ok(())
    }

    /// Both failure modes produce the very same error
    #[rstest]
    #[case("alice@test.com", "wrong-password")]
    #[case("nobody@test.com", "secret123")]
    #[tokio::test]
    async fn test_invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
    ) -> Result<(), BoxError> {
        let alice = user("Alice");
        let database = database_with(&alice).await?;
        let domain = UserLogic::new(
            Arc::new(database),
            Arc::new(hasher("secret123")),
            Arc::new(tokens()),
        );

        let res = domain.oneshot(LoginRequest::new(email, password)).await;

        assert_that!(res).is_err().matches(|err| {
            matches!(err, Error::Unauthorized)
                && err.user_message() == "Invalid credentials, could not log you in."
        });

        Ok(())
    }
}
