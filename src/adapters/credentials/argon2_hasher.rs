use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::ports::credentials::{Error, PasswordHasherPort};

/// Argon2id with the crate's default parameters, stored in PHC string format
///
/// Every hash runs on tokio's blocking pool.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

fn hash_blocking(argon2: &Argon2<'_>, password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| Error::Adapter(err.to_string().into()))
}

fn verify_blocking(argon2: &Argon2<'_>, password: &str, hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hash).map_err(|err| Error::MalformedHash(err.to_string()))?;
    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(Error::Adapter(err.to_string().into())),
    }
}

#[async_trait::async_trait]
impl PasswordHasherPort for Argon2Hasher {
    async fn hash(&self, password: &str) -> Result<String, Error> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(&argon2, &password))
            .await
            .map_err(|err| Error::Adapter(Box::new(err)))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_blocking(&argon2, &password, &hash))
            .await
            .map_err(|err| Error::Adapter(Box::new(err)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[tokio::test]
    async fn test_hash_and_verify() -> Result<(), Error> {
        let hasher = Argon2Hasher::default();

        let hash = hasher.hash("secret-password").await?;

        assert_that!(hash.starts_with("$argon2id$")).is_true();
        assert_that!(hash.contains("secret-password")).is_false();
        assert_that!(hasher.verify("secret-password", &hash).await?).is_true();
        assert_that!(hasher.verify("wrong-password", &hash).await?).is_false();

        Ok(())
    }

    #[tokio::test]
    async fn test_hashes_are_salted() -> Result<(), Error> {
        let hasher = Argon2Hasher::default();

        let first = hasher.hash("secret-password").await?;
        let second = hasher.hash("secret-password").await?;

        assert_that!(first).is_not_equal_to(second);

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_hash() {
        let hasher = Argon2Hasher::default();

        let res = hasher.verify("secret-password", "plaintext").await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::MalformedHash(_)));
    }

    /// `tokio::test` runs on a single thread: other tasks only run if the hash yields it
    #[tokio::test]
    async fn test_runtime_keeps_running_while_verifying() -> Result<(), Error> {
        // GIVEN a stored hash and a task counting how often it gets polled
        let hasher = Argon2Hasher::default();
        let hash = hasher.hash("secret-password").await?;

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = ticks.clone();
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            }
        });

        // WHEN verifying a password
        let valid = hasher.verify("secret-password", &hash).await?;
        ticker.abort();

        // THEN the other task made progress in the meantime
        assert_that!(valid).is_true();
        assert_that!(ticks.load(Ordering::SeqCst)).is_greater_than(0);

        Ok(())
    }
}
