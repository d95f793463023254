/// One-way credential hashing
///
/// Hashing is deliberately slow, so implementations must not run it on the async workers.
#[mockall::automock]
#[async_trait::async_trait]
pub trait PasswordHasherPort: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, Error>;
    /// Check a password against a stored hash
    ///
    /// A mismatch is `Ok(false)`. Errors are reserved for hashes that cannot be processed.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
