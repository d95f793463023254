use crate::domain::Identity;

/// Signed, time-limited identity tokens
#[mockall::automock]
pub trait TokenPort: Send + Sync {
    fn sign(&self, identity: &Identity) -> Result<String, Error>;
    /// Decode a token, rejecting expired or tampered ones
    fn verify(&self, token: &str) -> Result<Identity, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("token has expired")]
    Expired,

    #[error("token is invalid: {0}")]
    Invalid(String),

    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
