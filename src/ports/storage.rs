use crate::domain::ImageRef;

/// Storage for uploaded image files
#[mockall::automock]
#[async_trait::async_trait]
pub trait FileStoragePort: Send + Sync {
    /// Store an upload and return the reference recorded on the owning entity
    async fn store(&self, content_type: &str, bytes: Vec<u8>) -> Result<ImageRef, Error>;
    async fn remove(&self, image: &ImageRef) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported media type {0:?}")]
    UnsupportedMediaType(String),

    /// Refusing to touch a file this storage did not create
    #[error("{0} is outside of the upload storage")]
    OutsideStorage(String),

    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
