use crate::domain::Location;

#[mockall::automock]
#[async_trait::async_trait]
pub trait GeocodingPort: Send + Sync {
    /// Resolve a free-text address to coordinates
    async fn geocode(&self, address: &str) -> Result<Location, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The geocoding service knows no location for this address
    #[error("no location found for address {0:?}")]
    NoResults(String),

    /// The geocoding service answered with a non-success status
    #[error("geocoding service responded with status {status}")]
    Upstream { status: u16 },

    /// The geocoding service answered with a body we could not read
    #[error("could not decode geocoding response: {0}")]
    Decode(String),

    /// Concrete adapter errors
    ///
    /// Transport failures, timeouts and misconfiguration end up here.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
