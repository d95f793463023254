//! Mapbox forward geocoding.
//!
//! Only the best match is requested. Mapbox reports coordinates as `[lng, lat]`.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    domain::Location,
    ports::geocoding::{Error, GeocodingPort},
};

pub struct MapboxGeocoder {
    client: Client,
    endpoint: Url,
    access_token: String,
}

impl MapboxGeocoder {
    /// Build a geocoder with an explicit request timeout
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            access_token: access_token.into(),
        })
    }

    /// `{endpoint}/{address}.json?access_token=..&limit=1`, with the address percent-encoded
    fn request_url(&self, address: &str) -> Result<Url, Error> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Adapter("geocoding endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .push(&format!("{address}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .append_pair("limit", "1");
        Ok(url)
    }
}

#[async_trait::async_trait]
impl GeocodingPort for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> Result<Location, Error> {
        let url = self.request_url(address)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| Error::Adapter(Box::new(err)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| Error::Adapter(Box::new(err)))?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "geocoding request rejected");
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        parse_location(body.as_ref(), address)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponseDto {
    #[serde(default)]
    features: Vec<FeatureDto>,
}

#[derive(Debug, Deserialize)]
struct FeatureDto {
    center: [f64; 2],
}

fn parse_location(body: &[u8], address: &str) -> Result<Location, Error> {
    let decoded: GeocodingResponseDto = serde_json::from_slice(body)
        .map_err(|err| Error::Decode(format!("invalid geocoding payload: {err}")))?;

    let Some(feature) = decoded.features.into_iter().next() else {
        return Err(Error::NoResults(address.to_string()));
    };
    let [lng, lat] = feature.center;
    if !lng.is_finite() || !lat.is_finite() {
        return Err(Error::Decode("non-finite coordinates".to_string()));
    }

    Ok(Location { lat, lng })
}
