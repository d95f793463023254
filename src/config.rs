use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::Parser;
use reqwest::Url;

/// Places service: share geocoded places with images
///
/// Every option can also be set from the environment, or from a `.env` file.
#[derive(Debug, Parser)]
#[command(name = "places-service", version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "PLACES_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// PostgreSQL connection string. Data is kept in memory when unset.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Shared secret for signing tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token validity in seconds
    #[arg(long, env = "PLACES_TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: u32,

    /// Mapbox access token
    #[arg(long, env = "MAPBOX_KEY", hide_env_values = true)]
    pub mapbox_key: String,

    #[arg(
        long,
        env = "MAPBOX_ENDPOINT",
        default_value = "https://api.mapbox.com/geocoding/v5/mapbox.places"
    )]
    pub mapbox_endpoint: Url,

    #[arg(long, env = "PLACES_GEOCODING_TIMEOUT_SECS", default_value_t = 10)]
    pub geocoding_timeout_secs: u64,

    /// Directory uploaded images are written to
    #[arg(long, env = "PLACES_UPLOAD_DIR", default_value = "uploads/images")]
    pub upload_dir: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "PLACES_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log as JSON lines
    #[arg(long, env = "PLACES_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.token_ttl_secs))
    }

    pub fn geocoding_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoding_timeout_secs)
    }
}
