use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use places_service::{
    adapters::{
        credentials::argon2_hasher::Argon2Hasher,
        database::{memory::MemoryDatabase, postgres::PostgresDatabase},
        geocoding::mapbox::MapboxGeocoder,
        storage::local::LocalFileStorage,
        tokens::jwt::JwtTokens,
    },
    config::Config,
    inbound::http::{router, AppState},
    ports::database::DatabasePort,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_logging(&config.log_level, config.log_json)?;

    if config.jwt_secret.trim().is_empty() {
        bail!("JWT_SECRET must not be empty");
    }

    let database: Arc<dyn DatabasePort> = match &config.database_url {
        Some(url) => Arc::new(
            PostgresDatabase::connect(url)
                .await
                .context("Failed to connect to the database")?,
        ),
        None => {
            warn!("DATABASE_URL not set, data is kept in memory only");
            Arc::new(MemoryDatabase::default())
        }
    };
    let geocoder = MapboxGeocoder::new(
        config.mapbox_endpoint.clone(),
        config.mapbox_key.clone(),
        config.geocoding_timeout(),
    )
    .context("Failed to build the geocoding client")?;
    let files = LocalFileStorage::new(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;
    let tokens = JwtTokens::new(config.jwt_secret.as_bytes(), config.token_ttl());

    let state = AppState::new(
        database,
        Arc::new(geocoder),
        Arc::new(files),
        Arc::new(Argon2Hasher::default()),
        Arc::new(tokens),
    );
    let app = router(state, &config.upload_dir);

    let address = config.bind_address();
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    info!(%address, "places service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("places service shutting down");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let res = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    res.map_err(|err| anyhow::anyhow!("Failed to install log subscriber: {err}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal");
            }
            Err(err) => {
                error!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
