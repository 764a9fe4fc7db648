use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use journey_server::cache::CachedGeocoder;
use journey_server::config::JourneyConfig;
use journey_server::coordinator::{JourneyCoordinator, Route};
use journey_server::gmaps::{DistanceMatrixClient, DistanceMatrixConfig};
use journey_server::location::{InMemoryDirectory, LocationResolver};
use journey_server::nominatim::{NominatimClient, NominatimConfig};
use journey_server::remote::check_credentials;
use journey_server::sensors::SensorSet;
use journey_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match JourneyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let nominatim_config =
        NominatimConfig::new(&config.osm_username).with_timeout(config.request_timeout_secs);
    let nominatim = match NominatimClient::new(nominatim_config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create Nominatim client");
            return ExitCode::FAILURE;
        }
    };

    // Without destinations the key is never used.
    let gmaps_config = DistanceMatrixConfig::new(config.gmaps_token.clone().unwrap_or_default())
        .with_timeout(config.request_timeout_secs);
    let gmaps = match DistanceMatrixClient::new(gmaps_config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create Distance Matrix client");
            return ExitCode::FAILURE;
        }
    };

    if config.check_credentials {
        info!("Checking Google Maps credentials...");
        if !check_credentials(&gmaps).await {
            return ExitCode::FAILURE;
        }
    }

    let directory = Arc::new(InMemoryDirectory::new());
    let cancel = CancellationToken::new();

    let coordinator = JourneyCoordinator::new(
        Route::new(&config.origin, config.destinations.clone()),
        Arc::new(CachedGeocoder::new(nominatim, &config.cache)),
        Arc::new(gmaps),
        LocationResolver::new(Arc::clone(&directory)),
    )
    .spawn(&config.coordinator, cancel.clone());

    let sensors = SensorSet::new(
        sensor_id(&config.name),
        &config.name,
        config.destinations.len(),
    );
    let app = create_router(AppState::new(coordinator, directory, sensors));

    let listener = match tokio::net::TcpListener::bind(config.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.listen, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(
        addr = %config.listen,
        origin = %config.origin,
        destinations = ?config.destinations,
        "Journey server listening"
    );

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            shutdown.cancel();
        })
        .await;
    cancel.cancel();

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

/// Lowercase id prefix for sensors, e.g. `"Morning Commute"` -> `morning_commute`.
fn sensor_id(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
