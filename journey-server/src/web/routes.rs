//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::location::{DirectoryError, StateRecord};
use crate::sensors::SensorReading;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sensors", get(sensors))
        .route("/refresh", post(refresh))
        .route("/refresh/request", post(request_refresh))
        .route("/states/:entity_id", put(put_state).delete(delete_state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Current value of every sensor.
async fn sensors(State(state): State<AppState>) -> Json<SensorsResponse> {
    let status = state.coordinator.status();
    let readings = state
        .sensors
        .views(&status, Utc::now())
        .iter()
        .map(|sensor| SensorReading::read(sensor.as_ref()))
        .collect();

    Json(SensorsResponse::new(readings, &status))
}

/// Refresh now and report whether it worked.
async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<RefreshResponse>) {
    let success = state.coordinator.refresh_now().await;
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(RefreshResponse { success }))
}

/// Ask for a debounced refresh.
async fn request_refresh(State(state): State<AppState>) -> StatusCode {
    state.coordinator.request_refresh().await;
    StatusCode::ACCEPTED
}

/// Create or replace a state in the registry.
async fn put_state(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    Json(update): Json<StateUpdate>,
) -> Result<Json<StateRecord>, AppError> {
    if !is_valid_entity_id(&entity_id) {
        return Err(AppError::BadRequest {
            message: format!("invalid entity id: {entity_id}"),
        });
    }

    let record = update.into_record(entity_id);
    debug!(entity_id = %record.entity_id, state = %record.state, "State pushed");
    state.directory.set(record.clone())?;
    Ok(Json(record))
}

/// Remove a state from the registry.
async fn delete_state(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<StatusCode, AppError> {
    match state.directory.remove(&entity_id)? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(AppError::NotFound {
            message: format!("no such state: {entity_id}"),
        }),
    }
}

/// `domain.object_id`, both parts non-empty.
fn is_valid_entity_id(entity_id: &str) -> bool {
    match entity_id.split_once('.') {
        Some((domain, object_id)) => {
            !domain.is_empty()
                && !object_id.is_empty()
                && entity_id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        }
        None => false,
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{Map, json};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::cache::{CachedGeocoder, GeocodeCacheConfig};
    use crate::config::CoordinatorConfig;
    use crate::coordinator::{JourneyCoordinator, Route};
    use crate::domain::{Address, Coordinates};
    use crate::gmaps::{DistanceMatrixError, MatrixElement, TextValue};
    use crate::location::{InMemoryDirectory, LocationDirectory, LocationResolver};
    use crate::nominatim::NominatimError;
    use crate::remote::{ReverseGeocoder, TravelTimeProvider};
    use crate::sensors::SensorSet;

    struct NoAddress;

    impl ReverseGeocoder for NoAddress {
        async fn reverse_geocode(&self, _: Coordinates) -> Result<Option<Address>, NominatimError> {
            Ok(None)
        }
    }

    struct TenMinutes;

    impl TravelTimeProvider for TenMinutes {
        async fn travel_time(
            &self,
            _: Coordinates,
            _: Coordinates,
        ) -> Result<MatrixElement, DistanceMatrixError> {
            let ten = TextValue {
                text: "10 mins".to_string(),
                value: 600.0,
            };
            Ok(MatrixElement {
                status: "OK".to_string(),
                duration: Some(ten.clone()),
                duration_in_traffic: Some(ten),
                distance: None,
            })
        }

        async fn test_credentials(&self) -> Result<bool, DistanceMatrixError> {
            Ok(true)
        }
    }

    fn app_state() -> AppState {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .set(StateRecord::new("zone.work", "0").with_location(51.5155, -0.0922))
            .unwrap();
        directory
            .set(StateRecord::new("person.alex", "not_home").with_location(51.501, -0.142))
            .unwrap();

        let coordinator = JourneyCoordinator::new(
            Route::new("person.alex", vec!["zone.work".to_string()]),
            Arc::new(CachedGeocoder::new(NoAddress, &GeocodeCacheConfig::default())),
            Arc::new(TenMinutes),
            LocationResolver::new(Arc::clone(&directory)),
        )
        .spawn(
            &CoordinatorConfig::new(Duration::from_secs(3600), Duration::from_secs(600)),
            CancellationToken::new(),
        );

        AppState::new(coordinator, directory, SensorSet::new("j", "Journey", 1))
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn refresh_then_read_sensors() {
        let state = app_state();

        let (status, Json(body)) = refresh(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);

        let Json(response) = sensors(State(state)).await;
        assert!(response.last_update_success);
        assert_eq!(response.sensors.len(), 2);
        assert_eq!(response.sensors[0].state, Some(json!("Unknown")));
        assert_eq!(response.sensors[1].unique_id, "j-time");
        assert_eq!(response.sensors[1].state, Some(json!(10)));
    }

    #[tokio::test]
    async fn request_refresh_is_accepted() {
        let state = app_state();
        assert_eq!(request_refresh(State(state)).await, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn put_and_delete_state() {
        let state = app_state();
        let mut changes = state.directory.subscribe();

        let update = StateUpdate {
            state: "home".to_string(),
            attributes: Map::new(),
        };
        let Json(record) = put_state(
            State(state.clone()),
            Path("person.sam".to_string()),
            Json(update),
        )
        .await
        .unwrap();
        assert_eq!(record.entity_id, "person.sam");
        assert_eq!(changes.recv().await.unwrap().entity_id, "person.sam");

        let status = delete_state(State(state.clone()), Path("person.sam".to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.directory.get("person.sam").unwrap().is_none());

        let err = delete_state(State(state), Path("person.sam".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn put_rejects_malformed_entity_id() {
        let state = app_state();
        let update = StateUpdate {
            state: "home".to_string(),
            attributes: Map::new(),
        };

        let err = put_state(State(state), Path("no-domain".to_string()), Json(update))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[test]
    fn entity_id_validation() {
        assert!(is_valid_entity_id("person.alex"));
        assert!(is_valid_entity_id("zone.work_office"));
        assert!(!is_valid_entity_id("person."));
        assert!(!is_valid_entity_id(".alex"));
        assert!(!is_valid_entity_id("person.a b"));
        assert!(!is_valid_entity_id("alex"));
    }

    #[test]
    fn app_error_status_codes() {
        let response = AppError::NotFound {
            message: "x".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(DirectoryError::Unavailable("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
