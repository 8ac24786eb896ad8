use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::battle::{run_rotation, BattleReport};
use crate::registry::{summarize, Affinity, NinjaView, Registry, RegistryError, RegistrySummary};
use crate::server::routes::ApiError;
use crate::server::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct AffinitiesRequest {
    pub affinities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SealRequest {
    pub sealed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotationRequest {
    pub input: String,
}

/// Run a registry call on the blocking pool; the store does file I/O.
async fn with_registry<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Registry) -> Result<T, RegistryError> + Send + 'static,
{
    let registry = state.registry.clone();
    tokio::task::spawn_blocking(move || call(&registry))
        .await
        .map_err(|err| ApiError::internal(format!("registry task failed: {err}")))?
        .map_err(ApiError::from)
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("ninja name must not be empty"));
    }
    Ok(())
}

/// Canonical tags for the closed affinity vocabulary; order and repeats kept.
pub fn parse_affinities(raw: &[String]) -> Result<Vec<String>, ApiError> {
    if raw.is_empty() {
        return Err(ApiError::bad_request("at least one affinity is required"));
    }
    raw.iter()
        .map(|value| {
            value
                .parse::<Affinity>()
                .map(|affinity| affinity.tag().to_string())
                .map_err(|err| ApiError::bad_request(err.to_string()))
        })
        .collect()
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "shinobi-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_ninjas(State(state): State<AppState>) -> Result<Json<Vec<NinjaView>>, ApiError> {
    let snapshot = with_registry(&state, |registry| registry.all()).await?;
    Ok(Json(snapshot.records().cloned().map(NinjaView::from).collect()))
}

pub async fn get_ninja(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<NinjaView>, ApiError> {
    let lookup = name.clone();
    match with_registry(&state, move |registry| registry.get(&lookup)).await? {
        Some(record) => Ok(Json(record.into())),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("ninja '{name}' is not registered"),
        )),
    }
}

pub async fn put_affinities(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<AffinitiesRequest>,
) -> Result<Json<NinjaView>, ApiError> {
    validate_name(&name)?;
    let affinities = parse_affinities(&request.affinities)?;
    let now = chrono::Utc::now().timestamp();
    let record = with_registry(&state, move |registry| {
        registry.upsert_affinities(&name, &affinities, now)
    })
    .await?;
    Ok(Json(record.into()))
}

pub async fn put_seal(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SealRequest>,
) -> Result<Json<NinjaView>, ApiError> {
    validate_name(&name)?;
    let record =
        with_registry(&state, move |registry| registry.upsert_seal(&name, request.sealed)).await?;
    Ok(Json(record.into()))
}

pub async fn summary(State(state): State<AppState>) -> Result<Json<RegistrySummary>, ApiError> {
    let snapshot = with_registry(&state, |registry| registry.all()).await?;
    Ok(Json(summarize(&snapshot)))
}

pub async fn rotation(
    State(state): State<AppState>,
    Json(request): Json<RotationRequest>,
) -> Result<Json<BattleReport>, ApiError> {
    let limits = state.limits;
    // Bounded by the limits, but still CPU work that should stay off the reactor.
    let result = tokio::task::spawn_blocking(move || run_rotation(&request.input, limits))
        .await
        .map_err(|err| ApiError::internal(format!("rotation task failed: {err}")))?;
    match result {
        Ok(report) => {
            debug!(
                terminal_round = ?report.terminal_round,
                blocks = report.blocks.len(),
                "rotation simulated"
            );
            Ok(Json(report))
        }
        Err(err) => {
            warn!(error = %err, "rotation request rejected");
            Err(err.into())
        }
    }
}
