use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::logic::{HorseService, OwnerService};
use crate::model::{
    HorseCreate, HorseDetail, HorseGenerations, HorseListItem, HorseSearch, HorseTree,
    HorseUpdate, Id, Owner, OwnerCreate, OwnerSearch,
};
use crate::store::traits::Store;

pub type AppState<S> = Arc<S>;

pub type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        Self {
            error: err.summary(),
            errors: err.errors().to_vec(),
        }
    }
}

pub fn status_of(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Validation { .. } | ServiceError::InvalidArgument(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::Conflict { .. } => StatusCode::CONFLICT,
        ServiceError::Fatal(_) | ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a service failure onto the response tuple the handlers return.
pub fn error_response(err: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_of(&err);
    if status.is_server_error() {
        log::error!("{}", err);
    } else {
        log::warn!("{}", err);
    }
    (status, Json(ErrorResponse::from(&err)))
}

// Horse handlers
pub async fn search_horses<S: Store>(
    State(store): State<AppState<S>>,
    Query(search): Query<HorseSearch>,
) -> ApiResult<Json<Vec<HorseListItem>>> {
    log::info!("GET /horses");
    let horses = HorseService::search(&*store, &search)
        .await
        .map_err(error_response)?;
    Ok(Json(horses))
}

pub async fn get_horse<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<Json<HorseDetail>> {
    log::info!("GET /horses/{}", id);
    let horse = HorseService::get_by_id(&*store, id)
        .await
        .map_err(error_response)?;
    Ok(Json(horse))
}

pub async fn get_horse_ancestors<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
    Query(params): Query<HorseGenerations>,
) -> ApiResult<Json<HorseTree>> {
    log::info!("GET /horses/ancestors/{}", id);
    log::debug!("generations: {:?}", params.generations);

    let generations = match params.generations {
        Some(generations) if generations >= 1 => generations,
        Some(generations) => {
            return Err(error_response(ServiceError::Validation {
                summary: "Validation of ancestry request failed".to_string(),
                errors: vec![format!(
                    "Generations must be at least 1, got {}",
                    generations
                )],
            }))
        }
        None => {
            return Err(error_response(ServiceError::Validation {
                summary: "Validation of ancestry request failed".to_string(),
                errors: vec!["No generations given".to_string()],
            }))
        }
    };

    let tree = HorseService::ancestors(&*store, id, generations)
        .await
        .map_err(error_response)?;
    Ok(Json(tree))
}

pub async fn create_horse<S: Store>(
    State(store): State<AppState<S>>,
    RequestJson(horse): RequestJson<HorseCreate>,
) -> ApiResult<(StatusCode, Json<HorseDetail>)> {
    log::info!("POST /horses");
    log::debug!("body: {:?}", horse);
    let created = HorseService::create(&*store, &horse)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_horse<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
    RequestJson(horse): RequestJson<HorseUpdate>,
) -> ApiResult<Json<HorseDetail>> {
    log::info!("PUT /horses/{}", id);
    log::debug!("body: {:?}", horse);
    let updated = HorseService::update(&*store, id, horse)
        .await
        .map_err(error_response)?;
    Ok(Json(updated))
}

pub async fn delete_horse<S: Store>(
    State(store): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    log::info!("DELETE /horses/{}", id);
    HorseService::delete(&*store, id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

// Owner handlers
pub async fn search_owners<S: Store>(
    State(store): State<AppState<S>>,
    Query(search): Query<OwnerSearch>,
) -> ApiResult<Json<Vec<Owner>>> {
    log::info!("GET /owners");
    let owners = OwnerService::search(&*store, &search)
        .await
        .map_err(error_response)?;
    Ok(Json(owners))
}

pub async fn create_owner<S: Store>(
    State(store): State<AppState<S>>,
    RequestJson(owner): RequestJson<OwnerCreate>,
) -> ApiResult<(StatusCode, Json<Owner>)> {
    log::info!("POST /owners");
    log::debug!("body: {:?}", owner);
    let created = OwnerService::create(&*store, &owner)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_status_codes() {
        let conflict = ServiceError::conflict("Data of horse for create has conflicts", vec!["x".into()])
            .unwrap_err();
        assert_eq!(status_of(&conflict), StatusCode::CONFLICT);
        assert_eq!(
            status_of(&ServiceError::not_found("gone")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(&ServiceError::InvalidArgument("negative".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(&ServiceError::Store(anyhow::anyhow!("connection reset"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_omits_empty_violation_list() {
        let body = serde_json::to_value(ErrorResponse::from(&ServiceError::not_found(
            "No horse with ID 3 found",
        )))
        .unwrap();
        assert_eq!(body, serde_json::json!({ "error": "No horse with ID 3 found" }));

        let validation = ServiceError::validation("Validation of horse for create failed", vec!["No sex given".into()])
            .unwrap_err();
        let body = serde_json::to_value(ErrorResponse::from(&validation)).unwrap();
        assert_eq!(body["error"], "Validation of horse for create failed");
        assert_eq!(body["errors"][0], "No sex given");
    }
}
