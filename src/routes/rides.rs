use axum::{
    extract::{FromRequest, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::ride::{NewRide, Ride, RideStatus},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rides", get(list_rides).post(create_ride))
        .route("/rides/:id", get(get_ride).patch(update_ride))
        .route("/rides/:id/accept", patch(accept_ride))
        .route("/rides/:id/status", patch(set_status))
}

/// JSON body extractor whose rejections render as `{"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRideBody {
    status: Option<String>,
    driver_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptRideBody {
    driver_name: Option<String>,
}

#[derive(Deserialize)]
struct StatusBody {
    status: Option<String>,
}

async fn list_rides(State(state): State<AppState>) -> Result<Json<Vec<Ride>>, AppError> {
    Ok(Json(state.rides.list().await?))
}

async fn create_ride(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewRide>,
) -> Result<impl IntoResponse, AppError> {
    let ride = state.rides.create(body).await?;
    Ok((StatusCode::CREATED, Json(ride)))
}

async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ride>, AppError> {
    Ok(Json(state.rides.get(&id).await?))
}

async fn update_ride(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateRideBody>,
) -> Result<Json<Ride>, AppError> {
    let next = match body.status.as_deref().map(str::parse::<RideStatus>) {
        Some(Ok(status)) => status,
        _ => return Err(invalid_status()),
    };
    let ride = state
        .rides
        .apply(&id, next, body.driver_name.as_deref())
        .await?;
    Ok(Json(ride))
}

async fn accept_ride(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AcceptRideBody>,
) -> Result<Json<Ride>, AppError> {
    let driver_name = body.driver_name.unwrap_or_default();
    Ok(Json(state.rides.accept(&id, &driver_name).await?))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> Result<Json<Ride>, AppError> {
    let next = match body.status.as_deref() {
        None | Some("") => return Err(AppError::InvalidRequest("status is required".into())),
        Some(raw) => raw.parse::<RideStatus>().map_err(|_| invalid_status())?,
    };
    Ok(Json(state.rides.transition(&id, next).await?))
}

fn invalid_status() -> AppError {
    AppError::InvalidRequest(format!(
        "Invalid status. Use one of: {}",
        RideStatus::valid_values()
    ))
}
