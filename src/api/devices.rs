//! Equipment registry endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::device::{CreateDevice, Device, DeviceQuery, MaintenanceReport, UpdateDevice},
    AppState,
};

/// List devices
#[utoipa::path(
    get,
    path = "/devices",
    tag = "devices",
    params(DeviceQuery),
    responses(
        (status = 200, description = "Device list", body = Vec<Device>)
    )
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> AppResult<Json<Vec<Device>>> {
    let devices = state.services.devices.list(&query).await?;
    Ok(Json(devices))
}

/// Get device by ID
#[utoipa::path(
    get,
    path = "/devices/{id}",
    tag = "devices",
    params(("id" = i32, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Device details", body = Device),
        (status = 404, description = "Device not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Device>> {
    let device = state.services.devices.get(id).await?;
    Ok(Json(device))
}

/// Register a device
#[utoipa::path(
    post,
    path = "/devices",
    tag = "devices",
    request_body = CreateDevice,
    responses(
        (status = 201, description = "Device created", body = Device),
        (status = 400, description = "Invalid device", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_device(
    State(state): State<AppState>,
    Json(data): Json<CreateDevice>,
) -> AppResult<(StatusCode, Json<Device>)> {
    let device = state.services.devices.create(&data).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// Update a device (condition, location, asset link, ...)
#[utoipa::path(
    put,
    path = "/devices/{id}",
    tag = "devices",
    params(("id" = i32, Path, description = "Device ID")),
    request_body = UpdateDevice,
    responses(
        (status = 200, description = "Device updated", body = Device),
        (status = 400, description = "Invalid change", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(data): Json<UpdateDevice>,
) -> AppResult<Json<Device>> {
    let device = state.services.devices.update(id, &data).await?;
    Ok(Json(device))
}

/// Mark every device awaiting maintenance as ready
#[utoipa::path(
    post,
    path = "/devices/maintenance/complete",
    tag = "devices",
    responses(
        (status = 200, description = "Devices restored", body = MaintenanceReport)
    )
)]
pub async fn complete_maintenance(State(state): State<AppState>) -> AppResult<Json<MaintenanceReport>> {
    let report = state.services.devices.complete_maintenance().await?;
    Ok(Json(report))
}
