//! Device (movable equipment) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{DeviceCategory, DeviceCondition, DeviceLocation};

/// Device record, as tracked by the equipment registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Device {
    pub id: i32,
    pub name: String,
    pub category: DeviceCategory,
    pub location: DeviceLocation,
    /// Set iff `location` is `in_room`
    pub room_id: Option<i32>,
    pub condition: DeviceCondition,
    /// Linked fixed-asset record (unique across devices)
    pub asset_id: Option<i32>,
    pub description: Option<String>,
}

impl Device {
    /// Device currently sitting in the given room
    pub fn is_built_into(&self, room_id: i32) -> bool {
        self.location == DeviceLocation::InRoom && self.room_id == Some(room_id)
    }

    /// Device available to be taken from the warehouse pool
    pub fn is_warehouse_ready(&self) -> bool {
        self.location == DeviceLocation::Warehouse && self.condition == DeviceCondition::Ready
    }
}

/// Create device request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDevice {
    #[validate(length(min = 1, max = 200, message = "Device name must be 1-200 characters"))]
    pub name: String,
    pub category: DeviceCategory,
    /// Defaults to `warehouse`
    pub location: Option<DeviceLocation>,
    pub room_id: Option<i32>,
    /// Defaults to `ready`
    pub condition: Option<DeviceCondition>,
    pub asset_id: Option<i32>,
    pub description: Option<String>,
}

/// Update device request
///
/// `location` and `room_id` are applied together: moving a device always
/// states where it goes.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDevice {
    #[validate(length(min = 1, max = 200, message = "Device name must be 1-200 characters"))]
    pub name: Option<String>,
    pub category: Option<DeviceCategory>,
    pub location: Option<DeviceLocation>,
    pub room_id: Option<i32>,
    pub condition: Option<DeviceCondition>,
    pub asset_id: Option<i32>,
    pub description: Option<String>,
}

/// Query parameters for device listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeviceQuery {
    pub category: Option<DeviceCategory>,
    pub location: Option<DeviceLocation>,
    pub condition: Option<DeviceCondition>,
    pub room_id: Option<i32>,
}

/// Result of closing out maintenance
#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceReport {
    /// Devices moved from `needs_maintenance` to `ready`
    pub restored: Vec<Device>,
}
