//! Equipment registry service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        device::{CreateDevice, DeviceQuery, MaintenanceReport, UpdateDevice},
        Device, DeviceCondition, DeviceLocation,
    },
    repository::Repository,
};

/// Device described by a create request, before it has an id
fn resolve_new(data: &CreateDevice) -> Result<Device, String> {
    let location = data.location.unwrap_or(DeviceLocation::Warehouse);
    location.check_room(data.room_id)?;

    Ok(Device {
        id: 0,
        name: data.name.trim().to_string(),
        category: data.category,
        location,
        room_id: data.room_id,
        condition: data.condition.unwrap_or(DeviceCondition::Ready),
        asset_id: data.asset_id,
        description: data.description.clone(),
    })
}

/// Apply an update request to a device, enforcing the location invariant and
/// the condition transition table.
fn resolve_update(current: &Device, data: &UpdateDevice) -> Result<Device, String> {
    let mut device = current.clone();

    match (data.location, data.room_id) {
        (Some(location), room_id) => {
            location.check_room(room_id)?;
            device.location = location;
            device.room_id = room_id;
        }
        (None, Some(_)) => {
            return Err("room_id can only be changed together with location".to_string());
        }
        (None, None) => {}
    }

    if let Some(condition) = data.condition {
        if !current.condition.can_become(condition) {
            return Err(format!(
                "device condition cannot change from {} to {}",
                current.condition, condition
            ));
        }
        device.condition = condition;
    }

    if let Some(name) = &data.name {
        device.name = name.trim().to_string();
    }
    if let Some(category) = data.category {
        device.category = category;
    }
    if data.asset_id.is_some() {
        device.asset_id = data.asset_id;
    }
    if data.description.is_some() {
        device.description = data.description.clone();
    }

    Ok(device)
}

#[derive(Clone)]
pub struct DevicesService {
    repository: Repository,
}

impl DevicesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &DeviceQuery) -> AppResult<Vec<Device>> {
        self.repository.devices.list(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Device> {
        self.repository.devices.get(id).await
    }

    pub async fn create(&self, data: &CreateDevice) -> AppResult<Device> {
        data.validate()?;
        let device = resolve_new(data).map_err(AppError::Validation)?;
        self.check_references(&device, None).await?;

        let device = self.repository.devices.create(&device).await?;
        tracing::info!(device_id = device.id, category = %device.category, "Device registered");
        Ok(device)
    }

    pub async fn update(&self, id: i32, data: &UpdateDevice) -> AppResult<Device> {
        data.validate()?;

        // Booking transitions move devices under the same row lock.
        let mut tx = self.repository.pool.begin().await?;
        let current = self
            .repository
            .devices
            .lock(&mut tx, &[id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))?;
        let device = resolve_update(&current, data).map_err(AppError::Validation)?;
        self.check_references(&device, Some(id)).await?;

        let device = self.repository.devices.save(&mut tx, &device).await?;
        tx.commit().await?;
        Ok(device)
    }

    /// Return every device awaiting maintenance to service
    pub async fn complete_maintenance(&self) -> AppResult<MaintenanceReport> {
        let restored = self.repository.devices.complete_maintenance().await?;
        tracing::info!("Maintenance completed on {} device(s)", restored.len());
        Ok(MaintenanceReport { restored })
    }

    /// The room must exist and the asset must not be linked elsewhere
    async fn check_references(&self, device: &Device, exclude_id: Option<i32>) -> AppResult<()> {
        if let Some(room_id) = device.room_id {
            self.repository.rooms.get(room_id).await?;
        }
        if let Some(asset_id) = device.asset_id {
            if self.repository.devices.asset_linked(asset_id, exclude_id).await? {
                return Err(AppError::Validation(format!(
                    "Asset {} is already linked to another device",
                    asset_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceCategory;

    fn projector() -> Device {
        Device {
            id: 4,
            name: "Projector A".to_string(),
            category: DeviceCategory::Projector,
            location: DeviceLocation::Warehouse,
            room_id: None,
            condition: DeviceCondition::Ready,
            asset_id: None,
            description: None,
        }
    }

    fn update() -> UpdateDevice {
        UpdateDevice {
            name: None,
            category: None,
            location: None,
            room_id: None,
            condition: None,
            asset_id: None,
            description: None,
        }
    }

    #[test]
    fn test_new_device_defaults_to_ready_in_warehouse() {
        let data = CreateDevice {
            name: " Mic 1 ".to_string(),
            category: DeviceCategory::Microphone,
            location: None,
            room_id: None,
            condition: None,
            asset_id: Some(12),
            description: None,
        };
        let device = resolve_new(&data).unwrap();
        assert_eq!(device.name, "Mic 1");
        assert_eq!(device.location, DeviceLocation::Warehouse);
        assert_eq!(device.condition, DeviceCondition::Ready);
    }

    #[test]
    fn test_new_device_in_room_needs_room() {
        let data = CreateDevice {
            name: "AC".to_string(),
            category: DeviceCategory::AirConditioner,
            location: Some(DeviceLocation::InRoom),
            room_id: None,
            condition: None,
            asset_id: None,
            description: None,
        };
        assert!(resolve_new(&data).is_err());
    }

    #[test]
    fn test_move_into_room() {
        let data = UpdateDevice {
            location: Some(DeviceLocation::InRoom),
            room_id: Some(2),
            ..update()
        };
        let device = resolve_update(&projector(), &data).unwrap();
        assert_eq!(device.location, DeviceLocation::InRoom);
        assert_eq!(device.room_id, Some(2));
    }

    #[test]
    fn test_back_to_warehouse_clears_room() {
        let mut current = projector();
        current.location = DeviceLocation::InRoom;
        current.room_id = Some(2);

        let data = UpdateDevice {
            location: Some(DeviceLocation::Warehouse),
            ..update()
        };
        let device = resolve_update(&current, &data).unwrap();
        assert_eq!(device.room_id, None);
    }

    #[test]
    fn test_room_without_location_is_rejected() {
        let data = UpdateDevice {
            room_id: Some(2),
            ..update()
        };
        assert!(resolve_update(&projector(), &data).is_err());
    }

    #[test]
    fn test_rename_keeps_current_location_and_condition() {
        let mut current = projector();
        current.location = DeviceLocation::InRoom;
        current.room_id = Some(3);
        current.condition = DeviceCondition::InUse;

        let data = UpdateDevice {
            name: Some("Projector B".to_string()),
            ..update()
        };
        let device = resolve_update(&current, &data).unwrap();
        assert_eq!(device.name, "Projector B");
        assert_eq!(device.location, DeviceLocation::InRoom);
        assert_eq!(device.room_id, Some(3));
        assert_eq!(device.condition, DeviceCondition::InUse);
    }

    #[test]
    fn test_condition_follows_transition_table() {
        let mut current = projector();
        current.condition = DeviceCondition::Broken;

        let to_ready = UpdateDevice {
            condition: Some(DeviceCondition::Ready),
            ..update()
        };
        assert!(resolve_update(&current, &to_ready).is_err());

        let to_maintenance = UpdateDevice {
            condition: Some(DeviceCondition::NeedsMaintenance),
            ..update()
        };
        assert_eq!(
            resolve_update(&current, &to_maintenance).unwrap().condition,
            DeviceCondition::NeedsMaintenance
        );
    }
}
