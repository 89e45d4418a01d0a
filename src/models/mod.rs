//! Data models for Roombook

pub mod audit;
pub mod booking;
pub mod device;
pub mod employee;
pub mod enums;
pub mod room;
pub mod timestamp;
pub mod usage;

// Re-export commonly used types
pub use audit::{AuditRecord, NewAuditRecord};
pub use booking::{Booking, BookingDetails, NewBooking};
pub use device::Device;
pub use employee::Employee;
pub use enums::{
    AuditAction, BookingStatus, DeviceCategory, DeviceCondition, DeviceLocation, RoomKind,
    RoomStatus,
};
pub use room::{Room, RoomAvailability, RoomDetails, RoomRef};
