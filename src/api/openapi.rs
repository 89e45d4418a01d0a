//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assistant, availability, bookings, devices, health, rooms};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roombook API",
        version = "1.0.0",
        description = "Meeting room and equipment booking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Availability
        availability::check_availability,
        // Rooms
        rooms::list_rooms,
        rooms::get_room,
        rooms::create_room,
        rooms::update_room,
        rooms::list_room_devices,
        rooms::get_room_usage,
        rooms::get_room_audit,
        // Devices
        devices::list_devices,
        devices::get_device,
        devices::create_device,
        devices::update_device,
        devices::complete_maintenance,
        // Bookings
        bookings::list_bookings,
        bookings::get_booking,
        bookings::get_booking_audit,
        bookings::create_booking,
        bookings::approve_booking,
        bookings::reject_booking,
        bookings::cancel_booking,
        bookings::begin_booking,
        bookings::return_booking,
        // Assistant
        assistant::suggest,
        assistant::book,
    ),
    components(
        schemas(
            // Rooms
            crate::models::Room,
            crate::models::RoomDetails,
            crate::models::RoomRef,
            crate::models::room::CreateRoom,
            crate::models::room::UpdateRoom,
            crate::models::RoomKind,
            crate::models::RoomStatus,
            crate::models::usage::RoomUsageSummary,
            crate::models::usage::UsageEntry,
            // Devices
            crate::models::Device,
            crate::models::device::CreateDevice,
            crate::models::device::UpdateDevice,
            crate::models::device::DeviceQuery,
            crate::models::device::MaintenanceReport,
            crate::models::DeviceCategory,
            crate::models::DeviceLocation,
            crate::models::DeviceCondition,
            // Bookings
            crate::models::Booking,
            crate::models::BookingDetails,
            crate::models::BookingStatus,
            crate::models::booking::BookingQuery,
            crate::models::AuditRecord,
            crate::models::AuditAction,
            crate::scheduling::TimeWindow,
            crate::scheduling::Conflict,
            crate::services::bookings::TransitionOutcome,
            availability::AvailabilityRequest,
            availability::AvailabilityResponse,
            bookings::CreateBookingRequest,
            bookings::CreateBookingResponse,
            bookings::ReasonRequest,
            // Assistant
            crate::scheduling::IntentField,
            crate::scheduling::intent::Requirement,
            crate::scheduling::scanner::Suggestion,
            crate::scheduling::scanner::RankedRoom,
            crate::scheduling::scanner::BorrowedDevice,
            crate::scheduling::scanner::DeviceShortfall,
            crate::scheduling::scanner::DeviceSuggestion,
            crate::scheduling::scanner::SlotSuggestion,
            crate::services::assistant::AssistantBooking,
            assistant::SuggestRequest,
            assistant::BookRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "availability", description = "Room availability"),
        (name = "rooms", description = "Room registry"),
        (name = "devices", description = "Equipment registry"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "assistant", description = "Natural-language booking assistant")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
