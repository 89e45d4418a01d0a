//! Employee directory entry (read-only view)

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: i32,
    pub full_name: String,
    pub active: bool,
}
