//! Member model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Registered library member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub name: String,
    /// Contact address, unique across members
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Register member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(range(min = 1, message = "Member ID must be a positive integer"))]
    pub id: Option<i32>,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
}
