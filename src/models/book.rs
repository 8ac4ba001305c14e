//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book record from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Copies owned by the library
    pub total_copies: i32,
    /// Copies on the shelf, never above `total_copies`
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan, as implied by the counters
    pub fn borrowed_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    /// Apply new catalog details, re-deriving availability from the
    /// number of copies currently out.
    ///
    /// Shrinking `total_copies` below the number of borrowed copies clamps
    /// availability to zero.
    pub fn apply_details(&mut self, details: &UpdateBook) {
        let borrowed = self.borrowed_copies();
        self.title = details.title.clone();
        self.author = details.author.clone();
        self.category = details.category.clone();
        self.total_copies = details.total_copies;
        self.available_copies = (details.total_copies - borrowed).max(0);
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    /// Optional client-chosen identifier
    #[validate(range(min = 1, message = "Book ID must be a positive integer"))]
    pub id: Option<i32>,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 1, message = "Total copies must be a positive integer"))]
    pub total_copies: i32,
}

/// Update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 1, message = "Total copies must be a positive integer"))]
    pub total_copies: i32,
}
