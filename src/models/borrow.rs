//! Borrow record model and circulation request types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Days a loan may stay out before it is reported as overdue
pub const OVERDUE_AFTER_DAYS: i64 = 14;

/// Loan of one copy of a book to a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub borrow_date: DateTime<Utc>,
    /// `None` while the loan is active
    pub return_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BorrowRecord {
    /// New active record borrowed at `now`
    pub fn open(id: i32, member_id: i32, book_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            book_id,
            member_id,
            borrow_date: now,
            return_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Active and borrowed more than `OVERDUE_AFTER_DAYS` before `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.borrow_date < overdue_cutoff(now)
    }
}

/// Loans borrowed strictly before this instant are overdue
pub fn overdue_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(OVERDUE_AFTER_DAYS)
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BorrowRequest {
    /// Optional client-chosen record identifier
    #[validate(range(min = 1, message = "Borrow ID must be a positive integer"))]
    pub id: Option<i32>,
    #[validate(range(min = 1, message = "Member ID must be a positive integer"))]
    pub member_id: i32,
    #[validate(range(min = 1, message = "Book ID must be a positive integer"))]
    pub book_id: i32,
}

/// Return request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReturnRequest {
    #[validate(range(min = 1, message = "Member ID must be a positive integer"))]
    pub member_id: i32,
    #[validate(range(min = 1, message = "Book ID must be a positive integer"))]
    pub book_id: i32,
}
