//! Repository layer for database operations
//!
//! Each collection is reached through a store trait so the rule-sets can run
//! against Postgres in production and against [`memory::MemoryStore`] in tests.

pub mod books;
pub mod borrows;
pub mod members;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord, Member},
};

/// Copy counters a guarded book update expects to find unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyCounts {
    pub total: i32,
    pub available: i32,
}

impl CopyCounts {
    pub fn of(book: &Book) -> Self {
        Self {
            total: book.total_copies,
            available: book.available_copies,
        }
    }
}

/// Outcome of opening a loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkout {
    /// Record stored and one copy taken off the shelf
    Opened { record: BorrowRecord, book: Book },
    /// No copy left at the time of the decrement
    Unavailable,
    /// The book disappeared before the decrement
    BookMissing,
}

/// Outcome of removing a book from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Missing,
    /// Refused: at least one copy is out on an active loan
    OnLoan,
}

/// Outcome of closing a loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkin {
    pub record: BorrowRecord,
    /// `None` when the book was deleted while on loan
    pub book: Option<Book>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book; fails with `DuplicateIdentifier` on an id collision
    async fn insert(&self, book: &Book) -> AppResult<Book>;

    async fn get(&self, id: i32) -> AppResult<Option<Book>>;

    async fn max_id(&self) -> AppResult<Option<i32>>;

    /// All books, newest created first
    async fn list(&self) -> AppResult<Vec<Book>>;

    /// Overwrite a book if its copy counters still match `expected`.
    /// Returns `None` when the counters moved or the book is gone.
    async fn update_if_unchanged(&self, book: &Book, expected: CopyCounts) -> AppResult<Option<Book>>;

    /// Delete a book unless an active loan references it, as one atomic unit
    /// with respect to `BorrowStore::checkout`.
    async fn delete_unless_borrowed(&self, id: i32) -> AppResult<Removal>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert a new member; fails with `DuplicateIdentifier` or
    /// `DuplicateContact` on a collision
    async fn insert(&self, member: &Member) -> AppResult<Member>;

    async fn get(&self, id: i32) -> AppResult<Option<Member>>;

    /// Case-insensitive lookup by contact address
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Member>>;

    async fn max_id(&self) -> AppResult<Option<i32>>;

    /// All members, newest created first
    async fn list(&self) -> AppResult<Vec<Member>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowStore: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<Option<BorrowRecord>>;

    async fn max_id(&self) -> AppResult<Option<i32>>;

    /// The active record for a member/book pair, if any
    async fn find_active(&self, member_id: i32, book_id: i32) -> AppResult<Option<BorrowRecord>>;

    /// All active records, most recently borrowed first
    async fn list_active(&self) -> AppResult<Vec<BorrowRecord>>;

    /// Active records of one member, most recently borrowed first
    async fn list_active_for_member(&self, member_id: i32) -> AppResult<Vec<BorrowRecord>>;

    /// Records overdue as of `now`, oldest first
    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<BorrowRecord>>;

    /// Take one copy of `record.book_id` off the shelf and store the record,
    /// as one atomic unit.
    async fn checkout(&self, record: &BorrowRecord) -> AppResult<Checkout>;

    /// Mark an active record returned and put its copy back on the shelf,
    /// as one atomic unit. Returns `None` if the record is not active.
    async fn checkin(&self, record_id: i32, returned_at: DateTime<Utc>) -> AppResult<Option<Checkin>>;
}

/// Main repository struct holding the collection stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub members: Arc<dyn MemberStore>,
    pub borrows: Arc<dyn BorrowStore>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            members: Arc::new(members::MembersRepository::new(pool.clone())),
            borrows: Arc::new(borrows::BorrowsRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository over a fresh in-process store
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self::from_stores(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }

    pub fn from_stores(
        books: Arc<dyn BookStore>,
        members: Arc<dyn MemberStore>,
        borrows: Arc<dyn BorrowStore>,
    ) -> Self {
        Self {
            books,
            members,
            borrows,
            pool: None,
        }
    }

    /// Check that the backing database answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Translate a unique-constraint violation into a domain error using the
/// name of the violated constraint. Other errors pass through as storage errors.
pub(crate) fn classify_unique_violation(
    err: sqlx::Error,
    classify: impl FnOnce(&str) -> Option<AppError>,
) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(mapped) = classify(db_err.constraint().unwrap_or_default()) {
                return mapped;
            }
        }
    }
    AppError::Database(err)
}
