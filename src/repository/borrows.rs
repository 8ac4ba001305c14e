//! Borrow records repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::{classify_unique_violation, BorrowStore, Checkin, Checkout};
use crate::{
    error::{AppError, AppResult},
    models::{borrow::overdue_cutoff, Book, BorrowRecord},
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowStore for BorrowsRepository {
    async fn get(&self, id: i32) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>("SELECT * FROM borrow_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn max_id(&self) -> AppResult<Option<i32>> {
        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(id) FROM borrow_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn find_active(&self, member_id: i32, book_id: i32) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_records
            WHERE member_id = $1 AND book_id = $2 AND return_date IS NULL
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_active(&self) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_records WHERE return_date IS NULL ORDER BY borrow_date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_active_for_member(&self, member_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_records
            WHERE member_id = $1 AND return_date IS NULL
            ORDER BY borrow_date DESC, id DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            r#"
            SELECT * FROM borrow_records
            WHERE return_date IS NULL AND borrow_date < $1
            ORDER BY borrow_date ASC, id ASC
            "#,
        )
        .bind(overdue_cutoff(now))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn checkout(&self, record: &BorrowRecord) -> AppResult<Checkout> {
        let mut tx = self.pool.begin().await?;

        // Conditional decrement: the row lock it takes serializes concurrent borrows of one book
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1 AND available_copies > 0
            RETURNING *
            "#,
        )
        .bind(record.book_id)
        .bind(record.borrow_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book) = book else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                .bind(record.book_id)
                .fetch_one(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Ok(if exists {
                Checkout::Unavailable
            } else {
                Checkout::BookMissing
            });
        };

        let stored = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_records (id, book_id, member_id, borrow_date, return_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NULL, $5, $6)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.book_id)
        .bind(record.member_id)
        .bind(record.borrow_date)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            classify_unique_violation(e, |constraint| match constraint {
                "borrow_records_pkey" => Some(AppError::DuplicateIdentifier(format!(
                    "Borrowed book with ID {} already exists",
                    record.id
                ))),
                "borrow_records_active_pair_key" => Some(AppError::Conflict(
                    "Member has already borrowed this book".to_string(),
                )),
                _ => None,
            })
        })?;

        tx.commit().await?;

        Ok(Checkout::Opened { record: stored, book })
    }

    async fn checkin(&self, record_id: i32, returned_at: DateTime<Utc>) -> AppResult<Option<Checkin>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            UPDATE borrow_records
            SET return_date = $2, updated_at = $2
            WHERE id = $1 AND return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(returned_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            tx.rollback().await?;
            return Ok(None);
        };

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = LEAST(available_copies + 1, total_copies), updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(record.book_id)
        .bind(returned_at)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(Checkin { record, book }))
    }
}
