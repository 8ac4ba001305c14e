//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{classify_unique_violation, BookStore, CopyCounts, Removal};
use crate::{
    error::{AppError, AppResult},
    models::Book,
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, category, total_copies, available_copies, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.created_at)
        .bind(book.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            classify_unique_violation(e, |constraint| {
                (constraint == "books_pkey").then(|| {
                    AppError::DuplicateIdentifier(format!("Book with ID {} already exists", book.id))
                })
            })
        })
    }

    async fn get(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn max_id(&self) -> AppResult<Option<i32>> {
        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(id) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn update_if_unchanged(&self, book: &Book, expected: CopyCounts) -> AppResult<Option<Book>> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author = $3, category = $4,
                total_copies = $5, available_copies = $6, updated_at = $7
            WHERE id = $1 AND total_copies = $8 AND available_copies = $9
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.total_copies)
        .bind(book.available_copies)
        .bind(book.updated_at)
        .bind(expected.total)
        .bind(expected.available)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_unless_borrowed(&self, id: i32) -> AppResult<Removal> {
        let mut tx = self.pool.begin().await?;

        // Waits for an in-flight checkout of this book; a later checkout waits for us
        let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(Removal::Missing);
        }

        let on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrow_records WHERE book_id = $1 AND return_date IS NULL)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if on_loan {
            tx.rollback().await?;
            return Ok(Removal::OnLoan);
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Removal::Removed)
    }
}
