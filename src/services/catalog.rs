//! Catalog management service

use std::sync::Arc;

use chrono::Utc;

use super::ids::IdSequence;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord, CreateBook, UpdateBook},
    repository::{CopyCounts, Removal, Repository},
};

/// Guarded updates re-read the book this many times before giving up
const UPDATE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    ids: Arc<IdSequence>,
}

impl CatalogService {
    pub fn new(repository: Repository, ids: Arc<IdSequence>) -> Self {
        Self { repository, ids }
    }

    /// Add a book; every copy starts on the shelf
    pub async fn add_book(&self, request: &CreateBook) -> AppResult<Book> {
        let id = match request.id {
            Some(id) => {
                if self.repository.books.get(id).await?.is_some() {
                    return Err(AppError::DuplicateIdentifier(format!(
                        "Book with ID {} already exists",
                        id
                    )));
                }
                self.ids.observe(id);
                id
            }
            None => self.ids.next()?,
        };

        let now = Utc::now();
        let book = Book {
            id,
            title: request.title.clone(),
            author: request.author.clone(),
            category: request.category.clone(),
            total_copies: request.total_copies,
            available_copies: request.total_copies,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.books.insert(&book).await?;
        tracing::info!(book_id = created.id, copies = created.total_copies, "Book added");
        Ok(created)
    }

    /// All books, newest first
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository
            .books
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Replace a book's details. Availability is re-derived from the copies
    /// currently out, clamped at zero.
    pub async fn update_book(&self, id: i32, details: &UpdateBook) -> AppResult<Book> {
        for _ in 0..UPDATE_ATTEMPTS {
            let current = self.get_book(id).await?;
            let expected = CopyCounts::of(&current);

            let mut book = current;
            book.apply_details(details);
            book.updated_at = Utc::now();

            if let Some(saved) = self.repository.books.update_if_unchanged(&book, expected).await? {
                tracing::info!(
                    book_id = id,
                    total = saved.total_copies,
                    available = saved.available_copies,
                    "Book updated"
                );
                return Ok(saved);
            }
            tracing::debug!(book_id = id, "Copy counters moved during update, retrying");
        }

        Err(AppError::Conflict(format!(
            "Book {} is changing concurrently, retry the update",
            id
        )))
    }

    /// Delete a book that has no active loans
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        match self.repository.books.delete_unless_borrowed(id).await? {
            Removal::Removed => {
                tracing::info!(book_id = id, "Book deleted");
                Ok(())
            }
            Removal::Missing => Err(AppError::NotFound(format!("Book with id {} not found", id))),
            Removal::OnLoan => Err(AppError::Conflict(
                "Cannot delete book that is currently borrowed".to_string(),
            )),
        }
    }

    /// Every active loan, most recently borrowed first
    pub async fn list_borrowed(&self) -> AppResult<Vec<BorrowRecord>> {
        self.repository.borrows.list_active().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockBookStore, MockBorrowStore, MockMemberStore};

    fn service() -> CatalogService {
        CatalogService::new(Repository::in_memory(), Arc::new(IdSequence::default()))
    }

    fn create(title: &str, copies: i32) -> CreateBook {
        CreateBook {
            id: None,
            title: title.into(),
            author: "Author".into(),
            category: "Category".into(),
            total_copies: copies,
        }
    }

    fn details(copies: i32) -> UpdateBook {
        UpdateBook {
            title: "Renamed".into(),
            author: "Author".into(),
            category: "Category".into(),
            total_copies: copies,
        }
    }

    #[tokio::test]
    async fn test_auto_ids_in_creation_order() {
        let catalog = service();
        for (expected, title) in [(1, "A"), (2, "B"), (3, "C")] {
            let book = catalog.add_book(&create(title, 1)).await.unwrap();
            assert_eq!(book.id, expected);
            assert_eq!(book.available_copies, book.total_copies);
        }
    }

    #[tokio::test]
    async fn test_client_id_collision() {
        let catalog = service();
        let request = CreateBook {
            id: Some(7),
            ..create("A", 1)
        };
        catalog.add_book(&request).await.unwrap();

        let err = catalog.add_book(&request).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentifier(_)));

        // Automatic ids continue after the client's id
        assert_eq!(catalog.add_book(&create("B", 1)).await.unwrap().id, 8);
    }

    #[tokio::test]
    async fn test_automatic_id_after_largest_client_id() {
        let catalog = service();
        let request = CreateBook {
            id: Some(i32::MAX),
            ..create("Last", 1)
        };
        assert_eq!(catalog.add_book(&request).await.unwrap().id, i32::MAX);

        let err = catalog.add_book(&create("Next", 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Client-chosen ids below the ceiling are still accepted
        let request = CreateBook {
            id: Some(3),
            ..create("Third", 1)
        };
        assert_eq!(catalog.add_book(&request).await.unwrap().id, 3);
        assert_eq!(catalog.list_books().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let catalog = service();
        catalog.add_book(&create("First", 1)).await.unwrap();
        catalog.add_book(&create("Second", 1)).await.unwrap();

        let titles: Vec<String> = catalog
            .list_books()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_get_missing_book() {
        let err = service().get_book(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_book() {
        let err = service().update_book(5, &details(2)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rederives_availability() {
        let catalog = service();
        let book = catalog.add_book(&create("A", 2)).await.unwrap();

        let updated = catalog.update_book(book.id, &details(4)).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.total_copies, 4);
        assert_eq!(updated.available_copies, 4);
        assert_eq!(updated.created_at, book.created_at);
    }

    #[tokio::test]
    async fn test_delete_book() {
        let catalog = service();
        let book = catalog.add_book(&create("A", 1)).await.unwrap();

        catalog.delete_book(book.id).await.unwrap();
        assert!(matches!(
            catalog.get_book(book.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            catalog.delete_book(book.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut books = MockBookStore::new();
        books
            .expect_get()
            .returning(|_| Err(AppError::Storage("connection reset".into())));

        let repository = Repository::from_stores(
            Arc::new(books),
            Arc::new(MockMemberStore::new()),
            Arc::new(MockBorrowStore::new()),
        );
        let catalog = CatalogService::new(repository, Arc::new(IdSequence::default()));

        let err = catalog.get_book(1).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_update_gives_up_when_counters_keep_moving() {
        let now = Utc::now();
        let stored = Book {
            id: 1,
            title: "A".into(),
            author: "Author".into(),
            category: "Category".into(),
            total_copies: 3,
            available_copies: 3,
            created_at: now,
            updated_at: now,
        };

        let mut books = MockBookStore::new();
        books
            .expect_get()
            .times(UPDATE_ATTEMPTS)
            .returning(move |_| Ok(Some(stored.clone())));
        books
            .expect_update_if_unchanged()
            .times(UPDATE_ATTEMPTS)
            .returning(|_, _| Ok(None));

        let repository = Repository::from_stores(
            Arc::new(books),
            Arc::new(MockMemberStore::new()),
            Arc::new(MockBorrowStore::new()),
        );
        let catalog = CatalogService::new(repository, Arc::new(IdSequence::default()));

        let err = catalog.update_book(1, &details(3)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
