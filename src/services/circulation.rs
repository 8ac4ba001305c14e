//! Circulation service: borrowing, returning and overdue detection
//!
//! A borrow record is either active (`return_date` unset) or returned.
//! Returning is one-way; borrowing the same title again opens a new record.

use std::sync::Arc;

use chrono::Utc;

use super::ids::IdSequence;
use crate::{
    error::{AppError, AppResult},
    models::{BorrowRecord, BorrowRequest, ReturnRequest},
    repository::{Checkout, Repository},
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    ids: Arc<IdSequence>,
}

impl CirculationService {
    pub fn new(repository: Repository, ids: Arc<IdSequence>) -> Self {
        Self { repository, ids }
    }

    /// Lend one copy of a book to a member.
    ///
    /// Checks run in order: member exists, book exists, no active loan of the
    /// same book to the same member, a copy is available, the record id is free.
    /// The decrement and the record insert happen as one unit in the store.
    pub async fn borrow(&self, request: &BorrowRequest) -> AppResult<BorrowRecord> {
        let member_id = request.member_id;
        let book_id = request.book_id;

        if self.repository.members.get(member_id).await?.is_none() {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        let book = self
            .repository
            .books
            .get(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        if self
            .repository
            .borrows
            .find_active(member_id, book_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Member has already borrowed this book".to_string(),
            ));
        }

        if book.available_copies <= 0 {
            return Err(unavailable());
        }

        let id = match request.id {
            Some(id) => {
                if self.repository.borrows.get(id).await?.is_some() {
                    return Err(AppError::DuplicateIdentifier(format!(
                        "Borrowed book with ID {} already exists",
                        id
                    )));
                }
                self.ids.observe(id);
                id
            }
            None => self.ids.next()?,
        };

        let record = BorrowRecord::open(id, member_id, book_id, Utc::now());
        let outcome = self.repository.borrows.checkout(&record).await;

        // An automatic id refused before insert goes back unless a later borrow took the next
        // one. Id collisions and storage errors keep it spent.
        let refused = matches!(
            outcome,
            Ok(Checkout::Unavailable | Checkout::BookMissing) | Err(AppError::Conflict(_))
        );
        if request.id.is_none() && refused {
            self.ids.release(id);
        }

        match outcome? {
            Checkout::Opened { record, book } => {
                tracing::info!(
                    borrow_id = record.id,
                    member_id,
                    book_id,
                    available = book.available_copies,
                    "Book borrowed"
                );
                Ok(record)
            }
            Checkout::Unavailable => Err(unavailable()),
            Checkout::BookMissing => Err(AppError::NotFound("Book not found".to_string())),
        }
    }

    /// Close the active loan of a book by a member and put the copy back
    pub async fn return_book(&self, request: &ReturnRequest) -> AppResult<BorrowRecord> {
        let member_id = request.member_id;
        let book_id = request.book_id;

        let active = self
            .repository
            .borrows
            .find_active(member_id, book_id)
            .await?
            .ok_or_else(no_active_loan)?;

        // A concurrent return of the same record leaves nothing to close
        let checkin = self
            .repository
            .borrows
            .checkin(active.id, Utc::now())
            .await?
            .ok_or_else(no_active_loan)?;

        match &checkin.book {
            Some(book) => tracing::info!(
                borrow_id = checkin.record.id,
                member_id,
                book_id,
                available = book.available_copies,
                "Book returned"
            ),
            None => tracing::warn!(
                borrow_id = checkin.record.id,
                member_id,
                book_id,
                "Book returned after it left the catalog; availability not updated"
            ),
        }

        Ok(checkin.record)
    }

    /// Active loans older than the overdue threshold, oldest first
    pub async fn overdue(&self) -> AppResult<Vec<BorrowRecord>> {
        self.repository
            .borrows
            .list_overdue(Utc::now())
            .await
    }
}

fn unavailable() -> AppError {
    AppError::Unavailable("Book is not available for borrowing".to_string())
}

fn no_active_loan() -> AppError {
    AppError::NotFound("No active borrow record found for this member and book".to_string())
}
