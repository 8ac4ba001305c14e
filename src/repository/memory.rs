//! In-process store backing all three collections
//!
//! Every operation takes the single table lock, so the cross-collection
//! operations (`checkout`, `checkin`) are atomic with respect to each other.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BookStore, BorrowStore, Checkin, Checkout, CopyCounts, MemberStore, Removal};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord, Member},
};

#[derive(Debug, Default)]
struct Tables {
    books: BTreeMap<i32, Book>,
    members: BTreeMap<i32, Member>,
    borrows: BTreeMap<i32, BorrowRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Drop a book whatever its loans
    pub(crate) async fn remove_book(&self, id: i32) -> Option<Book> {
        self.tables.write().await.books.remove(&id)
    }

    pub(crate) async fn active_loans_of_book(&self, book_id: i32) -> usize {
        self.tables
            .read()
            .await
            .borrows
            .values()
            .filter(|r| r.is_active() && r.book_id == book_id)
            .count()
    }
}

/// Matches Postgres `LOWER(a) = LOWER(b)`
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i32)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        if tables.books.contains_key(&book.id) {
            return Err(AppError::DuplicateIdentifier(format!(
                "Book with ID {} already exists",
                book.id
            )));
        }
        tables.books.insert(book.id, book.clone());
        Ok(book.clone())
    }

    async fn get(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn max_id(&self) -> AppResult<Option<i32>> {
        Ok(self.tables.read().await.books.keys().next_back().copied())
    }

    async fn list(&self) -> AppResult<Vec<Book>> {
        let mut books: Vec<Book> = self.tables.read().await.books.values().cloned().collect();
        newest_first(&mut books, |b| (b.created_at, b.id));
        Ok(books)
    }

    async fn update_if_unchanged(&self, book: &Book, expected: CopyCounts) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        match tables.books.get_mut(&book.id) {
            Some(current) if CopyCounts::of(current) == expected => {
                let created_at = current.created_at;
                *current = Book {
                    created_at,
                    ..book.clone()
                };
                Ok(Some(current.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_unless_borrowed(&self, id: i32) -> AppResult<Removal> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Ok(Removal::Missing);
        }
        if tables.borrows.values().any(|r| r.is_active() && r.book_id == id) {
            return Ok(Removal::OnLoan);
        }
        tables.books.remove(&id);
        Ok(Removal::Removed)
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn insert(&self, member: &Member) -> AppResult<Member> {
        let mut tables = self.tables.write().await;
        if tables
            .members
            .values()
            .any(|m| same_email(&m.email, &member.email))
        {
            return Err(AppError::DuplicateContact(
                "Member with this email already exists".to_string(),
            ));
        }
        if tables.members.contains_key(&member.id) {
            return Err(AppError::DuplicateIdentifier(format!(
                "Member with ID {} already exists",
                member.id
            )));
        }
        tables.members.insert(member.id, member.clone());
        Ok(member.clone())
    }

    async fn get(&self, id: i32) -> AppResult<Option<Member>> {
        Ok(self.tables.read().await.members.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Member>> {
        Ok(self
            .tables
            .read()
            .await
            .members
            .values()
            .find(|m| same_email(&m.email, email))
            .cloned())
    }

    async fn max_id(&self) -> AppResult<Option<i32>> {
        Ok(self.tables.read().await.members.keys().next_back().copied())
    }

    async fn list(&self) -> AppResult<Vec<Member>> {
        let mut members: Vec<Member> = self.tables.read().await.members.values().cloned().collect();
        newest_first(&mut members, |m| (m.created_at, m.id));
        Ok(members)
    }
}

#[async_trait]
impl BorrowStore for MemoryStore {
    async fn get(&self, id: i32) -> AppResult<Option<BorrowRecord>> {
        Ok(self.tables.read().await.borrows.get(&id).cloned())
    }

    async fn max_id(&self) -> AppResult<Option<i32>> {
        Ok(self.tables.read().await.borrows.keys().next_back().copied())
    }

    async fn find_active(&self, member_id: i32, book_id: i32) -> AppResult<Option<BorrowRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .borrows
            .values()
            .find(|r| r.is_active() && r.member_id == member_id && r.book_id == book_id)
            .cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<BorrowRecord>> {
        let mut records: Vec<BorrowRecord> = self
            .tables
            .read()
            .await
            .borrows
            .values()
            .filter(|r| r.is_active())
            .cloned()
            .collect();
        newest_first(&mut records, |r| (r.borrow_date, r.id));
        Ok(records)
    }

    async fn list_active_for_member(&self, member_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let mut records: Vec<BorrowRecord> = self
            .tables
            .read()
            .await
            .borrows
            .values()
            .filter(|r| r.is_active() && r.member_id == member_id)
            .cloned()
            .collect();
        newest_first(&mut records, |r| (r.borrow_date, r.id));
        Ok(records)
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<BorrowRecord>> {
        let mut records: Vec<BorrowRecord> = self
            .tables
            .read()
            .await
            .borrows
            .values()
            .filter(|r| r.is_overdue(now))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.borrow_date, r.id));
        Ok(records)
    }

    async fn checkout(&self, record: &BorrowRecord) -> AppResult<Checkout> {
        let mut tables = self.tables.write().await;

        if tables.borrows.contains_key(&record.id) {
            return Err(AppError::DuplicateIdentifier(format!(
                "Borrowed book with ID {} already exists",
                record.id
            )));
        }
        if tables
            .borrows
            .values()
            .any(|r| r.is_active() && r.member_id == record.member_id && r.book_id == record.book_id)
        {
            return Err(AppError::Conflict(
                "Member has already borrowed this book".to_string(),
            ));
        }

        let book = match tables.books.get_mut(&record.book_id) {
            None => return Ok(Checkout::BookMissing),
            Some(book) if book.available_copies <= 0 => return Ok(Checkout::Unavailable),
            Some(book) => {
                book.available_copies -= 1;
                book.updated_at = record.borrow_date;
                book.clone()
            }
        };

        tables.borrows.insert(record.id, record.clone());

        Ok(Checkout::Opened {
            record: record.clone(),
            book,
        })
    }

    async fn checkin(&self, record_id: i32, returned_at: DateTime<Utc>) -> AppResult<Option<Checkin>> {
        let mut tables = self.tables.write().await;

        let record = match tables.borrows.get_mut(&record_id) {
            Some(record) if record.is_active() => {
                record.return_date = Some(returned_at);
                record.updated_at = returned_at;
                record.clone()
            }
            _ => return Ok(None),
        };

        let book = tables.books.get_mut(&record.book_id).map(|book| {
            book.available_copies = (book.available_copies + 1).min(book.total_copies);
            book.updated_at = returned_at;
            book.clone()
        });

        Ok(Some(Checkin { record, book }))
    }
}
