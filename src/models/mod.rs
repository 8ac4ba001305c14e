//! Data models for Lendly

pub mod book;
pub mod borrow;
pub mod member;

// Re-export commonly used types
pub use book::{Book, CreateBook, UpdateBook};
pub use borrow::{BorrowRecord, BorrowRequest, ReturnRequest};
pub use member::{CreateMember, Member};
