//! Catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Book, BorrowRecord, CreateBook, UpdateBook},
};

use super::{ApiResponse, PathId, ValidatedJson};

/// List all books, newest first
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books in the catalog", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
) -> AppResult<Json<ApiResponse<Vec<Book>>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(ApiResponse::list(books)))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    PathId(id): PathId,
) -> AppResult<Json<ApiResponse<Book>>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(ApiResponse::data(book)))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book added", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Book ID already exists")
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<ApiResponse<Book>>)> {
    let book = state.services.catalog.add_book(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(book).with_message("Book added successfully")),
    ))
}

/// Update a book's details and copy count
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    PathId(id): PathId,
    ValidatedJson(request): ValidatedJson<UpdateBook>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let book = state.services.catalog.update_book(id, &request).await?;
    Ok(Json(ApiResponse::data(book).with_message("Book updated successfully")))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is currently borrowed")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    PathId(id): PathId,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.catalog.delete_book(id).await?;
    Ok(Json(ApiResponse::data(()).with_message("Book deleted successfully")))
}

/// List every active loan, most recent first
#[utoipa::path(
    get,
    path = "/books/borrowed",
    tag = "books",
    responses(
        (status = 200, description = "Active borrow records", body = Vec<BorrowRecord>)
    )
)]
pub async fn list_borrowed(
    State(state): State<crate::AppState>,
) -> AppResult<Json<ApiResponse<Vec<BorrowRecord>>>> {
    let records = state.services.catalog.list_borrowed().await?;
    Ok(Json(ApiResponse::list(records)))
}
