//! Borrow, return and overdue endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{BorrowRecord, BorrowRequest, ReturnRequest},
};

use super::{ApiResponse, ValidatedJson};

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrow",
    tag = "circulation",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowRecord),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Member or book not found"),
        (status = 409, description = "Already borrowed by this member, or borrow ID taken"),
        (status = 422, description = "No copy available")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<BorrowRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BorrowRecord>>)> {
    let record = state.services.circulation.borrow(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(record).with_message("Book borrowed successfully")),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/return",
    tag = "circulation",
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = BorrowRecord),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "No active borrow record for this member and book")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<ReturnRequest>,
) -> AppResult<Json<ApiResponse<BorrowRecord>>> {
    let record = state.services.circulation.return_book(&request).await?;
    Ok(Json(ApiResponse::data(record).with_message("Book returned successfully")))
}

/// List overdue loans, oldest first
#[utoipa::path(
    get,
    path = "/overdue",
    tag = "circulation",
    responses(
        (status = 200, description = "Active loans older than 14 days", body = Vec<BorrowRecord>)
    )
)]
pub async fn list_overdue(
    State(state): State<crate::AppState>,
) -> AppResult<Json<ApiResponse<Vec<BorrowRecord>>>> {
    let records = state.services.circulation.overdue().await?;
    Ok(Json(ApiResponse::list(records)))
}
