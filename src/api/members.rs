//! Member endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{BorrowRecord, CreateMember, Member},
};

use super::{ApiResponse, PathId, ValidatedJson};

/// List all members, newest first
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    responses(
        (status = 200, description = "All members", body = Vec<Member>)
    )
)]
pub async fn list_members(
    State(state): State<crate::AppState>,
) -> AppResult<Json<ApiResponse<Vec<Member>>>> {
    let members = state.services.members.list_members().await?;
    Ok(Json(ApiResponse::list(members)))
}

/// Get member details by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    PathId(id): PathId,
) -> AppResult<Json<ApiResponse<Member>>> {
    let member = state.services.members.get_member(id).await?;
    Ok(Json(ApiResponse::data(member)))
}

/// Register a new member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member registered", body = Member),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or member ID already exists")
    )
)]
pub async fn register_member(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<CreateMember>,
) -> AppResult<(StatusCode, Json<ApiResponse<Member>>)> {
    let member = state.services.members.register(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(member).with_message("Member registered successfully")),
    ))
}

/// Get the active loans of a member
#[utoipa::path(
    get,
    path = "/members/{id}/borrowed",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member's active borrow records", body = Vec<BorrowRecord>),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member_borrowed(
    State(state): State<crate::AppState>,
    PathId(id): PathId,
) -> AppResult<Json<ApiResponse<Vec<BorrowRecord>>>> {
    let records = state.services.members.borrowed_books(id).await?;
    Ok(Json(ApiResponse::list(records)))
}
