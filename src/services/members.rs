//! Membership service

use std::sync::Arc;

use chrono::Utc;

use super::ids::IdSequence;
use crate::{
    error::{AppError, AppResult},
    models::{BorrowRecord, CreateMember, Member},
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
    ids: Arc<IdSequence>,
}

impl MembersService {
    pub fn new(repository: Repository, ids: Arc<IdSequence>) -> Self {
        Self { repository, ids }
    }

    /// Register a member. The contact address is checked before the id.
    pub async fn register(&self, request: &CreateMember) -> AppResult<Member> {
        if self.repository.members.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::DuplicateContact(
                "Member with this email already exists".to_string(),
            ));
        }

        let id = match request.id {
            Some(id) => {
                if self.repository.members.get(id).await?.is_some() {
                    return Err(AppError::DuplicateIdentifier(format!(
                        "Member with ID {} already exists",
                        id
                    )));
                }
                self.ids.observe(id);
                id
            }
            None => self.ids.next()?,
        };

        let now = Utc::now();
        let member = Member {
            id,
            name: request.name.clone(),
            email: request.email.clone(),
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.members.insert(&member).await?;
        tracing::info!(member_id = created.id, "Member registered");
        Ok(created)
    }

    /// All members, newest first
    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.repository.members.list().await
    }

    pub async fn get_member(&self, id: i32) -> AppResult<Member> {
        self.repository
            .members
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Active loans of a member, most recent first
    pub async fn borrowed_books(&self, member_id: i32) -> AppResult<Vec<BorrowRecord>> {
        self.get_member(member_id).await?;
        self.repository.borrows.list_active_for_member(member_id).await
    }
}
