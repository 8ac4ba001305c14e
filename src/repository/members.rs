//! Members repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{classify_unique_violation, MemberStore};
use crate::{
    error::{AppError, AppResult},
    models::Member,
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberStore for MembersRepository {
    async fn insert(&self, member: &Member) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (id, name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(member.id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(member.created_at)
        .bind(member.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            classify_unique_violation(e, |constraint| match constraint {
                "members_pkey" => Some(AppError::DuplicateIdentifier(format!(
                    "Member with ID {} already exists",
                    member.id
                ))),
                "members_email_key" => Some(AppError::DuplicateContact(
                    "Member with this email already exists".to_string(),
                )),
                _ => None,
            })
        })
    }

    async fn get(&self, id: i32) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn max_id(&self) -> AppResult<Option<i32>> {
        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(id) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn list(&self) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(members)
    }
}
