use super::{BODY_MAX, ValidationErrors, check_text, user::Profile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
    pub article_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment joined with its author's public columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
    pub article_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_username: String,
    pub author_bio: String,
    pub author_image: String,
}

impl From<CommentRow> for CommentResponse {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
            author: Profile {
                username: row.author_username,
                bio: row.author_bio,
                image: row.author_image,
                following: false,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NewComment {
    #[serde(default)]
    pub body: String,
}

impl NewComment {
    /// # Errors
    /// Returns a `body` violation when it is missing, blank or too long.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_text(&mut errors, "body", &self.body, BODY_MAX);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewCommentRequest {
    pub comment: NewComment,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Profile,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentBody {
    pub comment: CommentResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentsBody {
    pub comments: Vec<CommentResponse>,
}
