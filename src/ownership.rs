//! Author-only mutation checks shared by articles and comments.

use crate::entities::{ArticleRow, Comment};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
}

/// A stored row with a single author.
pub trait Owned {
    const NOT_FOUND: &'static str;
    const FORBIDDEN: &'static str;

    fn author_id(&self) -> i64;
}

impl Owned for ArticleRow {
    const NOT_FOUND: &'static str = "Article not found";
    const FORBIDDEN: &'static str = "You can only modify your own articles";

    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Owned for Comment {
    const NOT_FOUND: &'static str = "Comment not found";
    const FORBIDDEN: &'static str = "You can only delete your own comments";

    fn author_id(&self) -> i64 {
        self.author_id
    }
}

/// Lets the mutation proceed only when `row` exists and belongs to `user_id`.
///
/// Callers load `row` on every request; there is no cached authorization.
///
/// # Errors
/// `NotFound` when the row is absent, `Forbidden` when another user wrote it.
pub fn require_owner<T: Owned>(row: Option<T>, user_id: i64) -> Result<T, OwnershipError> {
    let row = row.ok_or(OwnershipError::NotFound(T::NOT_FOUND))?;
    if row.author_id() == user_id {
        Ok(row)
    } else {
        Err(OwnershipError::Forbidden(T::FORBIDDEN))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(author_id: i64) -> Comment {
        let now = Utc::now();
        Comment {
            id: 1,
            body: "hi".to_string(),
            author_id,
            article_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_passes() {
        let row = require_owner(Some(comment(5)), 5).unwrap();
        assert_eq!(row.author_id, 5);
    }

    #[test]
    fn other_user_is_forbidden() {
        assert_eq!(
            require_owner(Some(comment(5)), 6).unwrap_err(),
            OwnershipError::Forbidden(Comment::FORBIDDEN)
        );
    }

    #[test]
    fn missing_row_is_not_found() {
        let err = require_owner::<Comment>(None, 6).unwrap_err();
        assert_eq!(err, OwnershipError::NotFound(Comment::NOT_FOUND));
        assert_eq!(err.to_string(), "Comment not found");
    }
}
