use super::{
    BODY_MAX, DESCRIPTION_MAX, TITLE_MAX, ValidationErrors, check_text, user::Profile,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Stored article joined with the author columns needed for responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: i64,
    pub favorites_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_username: String,
    pub author_bio: String,
    pub author_image: String,
}

impl From<ArticleRow> for ArticleResponse {
    fn from(row: ArticleRow) -> Self {
        Self {
            slug: row.slug,
            title: row.title,
            description: row.description,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
            favorited: false,
            favorites_count: row.favorites_count,
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
pub struct NewArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
}

impl NewArticle {
    /// # Errors
    /// Returns every missing, blank or oversized field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_text(&mut errors, "title", &self.title, TITLE_MAX);
        check_text(&mut errors, "description", &self.description, DESCRIPTION_MAX);
        check_text(&mut errors, "body", &self.body, BODY_MAX);
        errors.into_result()
    }
}

/// Partial article update; a new title regenerates the slug.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
}

impl UpdateArticle {
    /// # Errors
    /// Returns every present field that is blank or oversized.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let fields = [
            ("title", &self.title, TITLE_MAX),
            ("description", &self.description, DESCRIPTION_MAX),
            ("body", &self.body, BODY_MAX),
        ];
        for (field, value, max) in fields {
            if let Some(value) = value {
                if value.trim().is_empty() {
                    errors.add(field, format!("{field} cannot be empty"));
                } else {
                    check_text(&mut errors, field, value, max);
                }
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewArticleRequest {
    pub article: NewArticle,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateArticleRequest {
    pub article: UpdateArticle,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: Profile,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArticleBody {
    pub article: ArticleResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesBody {
    pub articles: Vec<ArticleResponse>,
    pub articles_count: i64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArticleListQuery {
    /// Page size, default 20, at most 100.
    pub limit: Option<i64>,
    /// Rows to skip, negative values count as 0.
    pub offset: Option<i64>,
    /// Only articles written by this username.
    pub author: Option<String>,
}

impl ArticleListQuery {
    #[must_use]
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_LIST_LIMIT),
            _ => DEFAULT_LIST_LIMIT,
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().filter(|author| !author.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_article_valid() {
        let article = NewArticle {
            title: "Hello, World!".to_string(),
            description: "greeting".to_string(),
            body: "hi".to_string(),
        };
        assert!(article.validate().is_ok());
    }

    #[test]
    fn new_article_collects_all_errors() {
        let article = NewArticle {
            title: " ".to_string(),
            description: String::new(),
            body: "b".repeat(BODY_MAX + 1),
        };
        let errors = article.validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["title", "description", "body"]);
        assert_eq!(errors.errors[0].message, "title cannot be empty");
        assert_eq!(errors.errors[1].message, "description is required");
    }

    #[test]
    fn update_article_rejects_blank_present_fields() {
        assert!(UpdateArticle::default().validate().is_ok());

        let update = UpdateArticle {
            title: Some(String::new()),
            description: Some("d".repeat(DESCRIPTION_MAX + 1)),
            body: None,
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["title", "description"]);
        assert_eq!(errors.errors[0].message, "title cannot be empty");
    }

    #[test]
    fn list_query_bounds() {
        let query = ArticleListQuery::default();
        assert_eq!(query.limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.author(), None);

        let query = ArticleListQuery {
            limit: Some(500),
            offset: Some(-5),
            author: Some(String::new()),
        };
        assert_eq!(query.limit(), MAX_LIST_LIMIT);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.author(), None);

        let query = ArticleListQuery {
            limit: Some(0),
            offset: Some(10),
            author: Some("alice".to_string()),
        };
        assert_eq!(query.limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(query.offset(), 10);
        assert_eq!(query.author(), Some("alice"));
    }

    #[test]
    fn response_uses_camel_case() {
        let now = Utc::now();
        let row = ArticleRow {
            id: 1,
            slug: "hello-world".to_string(),
            title: "Hello, World!".to_string(),
            description: "d".to_string(),
            body: "b".to_string(),
            author_id: 7,
            favorites_count: 0,
            created_at: now,
            updated_at: now,
            author_username: "alice".to_string(),
            author_bio: String::new(),
            author_image: String::new(),
        };
        let json = serde_json::to_value(ArticleResponse::from(row)).unwrap();
        assert_eq!(json["slug"], "hello-world");
        assert_eq!(json["favoritesCount"], 0);
        assert_eq!(json["favorited"], false);
        assert_eq!(json["author"]["username"], "alice");
        assert_eq!(json["author"]["following"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("author_id").is_none());
    }
}
