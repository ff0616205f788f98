use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Post, PostStatus, Visibility};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be at least 3 characters long"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    #[serde(default)]
    #[schema(value_type = Option<String>, example = "draft")]
    pub status: Option<PostStatus>,

    #[serde(default)]
    #[schema(value_type = Option<String>, example = "public")]
    pub visibility: Option<Visibility>,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be at least 3 characters long"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: Option<String>,

    #[schema(value_type = Option<String>, example = "published")]
    pub status: Option<PostStatus>,

    #[schema(value_type = Option<String>, example = "private")]
    pub visibility: Option<Visibility>,

    pub tags: Option<Vec<String>>,
}

impl UpdatePostRequest {
    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title.trim().to_string();
        }
        if let Some(content) = self.content {
            post.content = content.trim().to_string();
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        if let Some(visibility) = self.visibility {
            post.visibility = visibility;
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    #[schema(value_type = String, example = "published")]
    pub status: PostStatus,
    #[schema(value_type = String, example = "public")]
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            status: post.status,
            visibility: post.visibility,
            tags: post.tags,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
