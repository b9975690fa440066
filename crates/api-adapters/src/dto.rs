//! Request and response bodies.

use chrono::{DateTime, Utc};
use domains::{Post, PostStatus, PostWithAuthor, PublicUser};
use serde::{Deserialize, Serialize};
use services::{CreatePost, Session};
use uuid::Uuid;
use validator::Validate;

use crate::state::HttpSettings;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub cover_url: Option<String>,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn new(post: Post, author_name: Option<String>, http: &HttpSettings) -> Self {
        Self {
            tags: post.tag_list(),
            cover_url: post.cover.as_deref().map(|c| http.cover_url(c)),
            id: post.id,
            title: post.title,
            slug: post.slug,
            body: post.body,
            status: post.status,
            author_id: post.author_id,
            author_name,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    pub fn from_joined(joined: PostWithAuthor, http: &HttpSettings) -> Self {
        Self::new(joined.post, joined.author_name, http)
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub page: u32,
    pub posts: Vec<PostResponse>,
}

/// Text parts of the create-post form. All three are required; the values
/// themselves may be empty.
#[derive(Debug, Default, Validate)]
pub struct CreatePostFields {
    #[validate(required(message = "title is required"))]
    pub title: Option<String>,
    #[validate(required(message = "body is required"))]
    pub body: Option<String>,
    #[validate(required(message = "tags is required"))]
    pub tags: Option<String>,
}

impl From<CreatePostFields> for CreatePost {
    fn from(fields: CreatePostFields) -> Self {
        Self {
            title: fields.title.unwrap_or_default(),
            body: fields.body.unwrap_or_default(),
            tags: fields.tags.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub token: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.user,
            token: session.token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str) -> SignupRequest {
        SignupRequest {
            name: name.into(),
            email: email.into(),
            password: String::new(),
        }
    }

    #[test]
    fn signup_checks_name_length_and_email_syntax() {
        assert!(signup("Ada", "Ada@Example.com").validate().is_ok());
        assert!(signup("A", "ada@example.com").validate().is_err());
        assert!(signup("Ada", "not-an-email").validate().is_err());
        assert!(signup("Ada", "a da@example.com").validate().is_err());
    }

    #[test]
    fn create_fields_must_all_be_present() {
        let complete = CreatePostFields {
            title: Some("Hello".into()),
            body: Some(String::new()),
            tags: Some("rust".into()),
        };
        assert!(complete.validate().is_ok());

        let missing_body = CreatePostFields {
            body: None,
            ..complete
        };
        let errors = missing_body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("body"));
    }
}
