use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /posts`. Both fields are required.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct PostInput {
    #[validate(
        required(message = "The title field is required."),
        length(
            min = 1,
            max = 255,
            message = "The title field must be between 1 and 255 characters."
        )
    )]
    #[serde(default, deserialize_with = "super::input::trimmed")]
    pub title: Option<String>,

    #[validate(
        required(message = "The content field is required."),
        length(min = 1, message = "The content field is required.")
    )]
    #[serde(default, deserialize_with = "super::input::trimmed")]
    pub content: Option<String>,
}

/// Body of `PUT`/`PATCH /posts/{id}`. Absent fields keep their current value.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct PostUpdate {
    #[validate(length(
        min = 1,
        max = 255,
        message = "The title field must be between 1 and 255 characters."
    ))]
    #[serde(default, deserialize_with = "super::input::trimmed")]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "The content field must not be empty."))]
    #[serde(default, deserialize_with = "super::input::trimmed")]
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl PostInput {
    /// Converts an input that already passed `validate()` into a store payload.
    pub fn into_new_post(self) -> NewPost {
        NewPost {
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
        }
    }
}

impl Post {
    /// Applies the present fields of `update` and bumps `updated_at`.
    pub fn apply(&mut self, update: PostUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_input_validation() {
        let valid = PostInput {
            title: Some("Hello".into()),
            content: Some("World".into()),
        };
        assert!(valid.validate().is_ok());

        let errors = PostInput::default().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("content"));

        let long_title = PostInput {
            title: Some("t".repeat(256)),
            content: Some("body".into()),
        };
        assert!(long_title.validate().is_err());
    }

    #[test]
    fn test_post_update_is_partial() {
        assert!(PostUpdate::default().validate().is_ok());

        let now = Utc::now();
        let mut post = Post {
            id: 7,
            title: "Old".into(),
            content: "Body".into(),
            created_at: now,
            updated_at: now,
        };
        post.apply(PostUpdate {
            title: Some("New".into()),
            content: None,
        });
        assert_eq!(post.title, "New");
        assert_eq!(post.content, "Body");
        assert!(post.updated_at >= now);
    }
}
