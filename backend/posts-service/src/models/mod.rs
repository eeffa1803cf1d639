/// Data models for posts-service
///
/// - User: author identity, owned by the identity provider
/// - Group: themed community posts can belong to
/// - Post: a user's entry, optionally in a group and with an image
/// - Comment: a reply under a post
/// - Follow: subscription of a user to an author
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::AppError;

/// Characters of a post's text used for its short form
pub const POST_TITLE_CHARS: usize = 15;

/// Maximum length of a group title
pub const GROUP_TITLE_MAX_CHARS: usize = 200;

/// Maximum length of a group slug
pub const GROUP_SLUG_MAX_CHARS: usize = 255;

/// Storage prefix for post images
pub const POST_IMAGE_DIR: &str = "posts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    /// Human-readable field name
    pub fn verbose_name(field: &str) -> Option<&'static str> {
        match field {
            "title" => Some("Название"),
            "slug" => Some("Адрес страницы группы"),
            "description" => Some("Описание"),
            _ => None,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<i64>,
    /// Media storage key of the attached image
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn verbose_name(field: &str) -> Option<&'static str> {
        match field {
            "text" => Some("Текст поста"),
            "created_at" => Some("Дата публикации"),
            "author" => Some("Автор"),
            "group" => Some("Группа"),
            "image" => Some("Картинка"),
            _ => None,
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.text.chars().take(POST_TITLE_CHARS).collect();
        f.write_str(&short)
    }
}

/// Post joined with its author and group, as listed in feeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn verbose_name(field: &str) -> Option<&'static str> {
        match field {
            "post" => Some("Пост"),
            "author" => Some("Автор"),
            "text" => Some("Текст комментария"),
            "created_at" => Some("Дата комментария"),
            _ => None,
        }
    }
}

/// Comment joined with its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    /// Follower
    pub user_id: Uuid,
    /// Followed author
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a group
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl NewGroup {
    /// Column constraints shared by every store
    pub fn check(&self) -> Result<(), AppError> {
        let title_chars = self.title.chars().count();
        if title_chars == 0 || title_chars > GROUP_TITLE_MAX_CHARS {
            return Err(AppError::BadRequest(format!(
                "group title must be 1 to {} characters, got {}",
                GROUP_TITLE_MAX_CHARS, title_chars
            )));
        }

        let slug_chars = self.slug.chars().count();
        if slug_chars == 0 || slug_chars > GROUP_SLUG_MAX_CHARS {
            return Err(AppError::BadRequest(format!(
                "group slug must be 1 to {} characters, got {}",
                GROUP_SLUG_MAX_CHARS, slug_chars
            )));
        }
        Ok(())
    }
}

/// Fields needed to insert a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// What happens to a post's image on edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Replace(String),
    Clear,
}

/// Editable fields of a post
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

impl PostChanges {
    /// Image key after applying the change to `current`
    pub fn resolve_image(&self, current: Option<String>) -> Option<String> {
        match &self.image {
            ImageChange::Keep => current,
            ImageChange::Replace(key) => Some(key.clone()),
            ImageChange::Clear => None,
        }
    }
}

/// Fields needed to insert a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str) -> Post {
        Post {
            id: 1,
            author_id: Uuid::new_v4(),
            text: text.to_string(),
            group_id: None,
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_post_display_is_first_fifteen_chars() {
        assert_eq!(post("Текст").to_string(), "Текст");
        assert_eq!(
            post("Очень длинный текст поста для проверки").to_string(),
            "Очень длинный т"
        );
    }

    #[test]
    fn test_group_display_is_title() {
        let group = Group {
            id: 1,
            title: "Тестовый заголовок".to_string(),
            slug: "test-slug".to_string(),
            description: "Тестовое описание".to_string(),
        };
        assert_eq!(group.to_string(), "Тестовый заголовок");
    }

    #[test]
    fn test_verbose_names() {
        let post_fields = [("author", "Автор"), ("group", "Группа"), ("image", "Картинка")];
        for (field, expected) in post_fields {
            assert_eq!(Post::verbose_name(field), Some(expected), "post.{}", field);
        }

        let group_fields = [
            ("title", "Название"),
            ("slug", "Адрес страницы группы"),
            ("description", "Описание"),
        ];
        for (field, expected) in group_fields {
            assert_eq!(Group::verbose_name(field), Some(expected), "group.{}", field);
        }

        let post_fields = [("text", "Текст поста"), ("created_at", "Дата публикации")];
        for (field, expected) in post_fields {
            assert_eq!(Post::verbose_name(field), Some(expected), "post.{}", field);
        }

        let comment_fields = [
            ("post", "Пост"),
            ("author", "Автор"),
            ("text", "Текст комментария"),
            ("created_at", "Дата комментария"),
        ];
        for (field, expected) in comment_fields {
            assert_eq!(Comment::verbose_name(field), Some(expected), "comment.{}", field);
        }

        assert_eq!(Post::verbose_name("nope"), None);
        assert_eq!(Comment::verbose_name("nope"), None);
    }

    #[test]
    fn test_group_title_limit() {
        let group = |title: String| NewGroup {
            title,
            slug: "test-slug".to_string(),
            description: String::new(),
        };

        assert!(group("я".repeat(GROUP_TITLE_MAX_CHARS)).check().is_ok());
        assert!(matches!(
            group("я".repeat(GROUP_TITLE_MAX_CHARS + 1)).check(),
            Err(AppError::BadRequest(_))
        ));
        assert!(group(String::new()).check().is_err());
    }

    #[test]
    fn test_resolve_image() {
        let current = Some("posts/a.gif".to_string());
        let changes = |image| PostChanges {
            text: "t".into(),
            group_id: None,
            image,
        };

        assert_eq!(changes(ImageChange::Keep).resolve_image(current.clone()), current);
        assert_eq!(changes(ImageChange::Clear).resolve_image(current.clone()), None);
        assert_eq!(
            changes(ImageChange::Replace("posts/b.gif".into())).resolve_image(current),
            Some("posts/b.gif".to_string())
        );
    }
}
