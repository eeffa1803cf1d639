/// Context structures handed to the renderer, one per page
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::forms::FormView;
use crate::media::MediaStorage;
use crate::models::{CommentView, Group, Post, PostView, User};
use crate::pagination::Page;
use crate::urls;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
    pub url: String,
}

impl AuthorRef {
    fn new(id: Uuid, username: String) -> Self {
        Self {
            id,
            url: urls::profile(&username),
            username,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub url: String,
}

/// A post as shown in feeds and on its detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub url: String,
}

impl PostCard {
    pub fn from_view(view: PostView, media: &dyn MediaStorage) -> Self {
        let group = match (view.group_id, view.group_slug, view.group_title) {
            (Some(id), Some(slug), Some(title)) => Some(GroupRef {
                id,
                url: urls::group_posts(&slug),
                slug,
                title,
            }),
            _ => None,
        };

        Self {
            id: view.id,
            image_url: view.image.as_deref().map(|key| media.url(key)),
            image: view.image,
            created_at: view.created_at,
            author: AuthorRef::new(view.author_id, view.author_username),
            group,
            url: urls::post_detail(view.id),
            text: view.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentCard {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
}

impl From<CommentView> for CommentCard {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.id,
            text: view.text,
            created_at: view.created_at,
            author: AuthorRef::new(view.author_id, view.author_username),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub group: Group,
    pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: User,
    pub page_obj: Page<PostCard>,
    /// Whether the viewer follows `author`
    pub following: bool,
    pub posts_count: i64,
    pub follow_url: String,
    pub unfollow_url: String,
}

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: PostCard,
    /// Posts by the same author
    pub posts_count: i64,
    pub comments: Vec<CommentCard>,
    pub form: FormView,
    /// Where the comment form posts to
    pub comment_url: String,
    pub edit_url: String,
}

#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub form: FormView,
    /// Where the form posts to
    pub action_url: String,
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
}

#[derive(Debug, Serialize)]
pub struct FollowContext {
    pub page_obj: Page<PostCard>,
}
