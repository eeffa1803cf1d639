use std::sync::Arc;

use crate::context::PostCard;
use crate::db::{BlogStore, PostFilter};
use crate::error::Result;
use crate::media::MediaStorage;
use crate::pagination::{Page, Paginator, POSTS_PER_PAGE};

/// Paginated post feeds
#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn BlogStore>,
    media: Arc<dyn MediaStorage>,
}

impl FeedService {
    pub fn new(store: Arc<dyn BlogStore>, media: Arc<dyn MediaStorage>) -> Self {
        Self { store, media }
    }

    /// One page of posts matching `filter`. `raw_page` is the unparsed
    /// `?page=` value; bad or out-of-range values are clamped.
    pub async fn page(&self, filter: PostFilter, raw_page: Option<&str>) -> Result<Page<PostCard>> {
        let count = self.store.count_posts(filter).await?;
        let paginator = Paginator::new(count, POSTS_PER_PAGE);
        let number = paginator.page_number(raw_page);

        let posts = self
            .store
            .list_posts(filter, paginator.per_page(), paginator.offset(number))
            .await?;

        let media = self.media.as_ref();
        Ok(paginator
            .page(number, posts)
            .map(|view| PostCard::from_view(view, media)))
    }
}
