/// Feed handlers - index, group, profile and following pages
use actix_web::{web, HttpRequest, HttpResponse};

use super::{feed_service, page_param};
use crate::auth::CurrentUser;
use crate::cache;
use crate::context::{FollowContext, GroupContext, IndexContext, ProfileContext};
use crate::db::PostFilter;
use crate::error::{AppError, Result};
use crate::render::{
    self, FOLLOW_TEMPLATE, GROUP_LIST_TEMPLATE, INDEX_TEMPLATE, PROFILE_TEMPLATE,
};
use crate::services::FollowService;
use crate::state::AppState;
use crate::urls;

/// GET / - all posts, served from the page cache within its window
pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let key = cache::request_key(&req);
    if let Some(page) = cache::fetch(&state, &key).await {
        return Ok(render::page_response(page));
    }

    let page_obj = feed_service(&state)
        .page(PostFilter::All, page_param(&req).as_deref())
        .await?;
    let page = render::render_page(INDEX_TEMPLATE, &IndexContext { page_obj })?;

    cache::store(&state, &key, &page).await;
    Ok(render::page_response(page))
}

/// GET /group/{slug}/
pub async fn group_posts(
    req: HttpRequest,
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let group = state
        .store
        .find_group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))?;

    let page_obj = feed_service(&state)
        .page(PostFilter::Group(group.id), page_param(&req).as_deref())
        .await?;

    render::render(GROUP_LIST_TEMPLATE, &GroupContext { group, page_obj })
}

/// GET /profile/{username}/
pub async fn profile(
    req: HttpRequest,
    state: web::Data<AppState>,
    username: web::Path<String>,
    viewer: Option<CurrentUser>,
) -> Result<HttpResponse> {
    let author = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))?;

    let page_obj = feed_service(&state)
        .page(PostFilter::Author(author.id), page_param(&req).as_deref())
        .await?;
    let following = FollowService::new(state.store.clone())
        .is_following(viewer.as_ref(), &author)
        .await?;

    render::render(
        PROFILE_TEMPLATE,
        &ProfileContext {
            posts_count: page_obj.count,
            follow_url: urls::profile_follow(&author.username),
            unfollow_url: urls::profile_unfollow(&author.username),
            author,
            page_obj,
            following,
        },
    )
}

/// GET /follow/ - posts by followed authors
pub async fn follow_index(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let page_obj = feed_service(&state)
        .page(PostFilter::FollowedBy(user.id), page_param(&req).as_deref())
        .await?;

    render::render(FOLLOW_TEMPLATE, &FollowContext { page_obj })
}
