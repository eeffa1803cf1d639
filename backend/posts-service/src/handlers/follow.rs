use actix_web::{web, HttpResponse};

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::render;
use crate::services::FollowService;
use crate::state::AppState;
use crate::urls;

async fn find_author(state: &AppState, username: &str) -> Result<User> {
    state
        .store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))
}

/// GET /profile/{username}/follow/
pub async fn profile_follow(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = find_author(&state, &username).await?;
    FollowService::new(state.store.clone())
        .follow(&user, &author)
        .await?;

    Ok(render::redirect(&urls::profile(&author.username)))
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = find_author(&state, &username).await?;
    FollowService::new(state.store.clone())
        .unfollow(&user, &author)
        .await?;

    Ok(render::redirect(&urls::profile(&author.username)))
}
