/// HTTP handlers and route table
pub mod comments;
pub mod feed;
pub mod follow;
pub mod health;
pub mod posts;

use actix_web::{web, HttpRequest};
use std::collections::HashMap;

use crate::metrics::serve_metrics;
use crate::services::{FeedService, PostService};
use crate::state::AppState;

pub use comments::add_comment;
pub use feed::{follow_index, group_posts, index, profile};
pub use follow::{profile_follow, profile_unfollow};
pub use health::{health_check, readiness_check};
pub use posts::{create, create_form, edit, edit_form, post_detail};

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/health/ready", web::get().to(readiness_check))
        .route("/metrics", web::get().to(serve_metrics))
        .route("/", web::get().to(index))
        .route("/group/{slug}/", web::get().to(group_posts))
        .route("/follow/", web::get().to(follow_index))
        .service(
            web::resource("/create/")
                .route(web::get().to(create_form))
                .route(web::post().to(create)),
        )
        .route("/posts/{post_id}/", web::get().to(post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(edit_form))
                .route(web::post().to(edit)),
        )
        .route("/posts/{post_id}/comment/", web::post().to(add_comment))
        .route("/profile/{username}/", web::get().to(profile))
        .route("/profile/{username}/follow/", web::get().to(profile_follow))
        .route("/profile/{username}/unfollow/", web::get().to(profile_unfollow));
}

/// Raw `?page=` value. Malformed query strings read as no page.
pub(crate) fn page_param(req: &HttpRequest) -> Option<String> {
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().remove("page"))
}

pub(crate) fn feed_service(state: &AppState) -> FeedService {
    FeedService::new(state.store.clone(), state.media.clone())
}

pub(crate) fn post_service(state: &AppState) -> PostService {
    PostService::new(state.store.clone(), state.media.clone())
}
