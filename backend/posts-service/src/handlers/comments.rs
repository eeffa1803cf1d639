use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::post_service;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::forms::CommentForm;
use crate::render;
use crate::state::AppState;
use crate::urls;

#[derive(Debug, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

/// POST /posts/{post_id}/comment/
///
/// Always lands back on the post; an empty comment is dropped.
pub async fn add_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<i64>,
    data: web::Form<CommentFormData>,
) -> Result<HttpResponse> {
    let service = post_service(&state);
    let post = service.get_post(*post_id).await?;

    match CommentForm::new(&data.text).clean() {
        Ok(cleaned) => {
            service.add_comment(&user, post.id, cleaned).await?;
        }
        Err(errors) => {
            tracing::debug!(post_id = post.id, ?errors, "discarded invalid comment");
        }
    }

    Ok(render::redirect(&urls::post_detail(post.id)))
}
