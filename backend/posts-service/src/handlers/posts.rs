/// Post handlers - detail, create and edit pages
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

use super::post_service;
use crate::auth::CurrentUser;
use crate::context::{CommentCard, PostCard, PostDetailContext, PostFormContext};
use crate::error::Result;
use crate::forms::{read_post_form, CommentForm, FormErrors, PostForm};
use crate::models::Post;
use crate::render::{self, CREATE_POST_TEMPLATE, POST_DETAIL_TEMPLATE};
use crate::state::AppState;
use crate::urls;

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = post_service(&state);
    let view = service.get_post_view(*post_id).await?;

    let posts_count = service.author_posts_count(view.author_id).await?;
    let comments = state
        .store
        .list_comments(view.id)
        .await?
        .into_iter()
        .map(CommentCard::from)
        .collect();

    render::render(
        POST_DETAIL_TEMPLATE,
        &PostDetailContext {
            comment_url: urls::add_comment(view.id),
            edit_url: urls::post_edit(view.id),
            post: PostCard::from_view(view, state.media.as_ref()),
            posts_count,
            comments,
            form: CommentForm::default().render(&FormErrors::new()),
        },
    )
}

/// GET /create/
pub async fn create_form(state: web::Data<AppState>, _user: CurrentUser) -> Result<HttpResponse> {
    render_post_form(&state, &PostForm::default(), &FormErrors::new(), None).await
}

/// POST /create/
pub async fn create(
    state: web::Data<AppState>,
    user: CurrentUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_post_form(payload, state.max_upload_bytes).await?;
    let groups = state.store.list_groups().await?;

    match form.clean(&groups) {
        Ok(cleaned) => {
            post_service(&state).create_post(&user, cleaned).await?;
            Ok(render::redirect(&urls::profile(&user.username)))
        }
        Err(errors) => {
            tracing::debug!(user = %user.username, ?errors, "rejected post form");
            render_post_form(&state, &form, &errors, None).await
        }
    }
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = post_service(&state).get_post(*post_id).await?;
    if post.author_id != user.id {
        return Ok(render::redirect(&urls::post_detail(post.id)));
    }

    let form = PostForm::from_post(&post);
    render_post_form(&state, &form, &FormErrors::new(), Some(post)).await
}

/// POST /posts/{post_id}/edit/
///
/// Only the author may edit; anyone else is sent back to the post unchanged.
pub async fn edit(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let service = post_service(&state);
    let post = service.get_post(*post_id).await?;
    if post.author_id != user.id {
        tracing::warn!(post_id = post.id, user = %user.username, "edit by non-author refused");
        return Ok(render::redirect(&urls::post_detail(post.id)));
    }

    let mut form = read_post_form(payload, state.max_upload_bytes).await?;
    form.current_image = post.image.clone();
    let groups = state.store.list_groups().await?;

    match form.clean(&groups) {
        Ok(cleaned) => {
            service.update_post(&post, cleaned).await?;
            Ok(render::redirect(&urls::post_detail(post.id)))
        }
        Err(errors) => render_post_form(&state, &form, &errors, Some(post)).await,
    }
}

async fn render_post_form(
    state: &AppState,
    form: &PostForm,
    errors: &FormErrors,
    post: Option<Post>,
) -> Result<HttpResponse> {
    let groups = state.store.list_groups().await?;

    render::render(
        CREATE_POST_TEMPLATE,
        &PostFormContext {
            form: form.render(&groups, errors),
            action_url: post
                .as_ref()
                .map(|post| urls::post_edit(post.id))
                .unwrap_or_else(|| urls::POST_CREATE.to_string()),
            is_edit: post.is_some(),
            post,
        },
    )
}
