/// Page rendering
///
/// A page is a template name plus a context. Markup is produced downstream,
/// so the service emits both as one JSON document; equal contexts always
/// give byte-identical pages.
use actix_web::http::header;
use actix_web::HttpResponse;
use page_cache::CachedPage;
use serde::Serialize;

use crate::error::Result;

pub const INDEX_TEMPLATE: &str = "posts/index.html";
pub const GROUP_LIST_TEMPLATE: &str = "posts/group_list.html";
pub const POST_DETAIL_TEMPLATE: &str = "posts/post_detail.html";
pub const CREATE_POST_TEMPLATE: &str = "posts/create_post.html";
pub const PROFILE_TEMPLATE: &str = "posts/profile.html";
pub const FOLLOW_TEMPLATE: &str = "posts/follow.html";

const PAGE_CONTENT_TYPE: &str = "application/json";

#[derive(Serialize)]
struct Document<'a, C> {
    template: &'a str,
    context: &'a C,
}

pub fn render_page<C: Serialize>(template: &str, context: &C) -> Result<CachedPage> {
    let body = serde_json::to_vec(&Document { template, context })?;
    Ok(CachedPage::new(PAGE_CONTENT_TYPE, body))
}

pub fn render<C: Serialize>(template: &str, context: &C) -> Result<HttpResponse> {
    Ok(page_response(render_page(template, context)?))
}

pub fn page_response(page: CachedPage) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(page.content_type)
        .body(page.body)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
