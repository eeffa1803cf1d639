//! Paths of the site's pages, used for redirects and rendered links.

pub const POST_CREATE: &str = "/create/";

pub fn group_posts(slug: &str) -> String {
    format!("/group/{}/", urlencoding::encode(slug))
}

pub fn post_detail(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn post_edit(post_id: i64) -> String {
    format!("/posts/{}/edit/", post_id)
}

pub fn add_comment(post_id: i64) -> String {
    format!("/posts/{}/comment/", post_id)
}

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn profile_follow(username: &str) -> String {
    format!("/profile/{}/follow/", urlencoding::encode(username))
}

pub fn profile_unfollow(username: &str) -> String {
    format!("/profile/{}/unfollow/", urlencoding::encode(username))
}
