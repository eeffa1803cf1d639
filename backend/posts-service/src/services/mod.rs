/// Business logic layer
///
/// Services sit between handlers and the store: they own write side effects
/// (media uploads, user mirroring, metrics) and read composition (feeds).
pub mod feed;
pub mod follow;
pub mod posts;

pub use feed::FeedService;
pub use follow::FollowService;
pub use posts::PostService;
