//! Posts Service Library
//!
//! A blog: users publish posts, optionally inside a group and with an
//! image, comment on each other's posts and follow authors. Pages are
//! paginated feeds rendered as `{template, context}` documents.
//!
//! Layers:
//! - `handlers`: HTTP endpoints and the route table
//! - `services`: writes with side effects and feed composition
//! - `forms`: validation of submitted posts and comments
//! - `db`: the `BlogStore` seam (Postgres and in-process backends)
//! - `cache`: full-page caching of the index feed

pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod render;
pub mod services;
pub mod state;
pub mod urls;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
