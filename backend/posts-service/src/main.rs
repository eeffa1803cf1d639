use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{anyhow, bail, Context};
use posts_service::config::{Config, MEMORY_DATABASE_URL};
use posts_service::handlers;
use posts_service::middleware::JwtAuthMiddleware;
use posts_service::models::NewGroup;
use posts_service::{auth::JwtKeys, db, AppState};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Limit for URL-encoded bodies (comments)
const FORM_LIMIT_BYTES: usize = 256 * 1024;

const USAGE: &str = "usage: posts-service [serve | healthcheck | create-user <username> | \
create-group <slug> <title> [description] | issue-token <username>]";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow!("invalid configuration: {}", e))?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config).await,
        Some("healthcheck") => healthcheck(&config).await,
        Some("create-user") => {
            let username = args.get(1).context(USAGE)?;
            create_user(&config, username).await
        }
        Some("create-group") => {
            let (slug, title) = match (args.get(1), args.get(2)) {
                (Some(slug), Some(title)) => (slug, title),
                _ => bail!(USAGE),
            };
            let description = args.get(3).cloned().unwrap_or_default();
            create_group(&config, slug, title, description).await
        }
        Some("issue-token") => {
            let username = args.get(1).context(USAGE)?;
            issue_token(&config, username).await
        }
        Some(other) => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(env = %config.app.env, "starting posts-service");

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("creating media root {}", config.media.root.display()))?;

    let state = AppState::from_config(&config)
        .await
        .context("initialising application state")?;
    let jwt = state.jwt.clone();
    let state = web::Data::new(state);

    let bind_address = config.bind_address();
    tracing::info!(address = %bind_address, workers = config.app.workers, "HTTP server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::FormConfig::default().limit(FORM_LIMIT_BYTES))
            .wrap(JwtAuthMiddleware::new(jwt.clone()))
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .workers(config.app.workers.max(1))
    .bind(&bind_address)
    .with_context(|| format!("binding {}", bind_address))?
    .run()
    .await?;

    tracing::info!("posts-service stopped");
    Ok(())
}

/// Probe the local `/health` endpoint; used by container healthchecks
async fn healthcheck(config: &Config) -> anyhow::Result<()> {
    let url = format!("http://127.0.0.1:{}/health", config.app.port);
    let resp = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?
        .get(&url)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;

    if !resp.status().is_success() {
        bail!("healthcheck HTTP status: {}", resp.status());
    }
    Ok(())
}

fn warn_if_ephemeral(config: &Config) {
    if config.database.url == MEMORY_DATABASE_URL {
        tracing::warn!("DATABASE_URL is not set; changes made by this command are not persisted");
    }
}

async fn create_user(config: &Config, username: &str) -> anyhow::Result<()> {
    warn_if_ephemeral(config);
    let store = db::connect(&config.database).await?;

    let user = match store.find_user_by_username(username).await? {
        Some(user) => user,
        None => store.upsert_user(Uuid::new_v4(), username).await?,
    };

    println!("{}\t{}", user.id, user.username);
    Ok(())
}

async fn create_group(
    config: &Config,
    slug: &str,
    title: &str,
    description: String,
) -> anyhow::Result<()> {
    warn_if_ephemeral(config);
    let store = db::connect(&config.database).await?;

    let group = store
        .create_group(NewGroup {
            title: title.to_string(),
            slug: slug.to_string(),
            description,
        })
        .await?;

    println!("{}\t{}\t{}", group.id, group.slug, group);
    Ok(())
}

async fn issue_token(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = db::connect(&config.database).await?;
    let user = store
        .find_user_by_username(username)
        .await?
        .with_context(|| format!("no user named '{}'", username))?;

    let keys = JwtKeys::from_secret(&config.auth.jwt_secret, config.auth.token_ttl_secs);
    println!("{}", keys.issue(user.id, &user.username)?);
    Ok(())
}
