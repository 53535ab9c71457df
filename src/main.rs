use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, middleware, web};

use lawdesk::auth::{password, rate_limit::{self, LoginLimiter}};
use lawdesk::config::AppConfig;
use lawdesk::{db, handlers};

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is normal; anything else is worth knowing about.
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }
    env_logger::init();

    let config = AppConfig::from_env();

    let pool = db::init_pool(&config.database_url, config.max_connections)
        .await
        .map_err(std::io::Error::other)?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;

    let admin_hash = password::hash_password(&config.admin_password)
        .map_err(std::io::Error::other)?;
    db::seed_admin(&pool, &config.admin_email, &admin_hash)
        .await
        .map_err(std::io::Error::other)?;

    let secret_key = config.cookie_key();
    let limiter = LoginLimiter::default();
    rate_limit::spawn_pruner(limiter.clone(), LIMITER_PRUNE_INTERVAL);
    let limiter = web::Data::new(limiter);
    let pool = web::Data::new(pool);
    let cookie_secure = config.cookie_secure;

    log::info!("Starting server at http://{}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(limiter.clone())
            .configure(handlers::configure)
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
