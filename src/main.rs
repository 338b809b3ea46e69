use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use parkhub::{
    auth::JwtKeys,
    cache::ReadCache,
    config::AppConfig,
    db::connection,
    jobs::{self, JobEnv, JobRegistry},
    logging::init_tracing,
    middleware::{catch_panic_layer, json_error_middleware},
    notify::Notifications,
    routes::router,
    services::ServiceContext,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().expect("failed to load config");
    init_tracing(&cfg.logging.rust_log);

    let database_cfg = cfg
        .database
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("database config is required (APP_DATABASE__URL)"))?;
    let auth_cfg = cfg
        .auth
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("auth config is required (APP_AUTH__JWT_SECRET)"))?;

    let db = connection::connect(database_cfg).await?;
    let services = ServiceContext::new(&db);

    let jwt = JwtKeys::from_secret(auth_cfg.jwt_secret.as_bytes());
    services.auth(&jwt).seed_admin(auth_cfg).await?;

    let notifications = Notifications::from_config(&cfg)?;
    let registry = JobRegistry::new();
    let queue = jobs::spawn_worker(JobEnv {
        db: db.clone(),
        notifications,
        config: cfg.jobs.clone(),
        registry,
    });
    jobs::scheduler::spawn(queue.clone(), &cfg.jobs);

    let lot_cache = ReadCache::new(Duration::from_secs(cfg.cache.listing_ttl_secs));
    let state = AppState::new(cfg, db, jwt, lot_cache, queue);

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.general.host, state.config.general.port
    )
    .parse()
    .expect("invalid host/port");
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
