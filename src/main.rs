use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;

mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod repository;
mod routes;

use attendance::clock::SystemClock;
use attendance::notifier::{LogNotifier, NoticeDispatcher};
use attendance::{AttendanceEngine, AttendanceQuery, ShiftCache, ShiftResolver};
use config::Config;
use db::init_db;
use repository::{MySqlAttendanceStore, MySqlDirectory};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "OK"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(timezone = %config.timezone, "Server starting...");

    let pool = init_db(&config).await?;

    let store = Arc::new(MySqlAttendanceStore::new(pool.clone()));
    let directory = Arc::new(MySqlDirectory::new(pool.clone()));

    let shifts = ShiftResolver::new(
        directory.clone(),
        ShiftCache::new(config.shift_cache_ttl, config.shift_cache_capacity),
    );
    let notices = NoticeDispatcher::new(Arc::new(LogNotifier), config.notify_timeout);

    let engine = Data::new(AttendanceEngine::new(
        store.clone(),
        directory.clone(),
        shifts.clone(),
        Arc::new(SystemClock),
        config.timezone,
        notices,
    ));
    let query = Data::new(AttendanceQuery::new(store, directory));
    let shifts = Data::new(shifts);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(engine.clone())
            .app_data(query.clone())
            .app_data(shifts.clone())
            .service(index)
            // Attendance routes behind auth + rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
