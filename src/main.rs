use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod config;
mod db;
mod docs;
mod model;
mod models;
mod notify;
mod routes;
mod store;
mod utils;

use api::{attendance::Skill, clock::Clock, signature};
use config::Config;
use db::{ensure_schema, init_db};
use notify::{DisabledNotifier, Notifier, line::LineNotifier};
use store::{TimecardStore, mysql::MySqlTimecardStore};

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    ensure_schema(&pool, &config.table)
        .await
        .context("Failed to create timecard table")?;

    let store: Arc<dyn TimecardStore> = Arc::new(MySqlTimecardStore::new(pool, &config.table));
    let notifier: Arc<dyn Notifier> = match config.channel_access_token.as_deref() {
        Some(token) => Arc::new(
            LineNotifier::new(&config.line_api_base, token)
                .context("Failed to build LINE client")?,
        ),
        None => {
            warn!("CHANNEL_ACCESS_TOKEN not set, LINE push disabled");
            Arc::new(DisabledNotifier)
        }
    };
    let skill = Skill::new(store, notifier);
    let signatures = Data::new(
        signature::load(&config)
            .await
            .context("Failed to load CEK public key")?,
    );

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(skill.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(signatures.clone())
            .app_data(Data::new(Clock::system()))
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
