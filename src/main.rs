use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use payroll_service::auth::credentials::{CredentialVerifier, StaticCredentials};
use payroll_service::config::Config;
use payroll_service::docs::ApiDoc;
use payroll_service::routes::{self, RateLimits};
use payroll_service::{error, store};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(if config.development {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(backend = ?config.store_backend, "Server starting...");

    error::expose_internal_details(config.development);

    let store = store::connect(&config).await?;
    let verifier: Arc<dyn CredentialVerifier> = Arc::new(
        StaticCredentials::admin(config.admin_username.clone(), &config.admin_password)
            .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))?,
    );
    let limits = RateLimits::from_config(&config)?;

    let server_addr = config.server_addr.clone();
    let store = Data::from(store);
    let verifier = Data::from(verifier);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let config = config_data.clone();
        let limits = limits.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(verifier.clone())
            .app_data(config.clone())
            .configure(move |cfg| routes::configure(cfg, &config, &limits))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
