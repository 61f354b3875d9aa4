use crate::aggregator::Aggregator;
use crate::api::routes::analytics::analytics_routes;
use crate::api::routes::chainhook::chainhook_routes;
use actix_web::middleware::{Compress, NormalizePath, TrailingSlash};
use actix_web::{middleware, web::Data, App, HttpServer};
use actix_web::{web, HttpResponse};
use anyhow::Error;
use log::info;
use serde_json::json;
use shared::security::bearer_auth::BearerAuth;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Chainhook deliveries can carry many blocks at once.
const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Mutex<Aggregator>>,
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "marketplace-listener"
    }))
}

/// Serves Chainhook callbacks until `cancellation_token` fires, then stops
/// gracefully, letting in-flight deliveries finish.
pub async fn start_server(
    host: &str,
    port: u16,
    app_state: AppState,
    auth_token: String,
    cancellation_token: CancellationToken,
) -> Result<(), Error> {
    info!("Starting server at http://{host}:{port}");
    let app_state = Data::new(app_state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(Compress::default())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .app_data(web::PayloadConfig::default().limit(MAX_PAYLOAD_BYTES))
            .route("/ping", web::get().to(ping))
            .service(chainhook_routes().wrap(BearerAuth::new(auth_token.clone())))
            .service(analytics_routes().wrap(BearerAuth::new(auth_token.clone())))
            .default_service(web::route().to(|| async {
                HttpResponse::NotFound().json(json!({
                    "success": false,
                    "error": "Resource not found"
                }))
            }))
    })
    .bind((host, port))?
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        cancellation_token.cancelled().await;
        info!("Stopping callback server");
        handle.stop(true).await;
    });

    server.await?;
    Ok(())
}
