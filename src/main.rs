mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::services::image_uploader::{CloudinaryUploader, ImageUploader};
use crate::services::tmdb_client::{TitleCatalog, TmdbClient};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atitino=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    tracing::info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    db::setup_schema(&db).await.map_err(std::io::Error::other)?;
    tracing::info!("Database connected, schema ready");

    if config.cloudinary.cloud_name.is_empty() {
        tracing::warn!("CLOUDINARY_CLOUD_NAME not set, avatar uploads will fail");
    }

    let catalog: Arc<dyn TitleCatalog> = Arc::new(TmdbClient::new(&config.tmdb));
    let uploader: Arc<dyn ImageUploader> = Arc::new(CloudinaryUploader::new(config.cloudinary.clone()));

    let bind_addr = config.bind_addr.clone();
    let config = web::Data::new(config);

    tracing::info!(%bind_addr, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(db.clone()))
            .app_data(config.clone())
            .app_data(web::Data::from(catalog.clone()))
            .app_data(web::Data::from(uploader.clone()))
            .configure(routes::configure_routes)
    })
        .bind(bind_addr)?
        .run()
        .await
}
