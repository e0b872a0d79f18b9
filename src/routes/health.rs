use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::models::health::HealthResponse;

/// GET /health - état du service et de la connexion BD (PUBLIC)
#[get("/health")]
pub async fn health_check(db: web::Data<DatabaseConnection>) -> HttpResponse {
    let status = match db.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::error!(error = %e, "database ping failed");
            "degraded"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        time: Utc::now(),
    })
}
