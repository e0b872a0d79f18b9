use chrono::{DateTime, Utc};
use serde::Serialize;

/// "ok", ou "degraded" si la BD ne répond pas
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTime<Utc>,
}
