use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::interactions::{WatchStatus, WatchedSeasons};
use crate::models::titles::Kind;
use crate::routes::see_other;
use crate::services::collection_service::{CollectionService, SaveTitle};

const MAX_FORM_BYTES: usize = 1024 * 1024;

// Formulaire d'édition d'un titre (noms de champs de la page HTML)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveForm {
    #[serde(default)]
    pub tmdb_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: String,
    #[serde(default)]
    pub backdrop_path: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub status: String,
    pub watched_seasons: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteForm {
    #[serde(default)]
    pub tmdb_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

fn parse_catalog_id(raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid tmdbId '{}'", raw)))
}

impl SaveForm {
    /// Note illisible => 0, saisons illisibles => aucune,
    /// type ou statut inconnu => erreur
    pub fn into_save_title(self) -> AppResult<SaveTitle> {
        let status = if self.status.trim().is_empty() {
            WatchStatus::default()
        } else {
            self.status.parse()?
        };

        Ok(SaveTitle {
            catalog_id: parse_catalog_id(&self.tmdb_id)?,
            kind: self.kind.parse()?,
            rating: self.rating.trim().parse().unwrap_or(0),
            watched_seasons: WatchedSeasons::from_form(self.watched_seasons.as_deref())?,
            status,
            title: self.title,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date: self.release_date,
            review: self.review,
        })
    }
}

/// GET /collection - Tous les titres avec les entrées de chacun (PROTÉGÉE)
#[get("")]
pub async fn get_collection(
    _auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let entries = CollectionService::collection(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// POST /collection/save - Enregistrer ou modifier son entrée (PROTÉGÉE)
#[post("/save")]
pub async fn save_title(
    auth_user: AuthUser,
    form: web::Form<SaveForm>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let input = form.into_inner().into_save_title()?;
    CollectionService::save_title(db.get_ref(), &auth_user, input).await?;
    Ok(see_other("/").finish())
}

/// POST /collection/delete - Retirer un titre de sa collection (PROTÉGÉE)
#[post("/delete")]
pub async fn delete_title(
    auth_user: AuthUser,
    form: web::Form<DeleteForm>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let catalog_id = parse_catalog_id(&form.tmdb_id)?;
    let kind: Kind = form.kind.parse()?;

    CollectionService::delete_title(db.get_ref(), &auth_user, catalog_id, kind).await?;
    Ok(see_other("/").finish())
}

pub fn collection_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/collection")
            // Critiques longues (limite par défaut: 16 KiB)
            .app_data(web::FormConfig::default().limit(MAX_FORM_BYTES))
            .service(get_collection)
            .service(save_title)
            .service(delete_title)
    );
}
