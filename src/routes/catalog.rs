use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::SavedEntry;
use crate::models::titles::Kind;
use crate::services::collection_service::CollectionService;
use crate::services::tmdb_client::{SearchHit, TitleCatalog, TitleDetails};

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// Page de détail: métadonnées TMDB + entrée de l'utilisateur pour le formulaire
#[derive(Serialize)]
pub struct TitleView {
    pub details: TitleDetails,
    pub saved: Option<SavedEntry>,
}

/// GET /search?q= - Recherche films et séries (PROTÉGÉE)
/// Une panne TMDB donne une liste vide, jamais une erreur
#[get("/search")]
pub async fn search(
    _auth_user: AuthUser,
    query: web::Query<SearchQuery>,
    catalog: web::Data<dyn TitleCatalog>,
) -> HttpResponse {
    let hits: Vec<SearchHit> = match catalog.search(&query.q).await {
        Ok(hits) => hits,
        Err(e) => {
            tracing::error!(error = %e, query = %query.q, "search failed");
            Vec::new()
        }
    };

    HttpResponse::Ok().json(hits)
}

/// GET /titles/{kind}/{id} - Détail d'un titre (PROTÉGÉE)
#[get("/titles/{kind}/{id}")]
pub async fn title_details(
    auth_user: AuthUser,
    path: web::Path<(String, i32)>,
    catalog: web::Data<dyn TitleCatalog>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let (kind, catalog_id) = path.into_inner();
    let kind: Kind = kind.parse()?;

    let details = catalog
        .details(catalog_id, kind)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", kind, catalog_id)))?;

    let saved = CollectionService::interaction_for(db.get_ref(), &auth_user, catalog_id, kind).await?;

    Ok(HttpResponse::Ok().json(TitleView { details, saved }))
}

pub fn catalog_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(search).service(title_details);
}
