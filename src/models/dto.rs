//pour les réponses structurées
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::interactions::{WatchStatus, WatchedSeasons};
use crate::models::titles::Kind;

// 1 titre de la collection avec les entrées de chaque utilisateur
#[derive(Debug, Serialize)]
pub struct CollectionEntry {
    pub title: TitleInfo,
    pub interactions: Vec<InteractionInfo>,
}

#[derive(Debug, Serialize)]
pub struct TitleInfo {
    pub catalog_id: i32,
    pub kind: Kind,
    pub title: String,
    pub overview: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub release_date: String,
}

#[derive(Debug, Serialize)]
pub struct InteractionInfo {
    pub user: AuthorInfo,
    pub rating: i32,
    pub review: String,
    pub status: WatchStatus,
    pub watched_seasons: WatchedSeasons,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AuthorInfo {
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

// Entrée de l'utilisateur courant, pour pré-remplir le formulaire d'édition
#[derive(Debug, Serialize)]
pub struct SavedEntry {
    pub rating: i32,
    pub review: String,
    pub status: WatchStatus,
    pub watched_seasons: WatchedSeasons,
}

#[derive(Debug, Serialize)]
pub struct ProfileInfo {
    pub user_id: i32,
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}
