// ============================================================================
// MODÈLE : TITLES
// ============================================================================
//
// Un titre partagé par catalogue TMDB. Clé d'unicité: (catalog_id, kind).
//
// Colonnes:
//   - id (SERIAL)
//   - catalog_id (INTEGER) - id TMDB
//   - kind (VARCHAR) - 'movie' ou 'tv'
//   - title, overview, poster_path, backdrop_path, release_date
//     copiés au premier enregistrement, jamais rafraîchis ensuite
//   - created_at
//
// Points d'attention:
//   - Un titre sans interaction ne doit pas exister: il est supprimé dans
//     la même transaction que sa dernière interaction
//     (voir CollectionService::delete_title)
//
// ============================================================================

use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "titles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub catalog_id: i32,
    pub kind: Kind,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub overview: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub release_date: String,
    pub created_at: DateTimeUtc,
}

/// Film ou série. Les deux partagent le même espace d'ids TMDB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum Kind {
    #[sea_orm(string_value = "movie")]
    #[serde(rename = "movie")]
    Movie,
    #[sea_orm(string_value = "tv")]
    #[serde(rename = "tv", alias = "series")]
    Series,
}

impl Kind {
    /// Segment utilisé par TMDB dans ses URLs (/movie/{id}, /tv/{id})
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Movie => "movie",
            Kind::Series => "tv",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "movie" => Ok(Kind::Movie),
            "tv" | "series" => Ok(Kind::Series),
            other => Err(AppError::Validation(format!(
                "Invalid type '{}'. Must be one of: movie, tv",
                other
            ))),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::interactions::Entity")]
    Interactions,
}

impl Related<super::interactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Interactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
