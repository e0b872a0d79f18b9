// ============================================================================
// MODÈLE : INTERACTIONS
// ============================================================================
//
// Note, critique, statut et progression d'un utilisateur sur un titre.
// Clé d'unicité: (user_id, title_id).
//
// Colonnes:
//   - rating (INTEGER) - 0 = pas de note, sinon 1..=5
//   - review (TEXT)
//   - status (VARCHAR) - 'WATCHED', 'WATCHING', 'PLAN'
//   - watched_seasons (JSON) - saisons vues, triées, sans doublon
//   - created_at, updated_at
//
// ============================================================================

use std::collections::BTreeSet;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub title_id: i32,
    pub rating: i32,
    #[sea_orm(column_type = "Text")]
    pub review: String,
    pub status: WatchStatus,
    #[sea_orm(column_type = "Json")]
    pub watched_seasons: WatchedSeasons,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchStatus {
    #[default]
    #[sea_orm(string_value = "WATCHED")]
    Watched,
    #[sea_orm(string_value = "WATCHING")]
    Watching,
    #[sea_orm(string_value = "PLAN")]
    Plan,
}

impl FromStr for WatchStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "WATCHED" => Ok(WatchStatus::Watched),
            "WATCHING" => Ok(WatchStatus::Watching),
            "PLAN" => Ok(WatchStatus::Plan),
            other => Err(AppError::Validation(format!(
                "Invalid status '{}'. Must be one of: WATCHED, WATCHING, PLAN",
                other
            ))),
        }
    }
}

/// Ensemble des saisons vues. Sérialisé en tableau JSON croissant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct WatchedSeasons(BTreeSet<u32>);

impl WatchedSeasons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lit le champ `watchedSeasons` d'un formulaire (tableau JSON).
    /// Absent ou illisible => ensemble vide. Une saison <= 0 est refusée.
    pub fn from_form(raw: Option<&str>) -> Result<Self, AppError> {
        let raw = match raw.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => return Ok(Self::new()),
        };

        let numbers: Vec<i64> = match serde_json::from_str(raw) {
            Ok(numbers) => numbers,
            Err(_) => return Ok(Self::new()),
        };

        numbers
            .into_iter()
            .map(|n| {
                u32::try_from(n)
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| AppError::Validation(format!("Invalid season number: {}", n)))
            })
            .collect()
    }

    pub fn contains(&self, season: u32) -> bool {
        self.0.contains(&season)
    }

    /// Coche ou décoche une saison
    pub fn toggle(&mut self, season: u32) {
        if !self.0.remove(&season) {
            self.0.insert(season);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for WatchedSeasons {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::titles::Entity",
        from = "Column::TitleId",
        to = "super::titles::Column::Id",
        on_delete = "Cascade"
    )]
    Title,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Title.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
