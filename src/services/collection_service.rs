/*
services/collection_service.rs
├─ save_title()        ← crée/retrouve le titre partagé + upsert de l'interaction
├─ delete_title()      ← retire l'interaction, supprime le titre orphelin
├─ collection()        ← vue d'accueil: tous les titres avec les entrées de chacun
└─ interaction_for()   ← entrée de l'utilisateur courant (pré-remplissage)

Tout ce qui touche titles + interactions passe par UNE transaction.
La ligne du titre est verrouillée (SELECT ... FOR UPDATE) pour que
save et delete concurrents sur le même titre soient sérialisés par la BD.
*/
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use std::collections::{HashMap, HashSet};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::{AuthorInfo, CollectionEntry, InteractionInfo, SavedEntry, TitleInfo};
use crate::models::interactions::{self, WatchStatus, WatchedSeasons};
use crate::models::titles::{self, Kind};
use crate::models::users;

/// Données d'un enregistrement: métadonnées du titre + entrée de l'utilisateur
#[derive(Debug, Clone, Validate)]
pub struct SaveTitle {
    #[validate(range(min = 1, message = "tmdbId must be a positive integer"))]
    pub catalog_id: i32,
    pub kind: Kind,
    pub title: String,
    pub overview: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub release_date: String,
    #[validate(range(min = 0, max = 5, message = "rating must be between 0 and 5"))]
    pub rating: i32,
    pub review: String,
    pub status: WatchStatus,
    pub watched_seasons: WatchedSeasons,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Rien à retirer pour cet utilisateur
    NotInCollection,
    /// Interaction retirée; title_deleted si c'était la dernière
    Removed { title_deleted: bool },
}

pub struct CollectionService;

impl CollectionService {
    /// Enregistre (ou met à jour) l'entrée de l'utilisateur sur un titre.
    /// Les métadonnées d'un titre existant ne sont jamais modifiées.
    pub async fn save_title(
        db: &DatabaseConnection,
        actor: &AuthUser,
        input: SaveTitle,
    ) -> AppResult<interactions::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let txn = db.begin().await?;

        // Session d'un compte supprimé: arrêt avant toute écriture
        if users::Entity::find_by_id(actor.user_id).one(&txn).await?.is_none() {
            tracing::info!(user_id = actor.user_id, "save rejected, user not found");
            return Err(AppError::Unauthenticated);
        }

        let title = Self::resolve_title(&txn, &input).await?;
        let interaction = Self::upsert_interaction(&txn, actor.user_id, title.id, &input).await?;

        txn.commit().await?;

        tracing::info!(
            user = %actor.username,
            catalog_id = title.catalog_id,
            kind = %title.kind,
            "title saved"
        );
        Ok(interaction)
    }

    /// Retire le titre de la collection de l'utilisateur.
    /// Titre inconnu ou jamais enregistré par l'utilisateur: no-op.
    pub async fn delete_title(
        db: &DatabaseConnection,
        actor: &AuthUser,
        catalog_id: i32,
        kind: Kind,
    ) -> AppResult<DeleteOutcome> {
        let txn = db.begin().await?;

        let title = match Self::find_title_for_update(&txn, catalog_id, kind).await? {
            Some(title) => title,
            None => {
                txn.commit().await?;
                return Ok(DeleteOutcome::NotInCollection);
            }
        };

        // delete_many: une interaction absente donne 0 ligne, pas une erreur
        let removed = interactions::Entity::delete_many()
            .filter(interactions::Column::UserId.eq(actor.user_id))
            .filter(interactions::Column::TitleId.eq(title.id))
            .exec(&txn)
            .await?;

        // Comptage dans la même transaction, ligne du titre verrouillée
        let remaining = interactions::Entity::find()
            .filter(interactions::Column::TitleId.eq(title.id))
            .count(&txn)
            .await?;

        let title_deleted = remaining == 0;
        if title_deleted {
            titles::Entity::delete_by_id(title.id).exec(&txn).await?;
        }

        txn.commit().await?;

        if removed.rows_affected == 0 && !title_deleted {
            tracing::debug!(user = %actor.username, catalog_id, %kind, "nothing to remove");
            return Ok(DeleteOutcome::NotInCollection);
        }

        tracing::info!(
            user = %actor.username,
            catalog_id,
            %kind,
            title_deleted,
            "title removed from collection"
        );
        Ok(DeleteOutcome::Removed { title_deleted })
    }

    /// Tous les titres avec les entrées de chaque utilisateur,
    /// du plus récemment modifié au plus ancien
    pub async fn collection(db: &DatabaseConnection) -> AppResult<Vec<CollectionEntry>> {
        // 1. Titres + interactions en une requête
        let titles_with_interactions = titles::Entity::find()
            .find_with_related(interactions::Entity)
            .all(db)
            .await?;

        // 2. Tous les auteurs en UNE SEULE query
        let user_ids: Vec<i32> = titles_with_interactions
            .iter()
            .flat_map(|(_, items)| items.iter().map(|i| i.user_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        // 3. Construire la réponse
        let mut entries: Vec<CollectionEntry> = titles_with_interactions
            .into_iter()
            .map(|(title, mut items)| {
                items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

                let interactions = items
                    .into_iter()
                    .filter_map(|i| {
                        let author = authors.get(&i.user_id)?;
                        Some(InteractionInfo {
                            user: AuthorInfo {
                                username: author.username.clone(),
                                name: author.name.clone(),
                                avatar_url: author.avatar_url.clone(),
                            },
                            rating: i.rating,
                            review: i.review,
                            status: i.status,
                            watched_seasons: i.watched_seasons,
                            updated_at: i.updated_at,
                        })
                    })
                    .collect();

                CollectionEntry {
                    title: TitleInfo {
                        catalog_id: title.catalog_id,
                        kind: title.kind,
                        title: title.title,
                        overview: title.overview,
                        poster_path: title.poster_path,
                        backdrop_path: title.backdrop_path,
                        release_date: title.release_date,
                    },
                    interactions,
                }
            })
            .collect();

        entries.sort_by(|a, b| latest_update(b).cmp(&latest_update(a)));

        Ok(entries)
    }

    /// Entrée de l'utilisateur courant pour un titre, s'il l'a enregistré
    pub async fn interaction_for(
        db: &DatabaseConnection,
        actor: &AuthUser,
        catalog_id: i32,
        kind: Kind,
    ) -> AppResult<Option<SavedEntry>> {
        let title = titles::Entity::find()
            .filter(titles::Column::CatalogId.eq(catalog_id))
            .filter(titles::Column::Kind.eq(kind))
            .one(db)
            .await?;

        let Some(title) = title else {
            return Ok(None);
        };

        let interaction = interactions::Entity::find()
            .filter(interactions::Column::UserId.eq(actor.user_id))
            .filter(interactions::Column::TitleId.eq(title.id))
            .one(db)
            .await?;

        Ok(interaction.map(|i| SavedEntry {
            rating: i.rating,
            review: i.review,
            status: i.status,
            watched_seasons: i.watched_seasons,
        }))
    }

    /// INSERT ... ON CONFLICT DO NOTHING puis relecture verrouillée.
    /// Si un delete concurrent a supprimé le titre entre les deux,
    /// la relecture est vide et le titre est recréé au tour suivant.
    async fn resolve_title(txn: &DatabaseTransaction, input: &SaveTitle) -> AppResult<titles::Model> {
        for _ in 0..2 {
            let new_title = titles::ActiveModel {
                catalog_id: Set(input.catalog_id),
                kind: Set(input.kind),
                title: Set(input.title.clone()),
                overview: Set(input.overview.clone()),
                poster_path: Set(input.poster_path.clone()),
                backdrop_path: Set(input.backdrop_path.clone()),
                release_date: Set(input.release_date.clone()),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            };

            titles::Entity::insert(new_title)
                .on_conflict(
                    OnConflict::columns([titles::Column::CatalogId, titles::Column::Kind])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await?;

            if let Some(title) = Self::find_title_for_update(txn, input.catalog_id, input.kind).await? {
                return Ok(title);
            }
        }

        Err(AppError::Internal(format!(
            "title {}/{} could not be resolved",
            input.kind, input.catalog_id
        )))
    }

    async fn find_title_for_update(
        txn: &DatabaseTransaction,
        catalog_id: i32,
        kind: Kind,
    ) -> AppResult<Option<titles::Model>> {
        let title = titles::Entity::find()
            .filter(titles::Column::CatalogId.eq(catalog_id))
            .filter(titles::Column::Kind.eq(kind))
            .lock_exclusive()
            .one(txn)
            .await?;
        Ok(title)
    }

    async fn upsert_interaction(
        txn: &DatabaseTransaction,
        user_id: i32,
        title_id: i32,
        input: &SaveTitle,
    ) -> AppResult<interactions::Model> {
        let now = chrono::Utc::now();

        // Chercher si existe
        let existing = interactions::Entity::find()
            .filter(interactions::Column::UserId.eq(user_id))
            .filter(interactions::Column::TitleId.eq(title_id))
            .one(txn)
            .await?;

        let saved = match existing {
            Some(model) => {
                // UPDATE
                let mut active: interactions::ActiveModel = model.into();
                active.rating = Set(input.rating);
                active.review = Set(input.review.clone());
                active.status = Set(input.status);
                active.watched_seasons = Set(input.watched_seasons.clone());
                active.updated_at = Set(now);
                active.update(txn).await?
            }
            None => {
                // INSERT
                let new = interactions::ActiveModel {
                    user_id: Set(user_id),
                    title_id: Set(title_id),
                    rating: Set(input.rating),
                    review: Set(input.review.clone()),
                    status: Set(input.status),
                    watched_seasons: Set(input.watched_seasons.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                new.insert(txn).await?
            }
        };

        Ok(saved)
    }
}

fn latest_update(entry: &CollectionEntry) -> Option<chrono::DateTime<chrono::Utc>> {
    entry.interactions.iter().map(|i| i.updated_at).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    async fn create_user(db: &DatabaseConnection, username: &str) -> AuthUser {
        let user = users::ActiveModel {
            username: Set(username.to_string()),
            name: Set(username.to_uppercase()),
            password_hash: Set("pbkdf2:sha256:1000$c2FsdA$aGFzaA".to_string()),
            avatar_url: Set(None),
            bio: Set(None),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();

        AuthUser {
            user_id: user.id,
            username: user.username,
        }
    }

    fn matrix(rating: i32) -> SaveTitle {
        SaveTitle {
            catalog_id: 603,
            kind: Kind::Movie,
            title: "Matrix".to_string(),
            overview: "Neo descobre a verdade".to_string(),
            poster_path: "/matrix.jpg".to_string(),
            backdrop_path: "/matrix-bg.jpg".to_string(),
            release_date: "1999-03-31".to_string(),
            rating,
            review: String::new(),
            status: WatchStatus::Watched,
            watched_seasons: WatchedSeasons::new(),
        }
    }

    async fn title_count(db: &DatabaseConnection) -> u64 {
        titles::Entity::find().count(db).await.unwrap()
    }

    async fn interaction_count(db: &DatabaseConnection) -> u64 {
        interactions::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_twice_is_idempotent() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;

        CollectionService::save_title(&db, &ana, matrix(4)).await.unwrap();
        CollectionService::save_title(&db, &ana, matrix(4)).await.unwrap();

        assert_eq!(title_count(&db).await, 1);
        assert_eq!(interaction_count(&db).await, 1);

        let entry = CollectionService::interaction_for(&db, &ana, 603, Kind::Movie)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.rating, 4);
    }

    #[tokio::test]
    async fn test_second_save_updates_interaction_in_place() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;

        let first = CollectionService::save_title(&db, &ana, matrix(2)).await.unwrap();

        let mut update = matrix(5);
        update.review = "Obra prima".to_string();
        update.status = WatchStatus::Watching;
        let second = CollectionService::save_title(&db, &ana, update).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.rating, 5);
        assert_eq!(second.review, "Obra prima");
        assert_eq!(second.status, WatchStatus::Watching);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_title_metadata_is_frozen_at_first_save() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;
        let bia = create_user(&db, "bia").await;

        CollectionService::save_title(&db, &ana, matrix(5)).await.unwrap();

        let mut later = matrix(3);
        later.title = "The Matrix (Remastered)".to_string();
        later.poster_path = "/new.jpg".to_string();
        CollectionService::save_title(&db, &bia, later).await.unwrap();

        let title = titles::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(title.title, "Matrix");
        assert_eq!(title.poster_path, "/matrix.jpg");
    }

    #[tokio::test]
    async fn test_shared_title_lifecycle() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;
        let bia = create_user(&db, "bia").await;

        // A enregistre 603 avec la note 5
        CollectionService::save_title(&db, &ana, matrix(5)).await.unwrap();
        assert_eq!(title_count(&db).await, 1);

        // B enregistre le même titre avec la note 3
        CollectionService::save_title(&db, &bia, matrix(3)).await.unwrap();
        assert_eq!(title_count(&db).await, 1);
        assert_eq!(interaction_count(&db).await, 2);

        let mut ratings: Vec<i32> = interactions::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.rating)
            .collect();
        ratings.sort();
        assert_eq!(ratings, vec![3, 5]);

        // A retire: le titre reste pour B
        let outcome = CollectionService::delete_title(&db, &ana, 603, Kind::Movie)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Removed { title_deleted: false });
        assert_eq!(title_count(&db).await, 1);
        let remaining = CollectionService::interaction_for(&db, &bia, 603, Kind::Movie)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining.rating, 3);

        // B retire: le titre orphelin disparaît
        let outcome = CollectionService::delete_title(&db, &bia, 603, Kind::Movie)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Removed { title_deleted: true });
        assert_eq!(title_count(&db).await, 0);
        assert_eq!(interaction_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_title_is_noop() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;

        let outcome = CollectionService::delete_title(&db, &ana, 42, Kind::Series)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::NotInCollection);
    }

    #[tokio::test]
    async fn test_delete_title_user_never_saved_keeps_others() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;
        let bia = create_user(&db, "bia").await;

        CollectionService::save_title(&db, &ana, matrix(5)).await.unwrap();

        let outcome = CollectionService::delete_title(&db, &bia, 603, Kind::Movie)
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::NotInCollection);
        assert_eq!(title_count(&db).await, 1);
        assert_eq!(interaction_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_kind_separates_titles_with_same_catalog_id() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;

        CollectionService::save_title(&db, &ana, matrix(5)).await.unwrap();

        let mut series = matrix(4);
        series.kind = Kind::Series;
        series.watched_seasons = [2, 1].into_iter().collect();
        CollectionService::save_title(&db, &ana, series).await.unwrap();

        assert_eq!(title_count(&db).await, 2);

        CollectionService::delete_title(&db, &ana, 603, Kind::Movie).await.unwrap();
        assert_eq!(title_count(&db).await, 1);

        let entry = CollectionService::interaction_for(&db, &ana, 603, Kind::Series)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.watched_seasons.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_invalid_rating_writes_nothing() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;

        let result = CollectionService::save_title(&db, &ana, matrix(9)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(title_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_save_for_deleted_account_is_unauthenticated() {
        let db = test_connection().await;
        // Jeton encore valide, compte disparu
        let ghost = AuthUser {
            user_id: 9999,
            username: "ghost".to_string(),
        };

        let result = CollectionService::save_title(&db, &ghost, matrix(5)).await;

        assert!(matches!(result, Err(AppError::Unauthenticated)));
        assert_eq!(title_count(&db).await, 0);
        assert_eq!(interaction_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_collection_lists_each_users_entry() {
        let db = test_connection().await;
        let ana = create_user(&db, "ana").await;
        let bia = create_user(&db, "bia").await;

        CollectionService::save_title(&db, &ana, matrix(5)).await.unwrap();
        let mut review = matrix(3);
        review.review = "Bom, mas longo".to_string();
        CollectionService::save_title(&db, &bia, review).await.unwrap();

        let collection = CollectionService::collection(&db).await.unwrap();

        assert_eq!(collection.len(), 1);
        let entry = &collection[0];
        assert_eq!(entry.title.catalog_id, 603);
        assert_eq!(entry.interactions.len(), 2);

        let authors: HashSet<&str> = entry
            .interactions
            .iter()
            .map(|i| i.user.username.as_str())
            .collect();
        assert!(authors.contains("ana"));
        assert!(authors.contains("bia"));

        let bia_entry = entry
            .interactions
            .iter()
            .find(|i| i.user.username == "bia")
            .unwrap();
        assert_eq!(bia_entry.review, "Bom, mas longo");
    }
}
