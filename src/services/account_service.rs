use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::dto::ProfileInfo;
use crate::models::users;
use crate::services::image_uploader::ImageUploader;
use crate::utils::password;

pub struct AccountService;

/// Données d'inscription
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub name: String,
    pub password: String,
}

/// Fichier d'avatar reçu par le formulaire
#[derive(Debug, Clone)]
pub struct AvatarFile {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Formulaire de profil (page settings)
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub username: String,
    pub bio: String,
    /// Vide ou absent: le mot de passe actuel est conservé
    pub password: Option<String>,
    pub avatar_url: Option<String>,
    /// Prioritaire sur avatar_url s'il n'est pas vide
    pub avatar_file: Option<AvatarFile>,
}

impl AccountService {
    /// Vérifie handle + mot de passe.
    /// Même erreur pour un handle inconnu et un mauvais mot de passe.
    pub async fn authenticate(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> AppResult<users::Model> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(db)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_valid = verify_in_background(password.to_string(), user.password_hash.clone()).await?;
        if !is_valid {
            tracing::info!(username, "login rejected");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn register(db: &DatabaseConnection, account: NewAccount) -> AppResult<users::Model> {
        let username = normalize_handle(&account.username)?;
        if account.password.trim().is_empty() {
            return Err(AppError::Validation("Password must not be blank".to_string()));
        }

        // 1. Vérifier si le handle existe déjà
        if find_by_username(db, &username).await?.is_some() {
            return Err(AppError::HandleTaken);
        }

        // 2. Hash le mot de passe
        let password_hash = hash_in_background(account.password).await?;

        // 3. Créer l'utilisateur
        let new_user = users::ActiveModel {
            username: Set(username),
            name: Set(account.name.trim().to_string()),
            password_hash: Set(password_hash),
            avatar_url: Set(None),
            bio: Set(None),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let user = new_user.insert(db).await.map_err(map_unique_violation)?;
        tracing::info!(username = %user.username, "account created");
        Ok(user)
    }

    pub async fn profile(db: &DatabaseConnection, actor: &AuthUser) -> AppResult<ProfileInfo> {
        let user = users::Entity::find_by_id(actor.user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(ProfileInfo {
            user_id: user.id,
            username: user.username,
            name: user.name,
            avatar_url: user.avatar_url,
            bio: user.bio,
        })
    }

    /// Met à jour le profil. L'upload de l'avatar a lieu AVANT toute écriture:
    /// en cas d'échec, rien n'est modifié.
    pub async fn update_profile(
        db: &DatabaseConnection,
        uploader: &dyn ImageUploader,
        actor: &AuthUser,
        update: ProfileUpdate,
    ) -> AppResult<users::Model> {
        let username = normalize_handle(&update.username)?;

        // 1. Récupérer l'utilisateur
        let user = users::Entity::find_by_id(actor.user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // 2. Handle déjà pris par quelqu'un d'autre ?
        if let Some(other) = find_by_username(db, &username).await? {
            if other.id != user.id {
                return Err(AppError::HandleTaken);
            }
        }

        // 3. Avatar: le fichier gagne sur l'URL
        let avatar_url = match update.avatar_file.filter(|file| !file.bytes.is_empty()) {
            Some(file) => Some(uploader.upload(file.bytes, &file.filename).await?),
            None => non_blank(update.avatar_url),
        };

        // 4. Nouveau mot de passe seulement s'il n'est pas vide
        let new_password_hash = match update.password.filter(|p| !p.trim().is_empty()) {
            Some(new_password) => Some(hash_in_background(new_password).await?),
            None => None,
        };

        // 5. Mettre à jour dans la BD
        let mut active_model: users::ActiveModel = user.into();
        active_model.name = Set(update.name.trim().to_string());
        active_model.username = Set(username);
        active_model.bio = Set(non_blank(Some(update.bio)));
        active_model.avatar_url = Set(avatar_url);
        if let Some(hash) = new_password_hash {
            active_model.password_hash = Set(hash);
        }

        let updated = active_model.update(db).await.map_err(map_unique_violation)?;
        tracing::info!(user_id = updated.id, username = %updated.username, "profile updated");
        Ok(updated)
    }
}

async fn find_by_username(db: &DatabaseConnection, username: &str) -> AppResult<Option<users::Model>> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?;
    Ok(user)
}

fn normalize_handle(raw: &str) -> AppResult<String> {
    let handle = raw.trim();
    if handle.is_empty() {
        return Err(AppError::Validation("Username must not be blank".to_string()));
    }
    Ok(handle.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Collision sur l'index unique (deux mises à jour simultanées)
fn map_unique_violation(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::HandleTaken,
        _ => AppError::Database(err),
    }
}

// PBKDF2 est volontairement lent: hors du thread du runtime
async fn hash_in_background(plain: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(AppError::Internal)
}

async fn verify_in_background(plain: String, stored_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(AppError::Internal)
}
