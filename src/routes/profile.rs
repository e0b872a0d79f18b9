use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{get, post, web, HttpResponse};
use futures::TryStreamExt;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::session_cookie;
use crate::middleware::AuthUser;
use crate::routes::see_other;
use crate::services::account_service::{AccountService, AvatarFile, ProfileUpdate};
use crate::services::image_uploader::ImageUploader;
use crate::utils::jwt;

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", err))
}

async fn read_field(field: &mut Field, limit: usize) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
        if buffer.len() + chunk.len() > limit {
            return Err(AppError::Validation("Field is too large".to_string()));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

fn into_text(bytes: Vec<u8>) -> AppResult<String> {
    String::from_utf8(bytes).map_err(|_| AppError::Validation("Field is not valid UTF-8".to_string()))
}

/// Lit le formulaire settings: name, username, bio, password, avatarUrl, avatarFile
async fn read_profile_form(mut payload: Multipart) -> AppResult<ProfileUpdate> {
    let mut update = ProfileUpdate::default();

    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "avatarFile" {
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string)
                .unwrap_or_else(|| "avatar".to_string());
            let bytes = read_field(&mut field, MAX_AVATAR_BYTES).await?;
            update.avatar_file = Some(AvatarFile { bytes, filename });
            continue;
        }

        let value = into_text(read_field(&mut field, MAX_TEXT_FIELD_BYTES).await?)?;
        match name.as_str() {
            "name" => update.name = value,
            "username" => update.username = value,
            "bio" => update.bio = value,
            "password" => update.password = Some(value),
            "avatarUrl" => update.avatar_url = Some(value),
            other => tracing::debug!(field = other, "ignored profile field"),
        }
    }

    Ok(update)
}

/// GET /profile - Données de la page settings (PROTÉGÉE)
#[get("")]
pub async fn get_profile(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let profile = AccountService::profile(db.get_ref(), &auth_user).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /profile - Mise à jour du profil (PROTÉGÉE)
/// Le handle peut changer: le cookie de session est ré-émis
#[post("")]
pub async fn update_profile(
    auth_user: AuthUser,
    payload: Multipart,
    db: web::Data<DatabaseConnection>,
    uploader: web::Data<dyn ImageUploader>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    let update = read_profile_form(payload).await?;

    let user = AccountService::update_profile(db.get_ref(), uploader.get_ref(), &auth_user, update).await?;

    let token = jwt::generate_token(&config.jwt_secret, user.id, &user.username).map_err(AppError::Internal)?;
    Ok(see_other("/").cookie(session_cookie(token)).finish())
}

pub fn profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .service(get_profile)
            .service(update_profile)
    );
}
