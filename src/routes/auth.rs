use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{cleared_session_cookie, session_cookie};
use crate::middleware::AuthUser;
use crate::routes::see_other;
use crate::services::account_service::{AccountService, NewAccount};
use crate::utils::jwt;

// Formulaire de la page de login
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// DTO pour l'inscription
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Réponse après register
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub username: String,
}

// Réponse pour /auth/me
#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: i32,
    pub username: String,
}

/// POST /auth/login - Se connecter (PUBLIC)
/// Pose le cookie de session puis redirige vers l'accueil
#[post("/login")]
pub async fn login(
    form: web::Form<LoginForm>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    let user = AccountService::authenticate(db.get_ref(), &form.username, &form.password).await?;

    let token = jwt::generate_token(&config.jwt_secret, user.id, &user.username).map_err(AppError::Internal)?;

    tracing::info!(user_id = user.id, username = %user.username, "login");
    Ok(see_other("/").cookie(session_cookie(token)).finish())
}

/// POST /auth/register - Créer un compte (PUBLIC, désactivé par défaut)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    if !config.allow_registration {
        return Err(AppError::NotFound("Registration is disabled".to_string()));
    }

    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let body = body.into_inner();
    let user = AccountService::register(
        db.get_ref(),
        NewAccount {
            username: body.username,
            name: body.name,
            password: body.password,
        },
    )
    .await?;

    let token = jwt::generate_token(&config.jwt_secret, user.id, &user.username).map_err(AppError::Internal)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

/// POST /auth/logout - Efface le cookie de session
#[post("/logout")]
pub async fn logout() -> HttpResponse {
    see_other("/login").cookie(cleared_session_cookie()).finish()
}

/// GET /auth/me - Vérifier le token (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        user_id: auth_user.user_id,
        username: auth_user.username,
    })
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(login)
            .service(register)
            .service(logout)
            .service(me)
    );
}
