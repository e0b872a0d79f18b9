use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::utils::jwt;

/// Nom du cookie de session posé au login
pub const SESSION_COOKIE: &str = "atitino_session";

/// Contexte de la requête: l'utilisateur authentifié.
/// Passé explicitement aux services, jamais lu depuis un état global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

/// Implémentation de FromRequest pour AuthUser
/// Le token vient du cookie de session ou, à défaut, du header Authorization
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate_request(req))
    }
}

fn authenticate_request(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::Internal("AppConfig is not registered".to_string()))?;

    let token = extract_token(req).ok_or(AppError::Unauthenticated)?;

    let claims = jwt::verify_token(&config.jwt_secret, &token).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        AppError::Unauthenticated
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
    })
}

fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    // Format: "Bearer <token>"
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Cookie de session contenant le JWT
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(jwt::SESSION_HOURS))
        .finish()
}

/// Cookie expiré, pour le logout
pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn request() -> TestRequest {
        TestRequest::default().app_data(web::Data::new(AppConfig::for_tests()))
    }

    fn token_for(user_id: i32, username: &str) -> String {
        jwt::generate_token(&AppConfig::for_tests().jwt_secret, user_id, username).unwrap()
    }

    #[test]
    fn test_missing_token_is_unauthenticated() {
        let req = request().to_http_request();
        assert!(matches!(authenticate_request(&req), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn test_bearer_header_accepted() {
        let req = request()
            .insert_header(("Authorization", format!("Bearer {}", token_for(3, "rafa"))))
            .to_http_request();

        let user = authenticate_request(&req).unwrap();
        assert_eq!(user.user_id, 3);
        assert_eq!(user.username, "rafa");
    }

    #[test]
    fn test_session_cookie_accepted() {
        let req = request()
            .cookie(session_cookie(token_for(4, "bia")))
            .to_http_request();

        let user = authenticate_request(&req).unwrap();
        assert_eq!(user.user_id, 4);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let forged = jwt::generate_token("default-insecure-key-change-this", 1, "ana").unwrap();
        let req = request()
            .insert_header(("Authorization", format!("Bearer {}", forged)))
            .to_http_request();

        assert!(matches!(authenticate_request(&req), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn test_malformed_header_rejected() {
        let req = request()
            .insert_header(("Authorization", "Token abc"))
            .to_http_request();
        assert!(authenticate_request(&req).is_err());

        let req = request()
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_http_request();
        assert!(authenticate_request(&req).is_err());
    }
}
