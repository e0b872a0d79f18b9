// Configuration chargée une seule fois au démarrage (.env + variables d'environnement)

use std::env;

use crate::error::{AppError, AppResult};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_TMDB_LANGUAGE: &str = "pt-BR";
const DEFAULT_CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com/v1_1";
const AVATAR_FOLDER: &str = "atitino-avatars";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Clé HS256 des jetons de session, sans valeur par défaut
    pub jwt_secret: String,
    pub allow_registration: bool,
    pub tmdb: TmdbConfig,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub folder: String,
}

impl AppConfig {
    /// Lit la configuration depuis l'environnement.
    /// DATABASE_URL, JWT_SECRET et TMDB_API_KEY sont obligatoires.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Internal(format!("{} must be set in .env file", name)))
        };
        let optional = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: optional("BIND_ADDR", DEFAULT_BIND_ADDR),
            jwt_secret: required("JWT_SECRET")?,
            allow_registration: parse_flag(lookup("ALLOW_REGISTRATION").as_deref()),
            tmdb: TmdbConfig {
                api_key: required("TMDB_API_KEY")?,
                base_url: optional("TMDB_BASE_URL", DEFAULT_TMDB_BASE_URL),
                language: optional("TMDB_LANGUAGE", DEFAULT_TMDB_LANGUAGE),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: optional("CLOUDINARY_CLOUD_NAME", ""),
                api_key: optional("CLOUDINARY_API_KEY", ""),
                api_secret: optional("CLOUDINARY_API_SECRET", ""),
                base_url: optional("CLOUDINARY_BASE_URL", DEFAULT_CLOUDINARY_BASE_URL),
                folder: AVATAR_FOLDER.to_string(),
            },
        })
    }

    /// Configuration minimale pour les tests (aucun service externe)
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: "test-session-secret".to_string(),
            allow_registration: false,
            tmdb: TmdbConfig {
                api_key: String::new(),
                base_url: String::new(),
                language: DEFAULT_TMDB_LANGUAGE.to_string(),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: String::new(),
                api_key: String::new(),
                api_secret: String::new(),
                base_url: String::new(),
                folder: AVATAR_FOLDER.to_string(),
            },
        }
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |name| vars.get(name).map(|v| v.to_string())
    }

    fn complete_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/atitino"),
            ("JWT_SECRET", "s3cret"),
            ("TMDB_API_KEY", "tmdb-key"),
        ])
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_in(complete_env())).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.tmdb.language, "pt-BR");
        assert!(!config.allow_registration);
    }

    #[test]
    fn test_missing_jwt_secret_is_error() {
        let mut vars = complete_env();
        vars.remove("JWT_SECRET");
        assert!(matches!(
            AppConfig::from_lookup(lookup_in(vars)),
            Err(AppError::Internal(msg)) if msg.contains("JWT_SECRET")
        ));

        let mut vars = complete_env();
        vars.insert("JWT_SECRET", "   ");
        assert!(AppConfig::from_lookup(lookup_in(vars)).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" ON ")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }
}
