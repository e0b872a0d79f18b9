// ============================================================================
// CLIENT TMDB (The Movie Database)
// ============================================================================
//
// Description:
//   Recherche multi (films + séries) et détails d'un titre.
//   Aucune logique métier: construction des requêtes et filtrage.
//
// Endpoints:
//   - GET {base}/search/multi?query=...  -> résultats filtrés (movie/tv)
//   - GET {base}/{movie|tv}/{id}         -> détails, None si non-2xx
//
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TmdbConfig;
use crate::error::{AppError, AppResult};
use crate::models::titles::Kind;

/// Catalogue de titres externe
#[async_trait]
pub trait TitleCatalog: Send + Sync {
    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>>;

    async fn details(&self, catalog_id: i32, kind: Kind) -> AppResult<Option<TitleDetails>>;
}

/// Un résultat de recherche (film ou série)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: i32,
    pub kind: Kind,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleDetails {
    pub id: i32,
    pub kind: Kind,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub number_of_seasons: Option<u32>,
}

// Réponses brutes TMDB
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    id: i32,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    title: Option<String>, // films
    #[serde(default)]
    name: Option<String>, // séries
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    release_date: Option<String>, // films
    #[serde(default)]
    first_air_date: Option<String>, // séries
    #[serde(default)]
    number_of_seasons: Option<u32>,
}

impl RawResult {
    fn display_title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_default()
    }

    fn first_date(&self) -> Option<String> {
        self.release_date
            .clone()
            .or_else(|| self.first_air_date.clone())
            .filter(|d| !d.is_empty())
    }

    /// Les personnes (acteurs) et autres types sont ignorés
    fn into_hit(self) -> Option<SearchHit> {
        let kind = match self.media_type.as_deref() {
            Some("movie") => Kind::Movie,
            Some("tv") => Kind::Series,
            _ => return None,
        };

        Some(SearchHit {
            id: self.id,
            kind,
            title: self.display_title(),
            first_date: self.first_date(),
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
        })
    }

    fn into_details(self, kind: Kind) -> TitleDetails {
        TitleDetails {
            id: self.id,
            kind,
            title: self.display_title(),
            release_date: self.first_date(),
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            number_of_seasons: self.number_of_seasons,
        }
    }
}

pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait]
impl TitleCatalog for TmdbClient {
    async fn search(&self, query: &str) -> AppResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(query, "TMDB search");

        let response = self
            .http
            .get(format!("{}/search/multi", self.base_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
                ("query", query),
                ("include_adult", "false"),
                ("page", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("TMDB unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "TMDB search failed");
            return Err(AppError::Upstream(format!("TMDB search returned {}", status)));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid TMDB response: {}", e)))?;

        Ok(data.results.into_iter().filter_map(RawResult::into_hit).collect())
    }

    async fn details(&self, catalog_id: i32, kind: Kind) -> AppResult<Option<TitleDetails>> {
        let response = self
            .http
            .get(format!("{}/{}/{}", self.base_url, kind.as_str(), catalog_id))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("TMDB unreachable: {}", e)))?;

        if !response.status().is_success() {
            tracing::info!(catalog_id, %kind, status = %response.status(), "TMDB title not found");
            return Ok(None);
        }

        let raw: RawResult = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid TMDB response: {}", e)))?;

        Ok(Some(raw.into_details(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::new(&TmdbConfig {
            api_key: "test-key".to_string(),
            base_url: server.base_url(),
            language: "pt-BR".to_string(),
        })
    }

    #[tokio::test]
    async fn test_search_keeps_only_movies_and_series() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search/multi")
                .query_param("api_key", "test-key")
                .query_param("query", "matrix")
                .query_param("include_adult", "false");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"results": [
                    {"id": 603, "media_type": "movie", "title": "Matrix", "overview": "Neo", "poster_path": "/p.jpg", "release_date": "1999-03-31"},
                    {"id": 6384, "media_type": "person", "name": "Keanu Reeves"},
                    {"id": 1399, "media_type": "tv", "name": "Game of Thrones", "first_air_date": "2011-04-17"}
                ]}"#);
        });

        let hits = client_for(&server).search("matrix").await.unwrap();

        mock.assert();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].kind, Kind::Movie);
        assert_eq!(hits[0].title, "Matrix");
        assert_eq!(hits[0].first_date.as_deref(), Some("1999-03-31"));
        assert_eq!(hits[1].kind, Kind::Series);
        assert_eq!(hits[1].title, "Game of Thrones");
        assert_eq!(hits[1].first_date.as_deref(), Some("2011-04-17"));
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/search/multi");
            then.status(200).body(r#"{"results": []}"#);
        });

        let hits = client_for(&server).search("   ").await.unwrap();

        assert!(hits.is_empty());
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn test_search_error_status_is_upstream_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search/multi");
            then.status(401).body(r#"{"status_message": "Invalid API key"}"#);
        });

        let result = client_for(&server).search("matrix").await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_details_for_series() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/tv/1399");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"id": 1399, "name": "Game of Thrones", "overview": "Winter", "first_air_date": "2011-04-17", "number_of_seasons": 8}"#);
        });

        let details = client_for(&server)
            .details(1399, Kind::Series)
            .await
            .unwrap()
            .unwrap();

        mock.assert();
        assert_eq!(details.title, "Game of Thrones");
        assert_eq!(details.number_of_seasons, Some(8));
        assert_eq!(details.release_date.as_deref(), Some("2011-04-17"));
    }

    #[tokio::test]
    async fn test_details_not_found_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/movie/999999");
            then.status(404).body(r#"{"status_code": 34}"#);
        });

        let details = client_for(&server).details(999999, Kind::Movie).await.unwrap();
        assert!(details.is_none());
    }
}
