pub mod auth;
pub mod catalog;
pub mod collection;
pub mod health;
pub mod profile;

use actix_web::http::header;
use actix_web::{web, HttpResponse, HttpResponseBuilder};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(catalog::catalog_routes)
            .configure(collection::collection_routes)
            .configure(profile::profile_routes)
    );
}

/// 303 See Other: réponse des formulaires (POST puis redirection)
pub fn see_other(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::SeeOther();
    builder.insert_header((header::LOCATION, location.to_string()));
    builder
}
