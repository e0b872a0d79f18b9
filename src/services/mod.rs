pub mod account_service;
pub mod collection_service;
pub mod image_uploader;
pub mod tmdb_client;
