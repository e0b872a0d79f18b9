// Upload d'avatars vers Cloudinary (upload signé, une seule tentative)

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;
use crate::error::{AppError, AppResult};

/// Hébergement d'images: reçoit les octets, retourne l'URL publique
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
}

pub struct CloudinaryUploader {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

/// Signature Cloudinary: sha1 des paramètres triés par nom, suivis du secret
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> AppResult<String> {
        if self.config.cloud_name.is_empty() || self.config.api_key.is_empty() {
            return Err(AppError::Upload("Cloudinary is not configured".to_string()));
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.config.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let size = bytes.len();
        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature", signature)
            .part("file", Part::bytes(bytes).file_name(filename.to_string()));

        tracing::info!(size, filename, "uploading avatar to Cloudinary");

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "Cloudinary upload rejected");
            return Err(AppError::Upload(format!("Cloudinary returned {}", status)));
        }

        let data: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Invalid Cloudinary response: {}", e)))?;

        // Pas d'URL vide ou factice en cas de réponse incomplète
        data.secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::Upload("Cloudinary response has no secure_url".to_string()))
    }
}
