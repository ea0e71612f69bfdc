//! Google Drive retrieval for remotely stored PDFs.
//!
//! Authenticates with a service account key: an RS256 JWT is exchanged for
//! an OAuth2 access token, which is cached until shortly before expiry.
//! All env vars are optional — when the key is missing, remote retrieval
//! is simply disabled.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DRIVE_FILES_URI: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: u64,
}

/// Drive client holding service-account credentials and a token cache.
#[derive(Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    key: ServiceAccountKey,
    token_cache: Arc<Mutex<Option<CachedToken>>>,
}

impl DriveClient {
    /// Try to load credentials from `DRIVE_SA_KEY_PATH`. Returns `None`
    /// when the variable is unset or the key is unreadable (graceful opt-in).
    pub fn from_env(client: reqwest::Client) -> Option<Self> {
        let key_path = std::env::var("DRIVE_SA_KEY_PATH").ok()?;

        let key_json = match std::fs::read_to_string(&key_path) {
            Ok(json) => json,
            Err(e) => {
                warn!("DRIVE_SA_KEY_PATH={} unreadable: {}", key_path, e);
                return None;
            }
        };

        let key: ServiceAccountKey = match serde_json::from_str(&key_json) {
            Ok(k) => k,
            Err(e) => {
                warn!("Failed to parse Drive service account key: {}", e);
                return None;
            }
        };

        Some(Self {
            client,
            key,
            token_cache: Arc::new(Mutex::new(None)),
        })
    }

    /// Get a valid access token, refreshing when expired.
    async fn access_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.lock().unwrap();
            if let Some(ref cached) = *cache {
                if now_secs() < cached.expires_at.saturating_sub(60) {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let now = now_secs();
        let claims = serde_json::json!({
            "iss": self.key.client_email,
            "scope": DRIVE_SCOPE,
            "aud": TOKEN_URI,
            "iat": now,
            "exp": now + 3600,
        });

        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Invalid RSA private key in service account JSON")?;
        let jwt = jsonwebtoken::encode(&header, &claims, &encoding_key)
            .context("Failed to encode JWT")?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let resp: TokenResponse = self
            .client
            .post(TOKEN_URI)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .context("Token exchange request failed")?
            .error_for_status()
            .context("Token exchange rejected")?
            .json()
            .await
            .context("Invalid token exchange response")?;

        debug!("minted Drive access token, expires in {}s", resp.expires_in);

        let mut cache = self.token_cache.lock().unwrap();
        *cache = Some(CachedToken {
            access_token: resp.access_token.clone(),
            expires_at: now + resp.expires_in,
        });

        Ok(resp.access_token)
    }

    /// Download a Drive file into `dest_dir`, named after its Drive
    /// metadata, and return the local path.
    pub async fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let token = self.access_token().await?;

        #[derive(Deserialize)]
        struct FileMetadata {
            name: Option<String>,
        }

        let metadata: FileMetadata = self
            .client
            .get(format!("{}/{}", DRIVE_FILES_URI, file_id))
            .bearer_auth(&token)
            .send()
            .await
            .context("Drive metadata request failed")?
            .error_for_status()
            .context("Drive metadata request rejected")?
            .json()
            .await
            .context("Invalid Drive metadata response")?;

        let name = metadata.name.unwrap_or_else(|| format!("{}.pdf", file_id));

        let bytes = self
            .client
            .get(format!("{}/{}", DRIVE_FILES_URI, file_id))
            .query(&[("alt", "media")])
            .bearer_auth(&token)
            .send()
            .await
            .context("Drive download request failed")?
            .error_for_status()
            .context("Drive download rejected")?
            .bytes()
            .await
            .context("Failed to read Drive download body")?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("Failed to create {}", dest_dir.display()))?;
        let local_path = dest_dir.join(&name);
        tokio::fs::write(&local_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", local_path.display()))?;

        info!(
            "downloaded {} ({} bytes) to {}",
            file_id,
            bytes.len(),
            local_path.display()
        );
        Ok(local_path)
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
