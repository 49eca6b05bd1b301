use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifacts not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Artifact verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid manifest: {0}")]
    Manifest(String),
}

/// Where to fetch a trained artifact pair from and how to verify it.
///
/// The training job publishes the ONNX model next to its encoders JSON and
/// records both SHA-256 hashes in a manifest the operator hands to the
/// service.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    pub model_url: String,
    pub model_hash: String,
    pub encoders_url: String,
    pub encoders_hash: String,
}

impl ArtifactSpec {
    /// Loads a manifest JSON from disk.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let json = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&json).map_err(|e| ArtifactError::Manifest(e.to_string()))
    }
}

/// Local cache of trained artifact pairs (model.onnx + encoders.json),
/// downloaded once and verified by hash before use.
#[derive(Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ArtifactStore {
    /// Creates a new ArtifactStore with the default cache directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_artifacts_dir())
    }

    /// Resolves the default artifacts cache directory.
    pub fn default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("CARTCAST_CACHE") {
            return PathBuf::from(path).join("artifacts");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("cartcast").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("cartcast").join("artifacts");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("cartcast").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self {
            artifacts_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.artifacts_dir.join(name).join("model.onnx")
    }

    pub fn encoders_path(&self, name: &str) -> PathBuf {
        self.artifacts_dir.join(name).join("encoders.json")
    }

    pub fn is_downloaded(&self, name: &str) -> bool {
        self.model_path(name).exists() && self.encoders_path(name).exists()
    }

    /// Downloads the model and encoders files, verifying both by hash.
    /// Existing files that still verify are kept; anything corrupt is
    /// re-fetched. On failure the artifact directory is cleaned up.
    pub async fn download(&self, spec: &ArtifactSpec) -> Result<(), ArtifactError> {
        let _lock = self.download_lock.lock().await;

        let artifact_dir = self.artifacts_dir.join(&spec.name);
        log::info!("Preparing artifact directory at {:?}", artifact_dir);
        fs::create_dir_all(&artifact_dir)?;

        let model_result = self
            .fetch_if_needed(&spec.model_url, &self.model_path(&spec.name), &spec.model_hash, "model")
            .await;
        let encoders_result = self
            .fetch_if_needed(
                &spec.encoders_url,
                &self.encoders_path(&spec.name),
                &spec.encoders_hash,
                "encoders",
            )
            .await;

        match (model_result, encoders_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and encoders ready to use");
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                log::error!("Failed to set up artifacts: {}", e);
                let _ = self.remove_download(&spec.name);
                Err(e)
            }
        }
    }

    async fn fetch_if_needed(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ArtifactError> {
        if path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file_type, path);
            if self.verify_file(path, expected_hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file_type);
        }
        self.download_and_verify_file(url, path, expected_hash, file_type).await
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());
        log::debug!("Calculated hash {} (expected {}) for {:?}", hash, expected_hash, path);
        Ok(hash == expected_hash)
    }

    /// Verifies both files of a downloaded artifact pair against the
    /// manifest hashes.
    pub fn verify(&self, spec: &ArtifactSpec) -> Result<bool, ArtifactError> {
        let model_path = self.model_path(&spec.name);
        let encoders_path = self.encoders_path(&spec.name);

        if !model_path.exists() || !encoders_path.exists() {
            log::info!("One or both artifact files do not exist");
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, &spec.model_hash)?;
        let encoders_ok = self.verify_file(&encoders_path, &spec.encoders_hash)?;
        Ok(model_ok && encoders_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ArtifactError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        log::info!("Download response status: {}", response.status());
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());

        if hash != expected_hash {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, expected_hash, hash);
            return Err(ArtifactError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;

        // Verify after writing
        if !self.verify_file(path, expected_hash)? {
            return Err(ArtifactError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ArtifactError> {
        for path in [self.model_path(name), self.encoders_path(name)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures the artifact pair is present and verified: downloads when
    /// missing, re-downloads when a hash check fails.
    pub async fn ensure_downloaded(&self, spec: &ArtifactSpec) -> Result<(), ArtifactError> {
        if !self.is_downloaded(&spec.name) {
            log::info!("Artifacts for '{}' not found, downloading...", spec.name);
            self.download(spec).await?;
        } else if !self.verify(spec)? {
            log::info!("Artifact verification failed, re-downloading...");
            self.remove_download(&spec.name)?;
            self.download(spec).await?;
        } else {
            log::info!("Artifact verification successful");
        }
        Ok(())
    }
}
