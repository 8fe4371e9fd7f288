//! Configuration management for pageocr using the prefer crate.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::DocumentExtractor;
use crate::ocr::{
    HttpBackend, OcrBackend, OcrBackendType, OcrError, RecognitionAdapter, RecognitionEngine,
    TesseractBackend, DEFAULT_LANGUAGE, DEFAULT_MAX_RETRIES,
};
use crate::render::{PopplerLoader, Rasterizer, RenderError, RenderOptions};

/// Errors from loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Backend(#[from] OcrError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// `[ocr]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Backend name: "tesseract" or "http".
    pub backend: String,
    /// Source-language hint passed to the engine.
    pub language: String,
    /// Run orientation detection (tesseract only).
    pub detect_orientation: bool,
    /// Endpoint for the http backend.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Number of engines, i.e. concurrent extractions in server mode.
    pub pool_size: usize,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackendType::Tesseract.as_str().to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            detect_orientation: false,
            endpoint: "http://localhost:8000/ocr".to_string(),
            timeout_secs: 120,
            max_retries: DEFAULT_MAX_RETRIES,
            pool_size: 1,
        }
    }
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub scale: f32,
    pub jpeg_quality: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            scale: options.scale,
            jpeg_quality: options.jpeg_quality,
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// Upper bound on one extraction request.
    pub request_timeout_secs: u64,
    /// Maximum request body size in megabytes.
    pub max_body_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3030".to_string(),
            request_timeout_secs: 300,
            max_body_mb: 50,
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bad bind address '{}': {}", self.bind, e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }
}

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrSettings,
    pub render: RenderSettings,
    pub server: ServerSettings,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    ///
    /// Falls back to defaults when no file is found or it fails to parse.
    /// Environment overrides are applied either way.
    pub async fn load() -> Self {
        let discovered = match prefer::load("pageocr").await {
            Ok(pref_config) => pref_config.source_path().map(|p| p.to_path_buf()),
            Err(_) => None,
        };

        match discovered {
            Some(path) => match Self::load_from_path(&path).await {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                    Self::default_with_env()
                }
            },
            None => Self::default_with_env(),
        }
    }

    /// Defaults with environment overrides applied.
    pub fn default_with_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration from a specific file path.
    /// Supports TOML, YAML and JSON based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        config.apply_env_overrides();
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Apply `PAGEOCR_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|s| !s.is_empty());

        if let Some(backend) = get("PAGEOCR_BACKEND") {
            tracing::debug!("Using PAGEOCR_BACKEND from environment: {}", backend);
            self.ocr.backend = backend;
        }
        if let Some(language) = get("PAGEOCR_LANGUAGE") {
            self.ocr.language = language;
        }
        if let Some(endpoint) = get("PAGEOCR_ENDPOINT") {
            tracing::debug!("Using PAGEOCR_ENDPOINT from environment: {}", endpoint);
            self.ocr.endpoint = endpoint;
        }
        if let Some(scale) = get("PAGEOCR_SCALE") {
            match scale.parse() {
                Ok(v) => self.render.scale = v,
                Err(_) => tracing::warn!("Ignoring non-numeric PAGEOCR_SCALE: {}", scale),
            }
        }
        if let Some(quality) = get("PAGEOCR_JPEG_QUALITY") {
            match quality.parse() {
                Ok(v) => self.render.jpeg_quality = v,
                Err(_) => tracing::warn!("Ignoring invalid PAGEOCR_JPEG_QUALITY: {}", quality),
            }
        }
    }

    pub fn backend_type(&self) -> Result<OcrBackendType, ConfigError> {
        OcrBackendType::from_str(&self.ocr.backend).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "unknown OCR backend '{}' (expected one of: {})",
                self.ocr.backend,
                OcrBackendType::all()
                    .iter()
                    .map(|b| b.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            scale: self.render.scale,
            jpeg_quality: self.render.jpeg_quality,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render_options().validate()?;
        self.backend_type()?;
        if self.ocr.pool_size == 0 {
            return Err(ConfigError::Invalid(
                "ocr.pool_size must be at least 1".to_string(),
            ));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(ConfigError::Invalid("ocr.language is empty".to_string()));
        }
        self.server.bind_addr()?;
        Ok(())
    }

    /// Construct the configured OCR backend.
    pub fn build_backend(&self) -> Result<Box<dyn OcrBackend>, ConfigError> {
        let backend: Box<dyn OcrBackend> = match self.backend_type()? {
            OcrBackendType::Tesseract => Box::new(
                TesseractBackend::new().with_orientation_detection(self.ocr.detect_orientation),
            ),
            OcrBackendType::Http => Box::new(
                HttpBackend::new(
                    self.ocr.endpoint.clone(),
                    Duration::from_secs(self.ocr.timeout_secs),
                )?
                .with_max_retries(self.ocr.max_retries),
            ),
        };
        Ok(backend)
    }

    /// Build `count` engines, initializing each.
    ///
    /// An engine whose backend is unavailable is kept uninitialized. The
    /// server retries `initialize` on each lease until it succeeds.
    pub fn build_engines(&self, count: usize) -> Result<Vec<RecognitionEngine>, ConfigError> {
        let mut engines = Vec::with_capacity(count);
        for _ in 0..count {
            let mut engine = RecognitionEngine::new(self.build_backend()?);
            if let Err(e) = engine.initialize() {
                tracing::warn!("{} engine not ready: {}", engine.backend_type(), e);
            }
            engines.push(engine);
        }
        Ok(engines)
    }

    pub fn build_extractor(&self) -> Result<DocumentExtractor, ConfigError> {
        Ok(DocumentExtractor::new(
            Arc::new(PopplerLoader::default()),
            Rasterizer::new(self.render_options())?,
            RecognitionAdapter::new(self.ocr.language.clone()),
        ))
    }
}
