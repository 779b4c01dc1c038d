use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    pub storage: StorageConfig,
    /// Used for file URLs when a request carries no `Host` header.
    pub public_base_url: Option<String>,
    pub max_upload_bytes: usize,
    pub extractor: ExtractorKind,
    pub extraction_timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local { media_root: PathBuf },
    S3(S3Settings),
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Records that a file arrived and extracts nothing.
    Log,
    None,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref().unwrap_or("local") {
            "local" => StorageConfig::Local {
                media_root: lookup("MEDIA_ROOT")
                    .unwrap_or_else(|| "./media".to_string())
                    .into(),
            },
            "s3" => StorageConfig::S3(S3Settings {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        let extractor = match lookup("EXTRACTOR").as_deref().unwrap_or("log") {
            "log" => ExtractorKind::Log,
            "none" => ExtractorKind::None,
            other => bail!("EXTRACTOR must be 'log' or 'none', got '{other}'"),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            storage,
            public_base_url: lookup("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|| "10485760".to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            extractor,
            extraction_timeout: Duration::from_secs(
                lookup("EXTRACTION_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse::<u64>()
                    .context("EXTRACTION_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/resumes")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.extractor, ExtractorKind::Log);
        assert_eq!(config.extraction_timeout, Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.public_base_url.is_none());
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
    }

    #[test]
    fn test_database_url_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_s3_requires_bucket() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/resumes"),
            ("STORAGE_BACKEND", "s3"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(config_from(&[
            ("DATABASE_URL", "postgres://localhost/resumes"),
            ("STORAGE_BACKEND", "ftp"),
        ])
        .is_err());
    }

    #[test]
    fn test_public_base_url_trailing_slash_trimmed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/resumes"),
            ("PUBLIC_BASE_URL", "https://hr.example.com/"),
        ])
        .unwrap();
        assert_eq!(config.public_base_url.as_deref(), Some("https://hr.example.com"));
    }
}
