//! Configuration module for environment variable parsing.
//!
//! All configuration is read from environment variables. Optional values
//! fall back to documented defaults; the shared secret and the downstream
//! webhook URL have no safe default and must be present at startup.

use std::env;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};

use crate::signature::DEFAULT_TOLERANCE_SECONDS;

/// Default post-download size cap in bytes (20 MiB).
const DEFAULT_MAX_DOWNLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared HMAC secret used for inbound verification and outbound signing
    pub signing_secret: String,

    /// URL of the downstream webhook notified after each processed job
    pub webhook_url: String,

    /// Root directory for stored artifacts
    pub storage_root: PathBuf,

    /// Port for the web server to listen on
    pub port: u16,

    /// Timeout in milliseconds for downloading source files
    pub fetch_timeout_ms: u64,

    /// Timeout in milliseconds for webhook delivery
    pub notify_timeout_ms: u64,

    /// Maximum accepted clock skew for signed timestamps, in seconds
    pub signature_tolerance_seconds: i64,

    /// Maximum size of a downloaded source file, in bytes
    pub max_download_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let signing_secret = env::var("RESUME_PIPELINE_HMAC_SECRET")
            .context("RESUME_PIPELINE_HMAC_SECRET must be set")?;
        ensure!(
            !signing_secret.trim().is_empty(),
            "RESUME_PIPELINE_HMAC_SECRET must not be empty"
        );

        let webhook_url = env::var("RESUME_PIPELINE_WEBHOOK_URL")
            .context("RESUME_PIPELINE_WEBHOOK_URL must be set")?;
        ensure!(
            !webhook_url.trim().is_empty(),
            "RESUME_PIPELINE_WEBHOOK_URL must not be empty"
        );

        Ok(Config {
            signing_secret,
            webhook_url,

            storage_root: env::var("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/resumes")),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),

            notify_timeout_ms: env::var("NOTIFY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),

            signature_tolerance_seconds: env::var("SIGNATURE_TOLERANCE_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOLERANCE_SECONDS),

            max_download_bytes: env::var("MAX_DOWNLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_DOWNLOAD_BYTES),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: env vars are process-wide and these assertions must run
    // in a fixed order.
    #[test]
    fn test_from_env() {
        env::remove_var("RESUME_PIPELINE_HMAC_SECRET");
        env::remove_var("RESUME_PIPELINE_WEBHOOK_URL");
        assert!(Config::from_env().is_err());

        env::set_var("RESUME_PIPELINE_HMAC_SECRET", "   ");
        env::set_var("RESUME_PIPELINE_WEBHOOK_URL", "http://localhost/webhook");
        assert!(Config::from_env().is_err());

        env::set_var("RESUME_PIPELINE_HMAC_SECRET", "test-secret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.signing_secret, "test-secret");
        assert_eq!(config.webhook_url, "http://localhost/webhook");
        assert_eq!(config.storage_root, PathBuf::from("data/resumes"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.fetch_timeout_ms, 60_000);
        assert_eq!(config.notify_timeout_ms, 30_000);
        assert_eq!(config.signature_tolerance_seconds, 300);
        assert_eq!(config.max_download_bytes, 20 * 1024 * 1024);

        env::set_var("PORT", "9999");
        env::set_var("SIGNATURE_TOLERANCE_SECONDS", "60");
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.signature_tolerance_seconds, 60);

        env::set_var("PORT", "not-a-port");
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8080);

        env::remove_var("PORT");
        env::remove_var("SIGNATURE_TOLERANCE_SECONDS");
        env::remove_var("RESUME_PIPELINE_HMAC_SECRET");
        env::remove_var("RESUME_PIPELINE_WEBHOOK_URL");
    }
}
