use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::s3::Credentials;

/// Smallest part size the service accepts for chunked uploads
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Per-client settings that would otherwise be process-wide constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Region used as the bucket location constraint and for signing
    #[serde(default = "default_region")]
    pub region: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Part size for chunked uploads (at least 5 MiB)
    #[serde(default = "default_part_size")]
    pub part_size: usize,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long idle pooled connections are kept, in seconds
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Skip TLS certificate and hostname verification
    #[serde(default)]
    pub insecure_tls: bool,
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_user_agent() -> String {
    format!("s3mini/{}", env!("CARGO_PKG_VERSION"))
}

fn default_part_size() -> usize {
    MIN_PART_SIZE
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_pool_max_idle_per_host() -> usize {
    64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            user_agent: default_user_agent(),
            part_size: default_part_size(),
            connect_timeout_secs: default_connect_timeout(),
            pool_idle_timeout_secs: default_pool_idle_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            insecure_tls: false,
        }
    }
}

impl ClientConfig {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the settings; returns a description of the first problem found
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("region must not be empty".to_string());
        }
        if self.user_agent.trim().is_empty() {
            return Err("user agent must not be empty".to_string());
        }
        if self.part_size < MIN_PART_SIZE {
            return Err(format!(
                "part size {} is below the {} byte minimum",
                self.part_size, MIN_PART_SIZE
            ));
        }
        Ok(())
    }
}

/// Named service location with optional credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Service base URL (e.g. http://localhost:9000)
    pub endpoint: String,

    /// Access key ID; omit for anonymous access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Secret access key; omit for anonymous access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl Profile {
    /// Credentials when both keys are present, otherwise anonymous
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some(Credentials::new(access.clone(), secret.clone())),
            _ => None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Named profiles for different services
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Profile used when none is named
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Client settings shared by all profiles
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a profile by name, or the default profile if not specified
    pub fn get_profile(&self, name: Option<&str>) -> Option<&Profile> {
        if let Some(name) = name {
            self.profiles.get(name)
        } else if let Some(default) = &self.default_profile {
            self.profiles.get(default)
        } else {
            self.profiles.values().next()
        }
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config =
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

    config
        .client
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid client configuration: {}", e))?;

    Ok(config)
}

/// Load configuration from environment variables
///
/// - S3MINI_ENDPOINT (required)
/// - AWS_ACCESS_KEY_ID / S3_KEY (optional)
/// - AWS_SECRET_ACCESS_KEY / S3_SECRET (optional)
/// - AWS_REGION (optional, defaults to us-west-2)
/// - S3MINI_USER_AGENT (optional)
pub fn load_from_env() -> Result<Config> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let endpoint = std::env::var("S3MINI_ENDPOINT")
        .context("S3MINI_ENDPOINT environment variable not set")?;

    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .or_else(|_| std::env::var("S3_KEY"))
        .ok();
    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .or_else(|_| std::env::var("S3_SECRET"))
        .ok();

    let mut config = Config::new();

    if let Ok(region) = std::env::var("AWS_REGION") {
        config.client.region = region;
    }
    if let Ok(user_agent) = std::env::var("S3MINI_USER_AGENT") {
        config.client.user_agent = user_agent;
    }

    config.profiles.insert(
        "default".to_string(),
        Profile {
            endpoint: endpoint.trim().to_string(),
            access_key,
            secret_key,
        },
    );
    config.default_profile = Some("default".to_string());

    config
        .client
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid client configuration: {}", e))?;

    Ok(config)
}

/// Load configuration from file or environment
///
/// Reads the YAML file when a path is given, otherwise the environment.
/// A requested profile must exist and becomes the default.
pub fn load_config(config_path: Option<&str>, profile_name: Option<&str>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => load_from_yaml(path)?,
        None => load_from_env()?,
    };

    if let Some(name) = profile_name {
        if !config.profiles.contains_key(name) {
            anyhow::bail!("Profile '{}' not found in configuration", name);
        }
        config.default_profile = Some(name.to_string());
    }

    Ok(config)
}
