//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable holding the repository endpoint
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable holding the repository access token
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,
    pub date_format: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub i18n_dir: String,

    // Content repository
    #[serde(default)]
    pub repository: RepositoryConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling.".to_string(),
            language: "pt-BR".to_string(),
            timezone: String::new(),
            date_format: "DD MMM YYYY".to_string(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            i18n_dir: "languages".to_string(),

            repository: RepositoryConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` on top of the file values
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("Repository endpoint taken from {}", ENDPOINT_ENV);
            self.repository.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
            self.repository.access_token = Some(token);
        }
    }
}

/// Content repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding the articles
    pub document_type: String,
    /// Listing page size
    pub page_size: u32,
    /// Seconds between article page rebuilds
    pub revalidate: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "post".to_string(),
            page_size: 1,
            revalidate: 1800,
        }
    }
}
