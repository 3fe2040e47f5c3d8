//! spacetraveling: a statically generated blog backed by a headless content repository
//!
//! Articles live in a Prismic-style document API. The generator renders a
//! paginated listing page plus one page per article; the server serves the
//! result, rebuilds article pages on an interval, and loads further listing
//! pages on demand.

pub mod client;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod server;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

/// The blog site: configuration plus resolved directories
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Load the site in a directory.
    ///
    /// Reads `_config.yml` when present and applies the repository
    /// environment variables on top. Configuration is read once here and
    /// passed along explicitly afterwards.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Generate the static site
    pub async fn generate(&self) -> anyhow::Result<generator::GenerateReport> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}
