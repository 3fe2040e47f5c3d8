//! Helper functions for templates
//!
//! Date and URL formatting shared by the generator and the server.

mod date;
mod url;

use chrono::{DateTime, FixedOffset};

pub use self::date::*;
pub use self::url::*;

use crate::config::SiteConfig;

/// Collection of helper functions bound to the site configuration
pub struct Helpers {
    config: SiteConfig,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// Get full_url_for helper
    pub fn full_url_for(&self, path: &str) -> String {
        full_url_for(&self.config, path)
    }

    /// Link to an article page
    pub fn post_url(&self, uid: &str) -> String {
        url_for(&self.config, &post_path(uid))
    }

    /// Format a publication date in the site language and timezone.
    /// Records without a date render as an empty string.
    pub fn date(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        date.map(|d| {
            format_date(
                &localize(d, &self.config.timezone),
                &self.config.date_format,
                &self.config.language,
            )
        })
        .unwrap_or_default()
    }

    /// Machine-readable form for `<time datetime>`
    pub fn date_attr(&self, date: Option<&DateTime<FixedOffset>>) -> String {
        date.map(|d| date_xml(&localize(d, &self.config.timezone)))
            .unwrap_or_default()
    }
}
