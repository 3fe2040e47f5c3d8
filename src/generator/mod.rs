//! Generator module - builds the static listing and article pages from the
//! content repository

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::client::{ContentClient, QueryOptions};
use crate::content::{assemble_listing, ArticleBody, ArticleListing, ArticleState};
use crate::helpers::post_path;
use crate::i18n::I18n;
use crate::templates::{TemplateRenderer, STYLESHEET};
use crate::Site;

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Counts reported after a full generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub listing_items: usize,
    pub articles: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Static site generator backed by the content repository
pub struct Generator {
    site: Site,
    client: ContentClient,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a generator using the repository from the site config
    pub fn new(site: &Site) -> Result<Self> {
        let client = ContentClient::from_config(&site.config.repository, None)
            .context("Invalid content repository configuration")?;
        Self::with_client(site, client)
    }

    /// Create a generator with an explicit client
    pub fn with_client(site: &Site, client: ContentClient) -> Result<Self> {
        let mut i18n = I18n::new(&site.config.language);
        i18n.load_languages(site.base_dir.join(&site.config.i18n_dir))?;
        let renderer = TemplateRenderer::new(&site.config, i18n)?;

        Ok(Self {
            site: site.clone(),
            client,
            renderer,
        })
    }

    pub fn client(&self) -> &ContentClient {
        &self.client
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Generate the listing and every article page
    pub async fn generate(&self) -> Result<GenerateReport> {
        fs::create_dir_all(&self.site.public_dir)?;
        self.write_file(Path::new("assets/style.css"), STYLESHEET)?;

        let listing = self.generate_listing().await?;
        let mut report = self.generate_articles().await?;
        report.listing_items = listing.items.len();

        Ok(report)
    }

    /// First listing page as configured (page size, listing fields)
    pub async fn fetch_listing(&self) -> Result<ArticleListing> {
        let repo = &self.site.config.repository;
        let options = QueryOptions {
            fetch: ["title", "subtitle", "author"]
                .iter()
                .map(|field| format!("{}.{}", repo.document_type, field))
                .collect(),
            page_size: Some(repo.page_size),
            ..Default::default()
        };

        let raw = self.client.query(&[], &options).await?;
        Ok(assemble_listing(raw))
    }

    /// Render `index.html` and `listing.json`
    pub async fn generate_listing(&self) -> Result<ArticleListing> {
        let listing = self.fetch_listing().await?;

        let html = self.renderer.render_listing(&listing)?;
        self.write_file(Path::new("index.html"), &html)?;
        self.write_file(
            Path::new("listing.json"),
            &serde_json::to_string_pretty(&listing)?,
        )?;

        tracing::info!(
            "Generated listing with {} posts (more pages: {})",
            listing.items.len(),
            listing.has_next_page()
        );
        Ok(listing)
    }

    /// Rebuild every article page; one failing article does not stop the rest
    pub async fn generate_articles(&self) -> Result<GenerateReport> {
        let uids = self
            .client
            .all_uids(&self.site.config.repository.document_type)
            .await?;
        let mut report = GenerateReport::default();

        for uid in uids {
            match self.generate_article(&uid).await {
                Ok(ArticleState::Ready(_)) => report.articles += 1,
                Ok(_) => {
                    tracing::warn!("Post {:?} disappeared while generating", uid);
                    report.missing += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to generate post {:?}: {:#}", uid, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Generated {} posts ({} missing, {} failed)",
            report.articles,
            report.missing,
            report.failed
        );
        Ok(report)
    }

    /// Look up one article
    pub async fn fetch_article(&self, uid: &str) -> Result<ArticleState> {
        self.fetch_article_with(&self.client, uid).await
    }

    /// Look up one article through another client, e.g. one carrying a preview ref
    pub async fn fetch_article_with(&self, client: &ContentClient, uid: &str) -> Result<ArticleState> {
        let doc = client
            .get_by_uid(&self.site.config.repository.document_type, uid)
            .await?;

        Ok(match doc {
            Some(raw) => ArticleState::Ready(ArticleBody::from_raw(&raw)),
            None => ArticleState::NotFound,
        })
    }

    /// Build `post/<uid>/index.html`. Nothing is written when the article does not exist.
    pub async fn generate_article(&self, uid: &str) -> Result<ArticleState> {
        let state = self.fetch_article(uid).await?;

        if state.is_ready() {
            let html = self.renderer.render_article(&state)?;
            self.write_file(&Path::new(&post_path(uid)).join("index.html"), &html)?;
            tracing::debug!("Generated post: {}", uid);
        }

        Ok(state)
    }

    /// Render any article state without touching the public directory
    pub fn render_article(&self, state: &ArticleState) -> Result<String> {
        self.renderer.render_article(state)
    }

    fn write_file(&self, relative: &Path, content: &str) -> Result<()> {
        let output_path = self.site.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
        }
        // Write to a sibling and rename so the server never serves a half-written page.
        // Concurrent builds of the same page each get their own sibling.
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp_path = output_path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));
        fs::write(&tmp_path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", tmp_path, e))?;
        fs::rename(&tmp_path, &output_path)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e))?;
        Ok(())
    }
}
