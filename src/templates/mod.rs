//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template since titles and authors come straight from the
//! repository; pre-rendered rich text is marked `safe` explicitly.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{ArticleBody, ArticleListing, ArticleState, ArticleSummary};
use crate::helpers::{post_path, Helpers};
use crate::i18n::I18n;

/// Stylesheet shipped with the templates
pub const STYLESHEET: &str = include_str!("site/style.css");

/// Seconds before the loading page retries
const LOADING_REFRESH_SECS: u32 = 3;

/// Site-wide values available to every template
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub root: String,
    pub language: String,
}

/// Listing entry as displayed
#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub uid: Option<String>,
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub date_attr: String,
}

/// A listing page as displayed, also returned by the load-more endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ListingData {
    pub cursor: Option<String>,
    pub items: Vec<SummaryData>,
}

/// Article section with its body rendered to HTML
#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub html: String,
}

/// Article as displayed
#[derive(Debug, Clone, Serialize)]
pub struct ArticleData {
    pub uid: String,
    pub permalink: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub date_attr: String,
    pub banner_url: Option<String>,
    pub reading_time: String,
    pub sections: Vec<SectionData>,
}

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
    helpers: Helpers,
    i18n: I18n,
    site: SiteData,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig, i18n: I18n) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("loading.html", include_str!("site/loading.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            (
                "partials/summary.html",
                include_str!("site/partials/summary.html"),
            ),
        ])?;

        Ok(Self {
            tera,
            helpers: Helpers::new(config.clone()),
            i18n,
            site: SiteData {
                title: config.title.clone(),
                root: crate::helpers::url_for(config, ""),
                language: config.language.clone(),
            },
        })
    }

    /// Build the display form of a listing
    pub fn listing_data(&self, listing: &ArticleListing) -> ListingData {
        ListingData {
            cursor: listing.cursor.clone(),
            items: listing.items.iter().map(|s| self.summary_data(s)).collect(),
        }
    }

    fn summary_data(&self, summary: &ArticleSummary) -> SummaryData {
        SummaryData {
            uid: summary.id.clone(),
            url: summary
                .id
                .as_deref()
                .map(|uid| self.helpers.post_url(uid))
                .unwrap_or_else(|| self.helpers.url_for("")),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: self.helpers.date(summary.published_at.as_ref()),
            date_attr: self.helpers.date_attr(summary.published_at.as_ref()),
        }
    }

    fn article_data(&self, body: &ArticleBody, reading_minutes: u32) -> ArticleData {
        let resolver = |_doc_type: &str, uid: &str| self.helpers.post_url(uid);
        ArticleData {
            uid: body.uid.clone(),
            permalink: self.helpers.full_url_for(&post_path(&body.uid)),
            title: body.title.clone(),
            author: body.author.clone(),
            date: self.helpers.date(body.published_at.as_ref()),
            date_attr: self.helpers.date_attr(body.published_at.as_ref()),
            banner_url: body.banner_url.clone(),
            reading_time: self.i18n.get_count("reading_time", reading_minutes),
            sections: body
                .sections
                .iter()
                .map(|section| SectionData {
                    heading: section.heading.clone(),
                    html: section.body.as_html(&resolver),
                })
                .collect(),
        }
    }

    /// Render the listing page
    pub fn render_listing(&self, listing: &ArticleListing) -> Result<String> {
        let data = self.listing_data(listing);
        // Keep the embedded JSON from closing its <script> element
        let props_json = serde_json::to_string(&data)?.replace('<', "\\u003c");

        let mut context = self.base_context();
        context.insert("listing", &data);
        context.insert("props_json", &props_json);
        self.render("index.html", &context)
    }

    /// Render an article page for any state
    pub fn render_article(&self, state: &ArticleState) -> Result<String> {
        let mut context = self.base_context();
        match state {
            ArticleState::Ready(body) => {
                context.insert("article", &self.article_data(body, state.reading_minutes()));
                self.render("post.html", &context)
            }
            ArticleState::Pending => {
                context.insert("refresh_secs", &LOADING_REFRESH_SECS);
                self.render("loading.html", &context)
            }
            ArticleState::NotFound => self.render("not_found.html", &context),
        }
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        let t: HashMap<String, String> = self.i18n.get_all_translations();
        context.insert("t", &t);
        context
    }

    /// Render a template with given context
    fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}
