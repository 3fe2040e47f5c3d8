//! Article listing: projection of raw pages and cursor-driven loading

use tokio::sync::Mutex;

use super::document::{ArticleListing, ArticleSummary, RawQueryResult};
use crate::client::ContentClient;
use crate::error::{Error, Result};

/// Project a raw page into a listing, preserving result order
pub fn assemble_listing(raw: RawQueryResult) -> ArticleListing {
    ArticleListing {
        items: raw.results.iter().map(ArticleSummary::from_raw).collect(),
        cursor: raw.next_page,
    }
}

/// Fetches the page behind a listing's cursor
#[derive(Debug, Clone)]
pub struct ListingLoader {
    client: ContentClient,
}

impl ListingLoader {
    pub fn new(client: ContentClient) -> Self {
        Self { client }
    }

    /// Fetch and assemble the page behind `cursor`
    pub async fn fetch_page(&self, cursor: &str) -> Result<ArticleListing> {
        let raw = self.client.fetch_page(cursor).await?;
        Ok(assemble_listing(raw))
    }

    /// Return `current` extended with the next page.
    ///
    /// `current` is left untouched; on error the caller keeps it as the
    /// last good listing.
    pub async fn load_next_page(&self, current: &ArticleListing) -> Result<ArticleListing> {
        let cursor = current.cursor.as_deref().ok_or(Error::NoNextPage)?;
        let page = self.fetch_page(cursor).await?;

        tracing::debug!(
            "Loaded {} more articles (had {})",
            page.items.len(),
            current.items.len()
        );

        let mut items = Vec::with_capacity(current.items.len() + page.items.len());
        items.extend_from_slice(&current.items);
        items.extend(page.items);

        Ok(ArticleListing {
            cursor: page.cursor,
            items,
        })
    }
}

/// A listing owned by one reader, loaded one page at a time.
///
/// Loads are serialized: each `load_more` starts from the listing left by
/// the previous one, so concurrent triggers never lose or duplicate pages.
#[derive(Debug)]
pub struct ListingSession {
    loader: ListingLoader,
    state: Mutex<ArticleListing>,
}

impl ListingSession {
    pub fn new(loader: ListingLoader, initial: ArticleListing) -> Self {
        Self {
            loader,
            state: Mutex::new(initial),
        }
    }

    /// Current listing
    pub async fn snapshot(&self) -> ArticleListing {
        self.state.lock().await.clone()
    }

    pub async fn has_next_page(&self) -> bool {
        self.state.lock().await.has_next_page()
    }

    /// Append the next page and return the new listing
    pub async fn load_more(&self) -> Result<ArticleListing> {
        let mut state = self.state.lock().await;
        let next = self.loader.load_next_page(&state).await?;
        *state = next.clone();
        Ok(next)
    }

    pub fn into_listing(self) -> ArticleListing {
        self.state.into_inner()
    }
}
