//! List posts from the content repository

use anyhow::Result;
use std::io::Write;

use crate::content::{ArticleListing, ListingLoader, ListingSession};
use crate::generator::Generator;
use crate::helpers::Helpers;
use crate::Site;

/// How many listing pages to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Pages(usize),
    All,
}

/// Print the listing, following cursors up to `limit` pages
pub async fn run(site: &Site, limit: PageLimit) -> Result<()> {
    let generator = Generator::new(site)?;
    let listing = load(&generator, limit).await?;

    let mut out = std::io::stdout().lock();
    print_listing(&mut out, &Helpers::new(site.config.clone()), &listing)?;
    Ok(())
}

/// Fetch the first page, then load further pages one at a time
pub async fn load(generator: &Generator, limit: PageLimit) -> Result<ArticleListing> {
    let first = generator.fetch_listing().await?;
    let session = ListingSession::new(ListingLoader::new(generator.client().clone()), first);

    let mut pages = 1;
    while session.has_next_page().await {
        if let PageLimit::Pages(max) = limit {
            if pages >= max {
                break;
            }
        }
        session.load_more().await?;
        pages += 1;
    }

    tracing::debug!("Loaded {} listing pages", pages);
    Ok(session.into_listing())
}

fn print_listing<W: Write>(out: &mut W, helpers: &Helpers, listing: &ArticleListing) -> Result<()> {
    writeln!(out, "Posts ({}):", listing.items.len())?;
    for item in &listing.items {
        writeln!(
            out,
            "  {} - {} by {} [{}]",
            helpers.date(item.published_at.as_ref()),
            item.title,
            item.author,
            item.id.as_deref().unwrap_or("-")
        )?;
    }
    if listing.has_next_page() {
        writeln!(out, "  (more posts available)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_support::{post, FakeRepository};

    async fn generator_for(n: usize) -> (FakeRepository, tempfile::TempDir, Generator) {
        let docs = (1..=n)
            .map(|i| {
                post(
                    &format!("post-{}", i),
                    &format!("Post {}", i),
                    "Subtitle",
                    "Author",
                    "2021-03-19T21:34:10+0000",
                )
            })
            .collect();
        let repo = FakeRepository::spawn(docs).await;
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.repository.endpoint = repo.endpoint();
        let generator = Generator::new(&Site::with_config(dir.path(), config)).unwrap();
        (repo, dir, generator)
    }

    #[tokio::test]
    async fn test_load_limited_pages() {
        let (_repo, _dir, generator) = generator_for(4).await;
        let listing = load(&generator, PageLimit::Pages(2)).await.unwrap();
        assert_eq!(listing.items.len(), 2);
        assert!(listing.has_next_page());
    }

    #[tokio::test]
    async fn test_load_all_pages() {
        let (_repo, _dir, generator) = generator_for(4).await;
        let listing = load(&generator, PageLimit::All).await.unwrap();
        let titles: Vec<_> = listing.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 1", "Post 2", "Post 3", "Post 4"]);
        assert!(!listing.has_next_page());
    }

    #[test]
    fn test_print_listing() {
        let listing = ArticleListing {
            cursor: Some("https://next".to_string()),
            items: vec![crate::content::ArticleSummary {
                id: Some("hooks".to_string()),
                published_at: crate::content::parse_timestamp("2021-03-19T21:34:10+0000"),
                title: "Como utilizar Hooks".to_string(),
                subtitle: String::new(),
                author: "Joseph Oliveira".to_string(),
            }],
        };
        let mut out = Vec::new();
        print_listing(&mut out, &Helpers::new(SiteConfig::default()), &listing).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Posts (1):\n  19 mar 2021 - Como utilizar Hooks by Joseph Oliveira [hooks]\n  (more posts available)\n"
        );
    }
}
