//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Site;

/// Generate the listing and every article page
pub async fn run(site: &Site) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(site)?;
    let report = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}

/// Rebuild the page of a single article
pub async fn run_single(site: &Site, uid: &str) -> Result<()> {
    let generator = Generator::new(site)?;
    let state = generator.generate_article(uid).await?;

    if !state.is_ready() {
        anyhow::bail!("Post not found: {}", uid);
    }
    Ok(())
}
