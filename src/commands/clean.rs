//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Site;

/// Remove everything the generator wrote
pub fn run(site: &Site) -> Result<()> {
    if site.public_dir.exists() {
        fs::remove_dir_all(&site.public_dir)?;
        tracing::info!("Deleted: {:?}", site.public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_clean_removes_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_config(dir.path(), SiteConfig::default());
        fs::create_dir_all(site.public_dir.join("post/a")).unwrap();
        fs::write(site.public_dir.join("index.html"), "<html></html>").unwrap();

        run(&site).unwrap();
        assert!(!site.public_dir.exists());

        // nothing to clean is fine
        run(&site).unwrap();
    }
}
