//! URL helper functions

use percent_encoding::percent_decode_str;

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Site path of an article page, relative to the root
pub fn post_path(uid: &str) -> String {
    format!("post/{}/", uid)
}

/// Extract the article uid from a request path such as `/post/<uid>/`
pub fn uid_from_path(config: &SiteConfig, path: &str) -> Option<String> {
    let root = config.root.trim_end_matches('/');
    let rest = path.strip_prefix(root).unwrap_or(path);
    let rest = rest.trim_start_matches('/').strip_prefix("post/")?;
    let raw = rest.trim_end_matches("index.html").trim_end_matches('/');
    // Generated directories are named by the decoded uid
    let uid = percent_decode_str(raw).decode_utf8().ok()?;

    if uid.is_empty() || uid.contains(['/', '\\']) || uid.starts_with('.') {
        None
    } else {
        Some(uid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_root(root: &str) -> SiteConfig {
        SiteConfig {
            root: root.to_string(),
            url: "https://blog.example".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = config_with_root("/");
        assert_eq!(url_for(&config, ""), "/");
        assert_eq!(url_for(&config, "post/a/"), "/post/a/");

        let config = config_with_root("/blog/");
        assert_eq!(url_for(&config, "/post/a/"), "/blog/post/a/");
        assert_eq!(full_url_for(&config, "post/a/"), "https://blog.example/blog/post/a/");
    }

    #[test]
    fn test_uid_from_path() {
        let config = config_with_root("/");
        assert_eq!(uid_from_path(&config, "/post/hooks/").as_deref(), Some("hooks"));
        assert_eq!(uid_from_path(&config, "/post/hooks").as_deref(), Some("hooks"));
        assert_eq!(
            uid_from_path(&config, "/post/hooks/index.html").as_deref(),
            Some("hooks")
        );
        assert_eq!(uid_from_path(&config, "/post/"), None);
        assert_eq!(uid_from_path(&config, "/post/a/b/"), None);
        assert_eq!(uid_from_path(&config, "/post/../secret"), None);
        assert_eq!(uid_from_path(&config, "/about/"), None);
        assert_eq!(
            uid_from_path(&config, "/post/caf%C3%A9/").as_deref(),
            Some("café")
        );
        assert_eq!(uid_from_path(&config, "/post/a%2Fb/"), None);
        assert_eq!(uid_from_path(&config, "/post/%2E%2E/"), None);
        assert_eq!(uid_from_path(&config, "/post/%FF/"), None);

        let config = config_with_root("/blog/");
        assert_eq!(uid_from_path(&config, "/blog/post/x/").as_deref(), Some("x"));
    }
}
