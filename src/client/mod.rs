//! Content repository client
//!
//! A thin, read-only handle on a Prismic-style document API. Every search
//! needs a content ref: the master ref advertised by the API root, or a
//! preview ref carried by the caller's request cookies.

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::RepositoryConfig;
use crate::content::{RawDocument, RawQueryResult};
use crate::error::{Error, Result};

/// Cookie set by the repository when an editor opens a preview
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

const UID_PAGE_SIZE: u32 = 100;

/// Per-request data forwarded when rendering on demand instead of at build time
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw `Cookie` header of the incoming request
    pub cookies: Option<String>,
}

impl RequestContext {
    pub fn from_cookie_header(header: &str) -> Self {
        Self {
            cookies: Some(header.to_string()),
        }
    }

    /// Preview ref from the preview cookie, if the request carries one
    pub fn preview_ref(&self) -> Option<String> {
        let cookies = self.cookies.as_deref()?;
        let raw = cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == PREVIEW_COOKIE).then_some(value)
        })?;
        let decoded = percent_decode_str(raw).decode_utf8_lossy().to_string();

        // Newer toolbars store `{"<repo host>": {"preview": "<ref>"}}`
        if decoded.starts_with('{') {
            let json: serde_json::Value = serde_json::from_str(&decoded).ok()?;
            return json
                .as_object()?
                .values()
                .find_map(|v| v.get("preview").and_then(|p| p.as_str()))
                .map(str::to_string);
        }

        Some(decoded).filter(|r| !r.is_empty())
    }
}

/// Search predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact match on a document path, e.g. `document.type`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: &str, value: &str) -> Self {
        Predicate::At {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    fn render(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!("[at({}, \"{}\")]", path, value.replace('"', "\\\""))
            }
        }
    }
}

/// Render predicates as the `q` query parameter
fn render_query(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(Predicate::render).collect();
    format!("[{}]", inner)
}

/// Options of a search request
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Restrict `data` to these `type.field` paths
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
    /// e.g. `[document.first_publication_date desc]`
    pub orderings: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Configured handle on the content repository
#[derive(Debug, Clone)]
pub struct ContentClient {
    endpoint: Url,
    access_token: Option<String>,
    context: Option<RequestContext>,
    http: reqwest::Client,
}

impl ContentClient {
    /// Create a client bound to `endpoint`.
    ///
    /// Fails when the endpoint is empty, not a URL, not http(s), or has no host.
    pub fn new(endpoint: &str, context: Option<RequestContext>) -> Result<Self> {
        let endpoint = validate_endpoint(endpoint)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint,
            access_token: None,
            context,
            http,
        })
    }

    /// Create a client from the repository section of the site config
    pub fn from_config(config: &RepositoryConfig, context: Option<RequestContext>) -> Result<Self> {
        Ok(Self::new(&config.endpoint, context)?.with_access_token(config.access_token.clone()))
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// Same repository, different request context
    pub fn with_context(&self, context: Option<RequestContext>) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether `url` points into this repository (same scheme, host and port)
    pub fn owns_url(&self, url: &Url) -> bool {
        url.scheme() == self.endpoint.scheme()
            && url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default()
    }

    /// Ref advertised as master by the API root
    pub async fn master_ref(&self) -> Result<String> {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let root: ApiRoot = self.get_json(url).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(Error::MissingMasterRef)
    }

    /// Ref used for searches: the preview ref when present, else master
    pub async fn content_ref(&self) -> Result<String> {
        if let Some(preview) = self.context.as_ref().and_then(RequestContext::preview_ref) {
            tracing::debug!("Using preview ref from request context");
            return Ok(preview);
        }
        self.master_ref().await
    }

    /// Run a search. An empty predicate list is an unfiltered listing.
    pub async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<RawQueryResult> {
        let content_ref = self.content_ref().await?;

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
                reason: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(["documents", "search"]);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &content_ref);
            if !predicates.is_empty() {
                pairs.append_pair("q", &render_query(predicates));
            }
            if !options.fetch.is_empty() {
                pairs.append_pair("fetch", &options.fetch.join(","));
            }
            if let Some(page_size) = options.page_size {
                pairs.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(page) = options.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(orderings) = &options.orderings {
                pairs.append_pair("orderings", orderings);
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }

        tracing::debug!("Querying repository: {}", url);
        self.get_json(url).await
    }

    /// Look up a single document by its uid
    pub async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Option<RawDocument>> {
        let predicates = [Predicate::at(&format!("my.{}.uid", doc_type), uid)];
        let options = QueryOptions {
            page_size: Some(1),
            ..Default::default()
        };
        let page = self.query(&predicates, &options).await?;
        Ok(page.results.into_iter().next())
    }

    /// Every uid of the given document type, across all pages
    pub async fn all_uids(&self, doc_type: &str) -> Result<Vec<String>> {
        let predicates = [Predicate::at("document.type", doc_type)];
        let mut uids = Vec::new();
        let mut page = 1;

        loop {
            let options = QueryOptions {
                page_size: Some(UID_PAGE_SIZE),
                page: Some(page),
                ..Default::default()
            };
            let result = self.query(&predicates, &options).await?;
            let exhausted = result.results.is_empty() || result.next_page.is_none();
            uids.extend(result.results.into_iter().filter_map(|doc| doc.uid));

            if exhausted {
                break;
            }
            page += 1;
        }

        Ok(uids)
    }

    /// Fetch a page by its cursor URL. Cursors leading outside the repository are refused.
    pub async fn fetch_page(&self, cursor: &str) -> Result<RawQueryResult> {
        let url = Url::parse(cursor)?;
        if !self.owns_url(&url) {
            return Err(Error::ForeignCursor(cursor.to_string()));
        }
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let invalid = |reason: &str| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(invalid("endpoint is empty"));
    }

    let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }

    Ok(url)
}
