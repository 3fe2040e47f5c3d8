//! Repository wire types and the article models projected from them

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::richtext::RichText;

/// One page of a repository search.
///
/// Decoding is lenient: a field of the wrong shape falls back to its default
/// and a malformed record becomes an empty one, so a single bad record never
/// costs the whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQueryResult {
    #[serde(default, deserialize_with = "lenient")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub results_per_page: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub results_size: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_results_size: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_pages: Option<u32>,
    /// Cursor for the following page, `None` on the last page
    #[serde(default, deserialize_with = "lenient")]
    pub next_page: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub prev_page: Option<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub results: Vec<RawDocument>,
}

/// A document exactly as the repository returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub uid: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "lenient")]
    pub first_publication_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_publication_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub lang: Option<String>,
    #[serde(default)]
    pub data: Value,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<RawDocument>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = match Value::deserialize(deserializer)? {
        Value::Array(records) => records,
        other => {
            tracing::warn!("Ignoring search results of unexpected shape: {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(records
        .into_iter()
        .map(|record| {
            serde_json::from_value(record).unwrap_or_else(|e| {
                tracing::warn!("Malformed record in search results: {}", e);
                RawDocument::default()
            })
        })
        .collect())
}

impl RawDocument {
    /// Read a text field from `data`.
    ///
    /// Key-text fields are plain strings; title fields arrive as rich text
    /// and are flattened. Missing or other shapes give an empty string.
    pub fn text_field(&self, name: &str) -> String {
        match self.data.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(v @ Value::Array(_)) => RichText::from_value(v).as_text(),
            _ => String::new(),
        }
    }

    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.first_publication_date
            .as_deref()
            .and_then(parse_timestamp)
    }
}

/// Parse a repository timestamp (`2021-03-19T21:34:10+0000` or RFC 3339)
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

/// Listing entry for one article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// Unique slug, when the record has one
    pub id: Option<String>,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl ArticleSummary {
    /// Project a raw record, keeping only the listing fields
    pub fn from_raw(raw: &RawDocument) -> Self {
        Self {
            id: raw.uid.clone(),
            published_at: raw.published_at(),
            title: raw.text_field("title"),
            subtitle: raw.text_field("subtitle"),
            author: raw.text_field("author"),
        }
    }
}

/// An ordered listing plus the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleListing {
    pub cursor: Option<String>,
    pub items: Vec<ArticleSummary>,
}

impl ArticleListing {
    pub fn has_next_page(&self) -> bool {
        self.cursor.is_some()
    }
}

/// One titled section of an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: RichText,
}

/// A fully fetched article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleBody {
    pub uid: String,
    pub title: String,
    pub author: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub banner_url: Option<String>,
    pub sections: Vec<Section>,
}

impl ArticleBody {
    /// Build an article from a raw record. Missing fields become empty.
    pub fn from_raw(raw: &RawDocument) -> Self {
        let banner_url = raw
            .data
            .get("banner")
            .and_then(|b| b.get("url"))
            .and_then(|u| u.as_str())
            .map(str::to_string);

        let sections = raw
            .data
            .get("content")
            .and_then(|c| c.as_array())
            .map(|groups| {
                groups
                    .iter()
                    .map(|group| Section {
                        heading: match group.get("heading") {
                            Some(Value::String(s)) => s.clone(),
                            Some(v @ Value::Array(_)) => RichText::from_value(v).as_text(),
                            _ => String::new(),
                        },
                        body: group
                            .get("body")
                            .map(RichText::from_value)
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            uid: raw.uid.clone().unwrap_or_default(),
            title: raw.text_field("title"),
            author: raw.text_field("author"),
            published_at: raw.published_at(),
            banner_url,
            sections,
        }
    }
}

/// Render state of an article page
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleState {
    /// Page not generated yet; render a loading indicator
    Pending,
    Ready(ArticleBody),
    NotFound,
}

impl ArticleState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ArticleState::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn raw_post() -> RawDocument {
        serde_json::from_value(json!({
            "id": "YFUbKhIAACMA",
            "uid": "como-utilizar-hooks",
            "type": "post",
            "first_publication_date": "2021-03-19T21:34:10+0000",
            "last_publication_date": "2021-03-20T10:00:00+0000",
            "lang": "pt-br",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                "author": "Joseph Oliveira",
                "banner": { "url": "https://images.example/banner.png" },
                "content": [
                    { "heading": "Proin et varius",
                      "body": [{ "type": "paragraph", "text": "Nullam dolor sapien", "spans": [] }] },
                    { "heading": [{ "type": "heading2", "text": "Cras laoreet", "spans": [] }],
                      "body": [] }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let ts = parse_timestamp("2021-03-19T21:34:10+0000").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2021, 3, 19));
        assert_eq!(ts.hour(), 21);

        assert!(parse_timestamp("2021-03-19T21:34:10+00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_summary_projection() {
        let summary = ArticleSummary::from_raw(&raw_post());
        assert_eq!(summary.id.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(summary.title, "Como utilizar Hooks");
        assert_eq!(
            summary.subtitle,
            "Pensando em sincronização em vez de ciclos de vida"
        );
        assert_eq!(summary.author, "Joseph Oliveira");
        assert!(summary.published_at.is_some());
    }

    #[test]
    fn test_summary_tolerates_missing_fields() {
        let raw: RawDocument = serde_json::from_value(json!({
            "id": "x",
            "first_publication_date": null,
            "data": { "title": "Only title", "author": 7 }
        }))
        .unwrap();
        let summary = ArticleSummary::from_raw(&raw);
        assert_eq!(summary.id, None);
        assert_eq!(summary.published_at, None);
        assert_eq!(summary.title, "Only title");
        assert_eq!(summary.subtitle, "");
        assert_eq!(summary.author, "");
    }

    #[test]
    fn test_body_projection() {
        let body = ArticleBody::from_raw(&raw_post());
        assert_eq!(body.uid, "como-utilizar-hooks");
        assert_eq!(
            body.banner_url.as_deref(),
            Some("https://images.example/banner.png")
        );
        assert_eq!(body.sections.len(), 2);
        assert_eq!(body.sections[0].heading, "Proin et varius");
        assert_eq!(body.sections[0].body.as_text(), "Nullam dolor sapien");
        assert_eq!(body.sections[1].heading, "Cras laoreet");
        assert!(body.sections[1].body.is_empty());
    }

    #[test]
    fn test_body_without_content() {
        let raw: RawDocument =
            serde_json::from_value(json!({ "id": "y", "uid": "empty", "data": {} })).unwrap();
        let body = ArticleBody::from_raw(&raw);
        assert!(body.sections.is_empty());
        assert_eq!(body.banner_url, None);
        assert_eq!(body.title, "");
    }
}
