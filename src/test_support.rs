//! In-process content repository for tests

use axum::extract::{Query, State};
use axum::http::Uri;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// Serves the API root and document search over a fixed document set
pub struct FakeRepository {
    base: String,
    state: Arc<RepoState>,
}

struct RepoState {
    base: String,
    docs: Mutex<Vec<Value>>,
    requests: Mutex<Vec<String>>,
}

impl RepoState {
    fn record(&self, uri: &Uri) {
        self.requests.lock().unwrap().push(uri.to_string());
    }
}

impl FakeRepository {
    pub const MASTER_REF: &'static str = "master-ref";

    pub async fn spawn(docs: Vec<Value>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(RepoState {
            base: base.clone(),
            docs: Mutex::new(docs),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/v2", get(api_root))
            .route("/api/v2/documents/search", get(search))
            .route("/broken", get(broken))
            .with_state(state.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { base, state }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/v2", self.base)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Path and query of every request received so far
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn set_documents(&self, docs: Vec<Value>) {
        *self.state.docs.lock().unwrap() = docs;
    }
}

async fn api_root(State(state): State<Arc<RepoState>>, uri: Uri) -> Json<Value> {
    state.record(&uri);
    Json(json!({
        "refs": [
            { "id": "release", "ref": "release-ref", "label": "Spring", "isMasterRef": false },
            { "id": "master", "ref": FakeRepository::MASTER_REF, "label": "Master", "isMasterRef": true }
        ]
    }))
}

async fn broken(State(state): State<Arc<RepoState>>, uri: Uri) -> &'static str {
    state.record(&uri);
    "this is not json"
}

async fn search(
    State(state): State<Arc<RepoState>>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.record(&uri);

    let q = params.get("q").cloned().unwrap_or_default();
    let type_filter = predicate_value(&q, "document.type, \"");
    let uid_filter = predicate_value(&q, ".uid, \"");
    let fetch: Vec<String> = params
        .get("fetch")
        .map(|f| f.split(',').map(str::to_string).collect())
        .unwrap_or_default();

    let matching: Vec<Value> = state
        .docs
        .lock()
        .unwrap()
        .iter()
        .filter(|doc| type_filter.as_deref().map_or(true, |t| doc["type"] == t))
        .filter(|doc| uid_filter.as_deref().map_or(true, |u| doc["uid"] == u))
        .map(|doc| restrict_fields(doc, &fetch))
        .collect();

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let page_size: usize = params
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(20)
        .max(1);
    let total = matching.len();
    let total_pages = total.div_ceil(page_size);
    let start = ((page - 1) * page_size).min(total);
    let end = (start + page_size).min(total);
    let results = &matching[start..end];

    let next_page = if end < total {
        let mut next = Url::parse(&format!("{}/api/v2/documents/search", state.base)).unwrap();
        {
            let mut pairs = next.query_pairs_mut();
            for (key, value) in &params {
                if key != "page" {
                    pairs.append_pair(key, value);
                }
            }
            pairs.append_pair("page", &(page + 1).to_string());
        }
        Value::String(next.to_string())
    } else {
        Value::Null
    };

    Json(json!({
        "page": page,
        "results_per_page": page_size,
        "results_size": results.len(),
        "total_results_size": total,
        "total_pages": total_pages,
        "next_page": next_page,
        "prev_page": null,
        "results": results,
    }))
}

fn predicate_value(q: &str, marker: &str) -> Option<String> {
    let start = q.find(marker)? + marker.len();
    let rest = &q[start..];
    rest.find('"').map(|end| rest[..end].to_string())
}

/// Keep only the `data` fields named by `type.field` entries
fn restrict_fields(doc: &Value, fetch: &[String]) -> Value {
    if fetch.is_empty() {
        return doc.clone();
    }
    let mut doc = doc.clone();
    if let Some(data) = doc.get_mut("data").and_then(|d| d.as_object_mut()) {
        data.retain(|key, _| {
            fetch
                .iter()
                .any(|f| f.split_once('.').map(|(_, field)| field) == Some(key.as_str()))
        });
    }
    doc
}

/// A post document with one section whose body repeats the subtitle
pub fn post(uid: &str, title: &str, subtitle: &str, author: &str, published: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": published,
        "last_publication_date": published,
        "lang": "pt-br",
        "data": {
            "title": title,
            "subtitle": subtitle,
            "author": author,
            "banner": { "url": format!("https://images.example/{}.png", uid) },
            "content": [{
                "heading": title,
                "body": [{ "type": "paragraph", "text": subtitle, "spans": [] }]
            }]
        }
    })
}
