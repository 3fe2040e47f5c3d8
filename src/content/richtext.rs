//! Structured rich text as stored by the content repository
//!
//! A rich-text field is an ordered list of blocks. Each block carries its
//! plain text plus a list of spans that decorate character ranges. Span
//! offsets count UTF-16 code units, matching the repository's JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered sequence of rich-text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

/// A single block (paragraph, heading, list item, image, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source (image blocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Image alt text (image blocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// oEmbed payload (embed blocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Value>,
}

/// A decorated character range inside a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Maps a document link (custom type, uid) to a site path
pub trait LinkResolver {
    fn resolve(&self, doc_type: &str, uid: &str) -> String;
}

impl<F> LinkResolver for F
where
    F: Fn(&str, &str) -> String,
{
    fn resolve(&self, doc_type: &str, uid: &str) -> String {
        self(doc_type, uid)
    }
}

impl Block {
    /// Create a block with plain text and no spans
    pub fn new(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn has_text(&self) -> bool {
        !matches!(self.kind.as_str(), "image" | "embed")
    }
}

impl RichText {
    /// Build rich text from a raw JSON field.
    ///
    /// Arrays are read block by block, skipping blocks that do not
    /// deserialize. A bare string becomes a single paragraph. Anything else
    /// yields empty rich text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => RichText(
                items
                    .iter()
                    .filter_map(|item| match serde_json::from_value::<Block>(item.clone()) {
                        Ok(block) => Some(block),
                        Err(e) => {
                            tracing::debug!("Skipping malformed rich-text block: {}", e);
                            None
                        }
                    })
                    .collect(),
            ),
            Value::String(s) => RichText(vec![Block::new("paragraph", s)]),
            _ => RichText::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten to plain text, one space between blocks
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .filter(|b| b.has_text())
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render to HTML
    pub fn as_html(&self, resolver: &dyn LinkResolver) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in &self.0 {
            let list_tag = match block.kind.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };

            if open_list != list_tag {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list_tag {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list_tag;
            }

            html.push_str(&render_block(block, resolver));
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }
}

fn render_block(block: &Block, resolver: &dyn LinkResolver) -> String {
    match block.kind.as_str() {
        kind @ ("heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6") => {
            let level = &kind["heading".len()..];
            format!(
                "<h{}>{}</h{}>",
                level,
                render_spans(&block.text, &block.spans, resolver),
                level
            )
        }
        "preformatted" => format!("<pre>{}</pre>", render_spans(&block.text, &block.spans, resolver)),
        "list-item" | "o-list-item" => {
            format!("<li>{}</li>", render_spans(&block.text, &block.spans, resolver))
        }
        "image" => format!(
            r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
            escape_html(block.url.as_deref().unwrap_or_default()),
            escape_html(block.alt.as_deref().unwrap_or_default())
        ),
        "embed" => {
            let oembed = block.oembed.as_ref();
            let field = |name: &str| {
                oembed
                    .and_then(|o| o.get(name))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            format!(
                r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
                escape_html(&field("embed_url")),
                escape_html(&field("type")),
                field("html")
            )
        }
        _ => format!("<p>{}</p>", render_spans(&block.text, &block.spans, resolver)),
    }
}

/// Apply spans over the block text, keeping the output well nested.
fn render_spans(text: &str, spans: &[Span], resolver: &dyn LinkResolver) -> String {
    let mut pending: Vec<&Span> = spans.iter().filter(|s| s.end > s.start).collect();
    // Outer spans first: earlier start, then longer range
    pending.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut pending = pending.into_iter().peekable();

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut offset = 0usize;

    for ch in text.chars() {
        close_ended(&mut out, &mut open, offset, resolver);

        while let Some(span) = pending.next_if(|s| s.start <= offset) {
            if span.end > offset {
                out.push_str(&open_tag(span, resolver));
                open.push(span);
            }
        }

        match ch {
            '\n' => out.push_str("<br />"),
            c => push_escaped(&mut out, c),
        }
        offset += ch.len_utf16();
    }

    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
    }

    out
}

/// Close every open span ending at `offset`, reopening the spans that were
/// nested inside it and are still running.
fn close_ended<'a>(
    out: &mut String,
    open: &mut Vec<&'a Span>,
    offset: usize,
    resolver: &dyn LinkResolver,
) {
    while let Some(pos) = open.iter().position(|s| s.end <= offset) {
        let closed: Vec<&Span> = open.drain(pos..).collect();
        for span in closed.iter().rev() {
            out.push_str(close_tag(span));
        }
        for span in closed.into_iter().filter(|s| s.end > offset) {
            out.push_str(&open_tag(span, resolver));
            open.push(span);
        }
    }
}

fn open_tag(span: &Span, resolver: &dyn LinkResolver) -> String {
    let data = span.data.as_ref();
    let str_field = |name: &str| data.and_then(|d| d.get(name)).and_then(|v| v.as_str());

    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let href = match str_field("link_type") {
                Some("Document") => resolver.resolve(
                    str_field("type").unwrap_or_default(),
                    str_field("uid").unwrap_or_default(),
                ),
                _ => str_field("url").unwrap_or_default().to_string(),
            };
            match str_field("target") {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    escape_html(&href),
                    escape_html(target)
                ),
                None => format!(r#"<a href="{}">"#, escape_html(&href)),
            }
        }
        "label" => format!(
            r#"<span class="{}">"#,
            escape_html(str_field("label").unwrap_or_default())
        ),
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        c => out.push(c),
    }
}

/// HTML escaping for text and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out
}
