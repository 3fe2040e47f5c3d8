//! Content module - repository documents, listings, and article text

mod document;
pub mod listing;
pub mod reading_time;
pub mod richtext;

pub use document::{
    parse_timestamp, ArticleBody, ArticleListing, ArticleState, ArticleSummary, RawDocument,
    RawQueryResult, Section,
};
pub use listing::{assemble_listing, ListingLoader, ListingSession};
pub use reading_time::{estimate_reading_minutes, WORDS_PER_MINUTE};
pub use richtext::{LinkResolver, RichText};
