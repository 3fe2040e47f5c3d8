//! Estimated reading time of an article

use super::document::{ArticleState, Section};

/// Reading speed used for every estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Count words separated by runs of whitespace
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Total words across headings and flattened bodies
pub fn total_words(sections: &[Section]) -> usize {
    sections
        .iter()
        .map(|section| count_words(&section.heading) + count_words(&section.body.as_text()))
        .sum()
}

/// Minutes needed to read the sections, rounded up
pub fn estimate_reading_minutes(sections: &[Section]) -> u32 {
    let minutes = total_words(sections).div_ceil(WORDS_PER_MINUTE);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

impl ArticleState {
    /// Reading time of a ready article; zero while pending or missing
    pub fn reading_minutes(&self) -> u32 {
        match self {
            ArticleState::Ready(body) => estimate_reading_minutes(&body.sections),
            ArticleState::Pending | ArticleState::NotFound => 0,
        }
    }
}
