//! Reading-time estimate for a post.
//!
//! Words are whitespace-delimited tokens of the body text of every content
//! section. Section headings are not counted. The estimate is the word count
//! divided by a reading speed, rounded up to whole minutes, so any non-empty
//! post reads in at least one minute and an empty one in zero.

use crate::richtext;
use crate::types::ContentSection;

/// Reading speed used when the config does not override it.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Number of words across the bodies of all sections.
pub fn word_count(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| richtext::as_text(&section.body).split_whitespace().count())
        .sum()
}

/// Minutes needed to read the content at `words_per_minute`, rounded up.
///
/// A zero reading speed yields zero rather than dividing by it; config
/// validation keeps that value out of real builds.
pub fn reading_time(content: &[ContentSection], words_per_minute: u32) -> u32 {
    if words_per_minute == 0 {
        return 0;
    }
    let minutes = word_count(content).div_ceil(words_per_minute as usize);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
