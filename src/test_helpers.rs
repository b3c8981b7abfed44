//! Shared test utilities for the inkpress test suite.
//!
//! Provides post builders and [`MemorySource`], an in-memory
//! [`ContentSource`] that serves pre-built pages and records every call.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let posts = (1..=5).map(|i| post(&format!("post-{i}"), &format!("Post {i}"), 10)).collect();
//! let source = MemorySource::paged(posts, 2);
//!
//! let first = source.first_page(2).unwrap();
//! assert_eq!(first.next_page.as_deref(), Some("cursor-2"));
//! assert_eq!(source.calls(), vec!["first_page"]);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use crate::cms::{CmsError, ContentSource};
use crate::richtext::{Block, BlockKind};
use crate::types::{ContentSection, Post, PostPagination};

// =========================================================================
// Post builders
// =========================================================================

/// A published post whose single content section has `words` body words.
pub fn post(uid: &str, title: &str, words: usize) -> Post {
    let mut post = Post {
        uid: Some(uid.to_string()),
        first_publication_date: Some("2022-03-15T19:25:28+0000".to_string()),
        ..Post::default()
    };
    post.data.title = title.to_string();
    post.data.subtitle = format!("About {}", title);
    post.data.author = "Vinícios Oliveira".to_string();
    post.data.banner.url = Some(format!("https://images.example/{}.png", uid));
    post.data.content = vec![ContentSection {
        heading: format!("{} heading", title),
        body: vec![Block::text(
            BlockKind::Paragraph,
            vec!["lorem"; words].join(" "),
        )],
    }];
    post
}

// =========================================================================
// In-memory content source
// =========================================================================

/// Serves listing pages with cursors `cursor-2`, `cursor-3`, ... and
/// detail lookups by UID.
#[derive(Debug, Default)]
pub struct MemorySource {
    pub pages: Vec<PostPagination>,
    pub details: HashMap<String, Post>,
    calls: RefCell<Vec<String>>,
}

impl MemorySource {
    /// Split `posts` into pages of `page_size`; every post is also
    /// available by UID, the first one listed when a UID repeats.
    pub fn paged(posts: Vec<Post>, page_size: usize) -> Self {
        let mut details = HashMap::new();
        for post in &posts {
            if let Some(uid) = &post.uid {
                details.entry(uid.clone()).or_insert_with(|| post.clone());
            }
        }
        let chunks: Vec<Vec<Post>> = posts.chunks(page_size.max(1)).map(|c| c.to_vec()).collect();
        let count = chunks.len();
        let pages = chunks
            .into_iter()
            .enumerate()
            .map(|(i, results)| PostPagination {
                next_page: (i + 1 < count).then(|| format!("cursor-{}", i + 2)),
                results,
            })
            .collect();
        Self {
            pages,
            details,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Every call made so far, as `first_page`, `next_page:<cursor>` or
    /// `post_by_uid:<uid>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl ContentSource for MemorySource {
    fn first_page(&self, _page_size: u32) -> Result<PostPagination, CmsError> {
        self.record("first_page".to_string());
        Ok(self.pages.first().cloned().unwrap_or_default())
    }

    fn next_page(&self, cursor: &str) -> Result<PostPagination, CmsError> {
        self.record(format!("next_page:{}", cursor));
        let index = cursor
            .strip_prefix("cursor-")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| CmsError::InvalidUrl(cursor.to_string()))?;
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| CmsError::Status {
                url: cursor.to_string(),
                status: 404,
            })
    }

    fn post_by_uid(&self, uid: &str) -> Result<Option<Post>, CmsError> {
        self.record(format!("post_by_uid:{}", uid));
        Ok(self.details.get(uid).cloned())
    }
}
