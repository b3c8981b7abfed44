//! Post listing and pagination.
//!
//! The CMS returns posts in batches. Each batch comes with an opaque cursor
//! pointing at the next one, or none when the listing is exhausted. A
//! [`Paginator`] holds everything listed so far plus the current cursor;
//! [`Paginator::load_more`] follows the cursor and appends the next batch,
//! which is exactly what a "load more posts" button does.
//!
//! Batch sizes are remembered so the generate stage can lay the listing out
//! as one home page per batch.

use crate::cms::{CmsError, ContentSource};
use crate::types::{Post, PostPagination};

#[derive(Debug, Clone, Default)]
pub struct Paginator {
    posts: Vec<Post>,
    batches: Vec<usize>,
    next_page: Option<String>,
}

impl Paginator {
    /// Start from the first page of results.
    pub fn new(first: PostPagination) -> Self {
        let mut paginator = Self::default();
        paginator.append(first);
        paginator
    }

    /// Follow the cursor and append the batch it points to.
    ///
    /// Returns the number of posts appended; `Ok(0)` without any request when
    /// the listing is already exhausted. On error the cursor is kept, so the
    /// call can be retried.
    pub fn load_more(&mut self, source: &impl ContentSource) -> Result<usize, CmsError> {
        let Some(cursor) = self.next_page.take() else {
            return Ok(0);
        };
        let page = match source.next_page(&cursor) {
            Ok(page) => page,
            Err(e) => {
                self.next_page = Some(cursor);
                return Err(e);
            }
        };

        let added = self.append(page);
        if self.next_page.as_deref() == Some(cursor.as_str()) {
            log::warn!("CMS returned the same cursor twice, stopping pagination: {}", cursor);
            self.next_page = None;
        }
        Ok(added)
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Every post listed so far, in listing order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Sizes of the non-empty batches, in the order they were loaded.
    pub fn batches(&self) -> &[usize] {
        &self.batches
    }

    /// The cursor `load_more` would follow next.
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn into_parts(self) -> (Vec<Post>, Vec<usize>, Option<String>) {
        (self.posts, self.batches, self.next_page)
    }

    fn append(&mut self, page: PostPagination) -> usize {
        let added = page.results.len();
        if added > 0 {
            self.batches.push(added);
            self.posts.extend(page.results);
        }
        self.next_page = page.next_page.filter(|cursor| !cursor.trim().is_empty());
        added
    }
}

/// Load the first page and keep following the cursor until it runs out or
/// `max_pages` requests were made. Pages that come back empty still count
/// against the limit.
pub fn collect_all(
    source: &impl ContentSource,
    page_size: u32,
    max_pages: Option<u32>,
) -> Result<Paginator, CmsError> {
    let mut paginator = Paginator::new(source.first_page(page_size)?);
    let mut requests = 1;
    while paginator.has_more() && max_pages.is_none_or(|max| requests < max) {
        let added = paginator.load_more(source)?;
        requests += 1;
        log::debug!("Loaded {} more posts ({} total)", added, paginator.posts().len());
    }
    Ok(paginator)
}
