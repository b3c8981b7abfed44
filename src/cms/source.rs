//! Content source trait and shared error type.
//!
//! The pipeline only ever asks three questions of the CMS: give me the first
//! page of posts, follow this cursor, and give me the post with this UID.
//! [`ContentSource`] is exactly that, so fetch and pagination logic can be
//! exercised against an in-memory source in tests.

use crate::types::{Post, PostPagination};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CMS endpoint is not configured (set cms.endpoint or PRISMIC_API_ENDPOINT)")]
    MissingEndpoint,
    #[error("Invalid CMS URL {0}")]
    InvalidUrl(String),
    #[error("CMS returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("CMS API root lists no master ref")]
    NoMasterRef,
}

/// Read access to published posts.
pub trait ContentSource {
    /// First batch of posts, newest first.
    fn first_page(&self, page_size: u32) -> Result<PostPagination, CmsError>;

    /// The batch a pagination cursor points to.
    fn next_page(&self, cursor: &str) -> Result<PostPagination, CmsError>;

    /// A single post by UID, `None` when no such post is published.
    fn post_by_uid(&self, uid: &str) -> Result<Option<Post>, CmsError>;
}
