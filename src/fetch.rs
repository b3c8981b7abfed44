//! CMS fetching and manifest generation.
//!
//! Stage 1 of the inkpress build pipeline. Walks the post listing by
//! following the pagination cursor, then loads each listed post by UID for
//! its full content. The result is a [`Manifest`] the generate stage renders
//! without touching the network.
//!
//! ## Output
//!
//! - `listing`: what the home pages show, in CMS order (newest first)
//! - `batches`: size of each listing batch, one home page per batch
//! - `posts`: full post records, one per distinct UID
//! - `config`: the resolved site config, minus the access token
//!
//! ## Skipped posts
//!
//! A listed post without a UID, with a UID that is not a safe path segment,
//! or with a UID already seen, stays in the listing but gets no page. Each
//! case is logged as a warning. If the detail query finds nothing for a UID,
//! the listing record is used as the post.

use crate::cms::{CmsError, ContentSource};
use crate::config::SiteConfig;
use crate::pagination;
use crate::types::{Post, PostSummary, is_path_safe_uid};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Manifest output from the fetch stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub listing: Vec<PostSummary>,
    pub batches: Vec<usize>,
    /// The cursor was still live when `cms.max_pages` stopped the listing.
    #[serde(default)]
    pub has_more: bool,
    pub posts: Vec<Post>,
    pub config: SiteConfig,
}

pub fn fetch(source: &impl ContentSource, config: &SiteConfig) -> Result<Manifest, FetchError> {
    let paginator =
        pagination::collect_all(source, config.cms.page_size, config.cms.page_limit())?;
    let has_more = paginator.has_more();
    let (listed, batches, _) = paginator.into_parts();
    log::info!("Listed {} posts in {} batches", listed.len(), batches.len());

    let listing = listed.iter().map(PostSummary::from).collect();

    let mut seen = HashSet::new();
    let mut posts = Vec::new();
    for post in &listed {
        let Some(uid) = post.uid.as_deref() else {
            log::warn!("Post \"{}\" has no UID, skipping its page", post.data.title);
            continue;
        };
        if !is_path_safe_uid(uid) {
            log::warn!("UID {:?} is not a valid path segment, skipping its page", uid);
            continue;
        }
        if !seen.insert(uid.to_string()) {
            log::warn!("Duplicate UID {:?} in listing, keeping the first", uid);
            continue;
        }

        let mut detail = match source.post_by_uid(uid)? {
            Some(detail) => detail,
            None => {
                log::warn!("No post found for UID {:?}, using the listing record", uid);
                post.clone()
            }
        };
        detail.uid = Some(uid.to_string());
        posts.push(detail);
    }

    let mut config = config.clone();
    config.cms.access_token = None;

    Ok(Manifest {
        listing,
        batches,
        has_more,
        posts,
        config,
    })
}

/// Write the manifest as pretty JSON, creating parent directories.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_manifest(path: &Path) -> Result<Manifest, FetchError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
