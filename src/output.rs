//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every post is its semantic identity (listing position and title), with
//! the generated path and metadata shown as indented context lines. This makes
//! the output readable as a content inventory.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Posts
//! 001 Como utilizar Hooks
//!     UID: como-utilizar-hooks
//!     Published: 15 mar 2022
//!     Author: Joseph Oliveira
//! 002 Rascunho
//!     No page: missing UID
//!
//! Fetched 2 posts in 1 batch
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//! Page 2 → page/2/index.html
//!
//! Posts
//! 001 Como utilizar Hooks → post/como-utilizar-hooks/index.html
//!
//! Generated 2 home pages, 1 post page
//! ```
//!
//! ## Check
//!
//! ```text
//! Endpoint: https://blog.cdn.prismic.io/api/v2
//! First batch: 2 posts
//! 001 Como utilizar Hooks
//! 002 Criando um app CRA do zero
//! More posts available
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::DateLocale;
use crate::fetch::Manifest;
use crate::generate::{self, format_publication_date};
use crate::types::{PostPagination, is_path_safe_uid};
use std::collections::HashSet;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a post header: positional index + title.
///
/// ```text
/// 001 Como utilizar Hooks
/// 002 (untitled)
/// ```
fn entity_header(index: usize, title: &str) -> String {
    if title.trim().is_empty() {
        format!("{} (untitled)", format_index(index))
    } else {
        format!("{} {}", format_index(index), truncate_title(title, 60))
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_title(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// `1 post`, `2 posts`.
fn count(n: usize, noun: &str) -> String {
    let plural = if noun.ends_with("ch") {
        format!("{}es", noun)
    } else {
        format!("{}s", noun)
    };
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}", n, plural)
    }
}

// ============================================================================
// Fetch
// ============================================================================

/// Format the fetch manifest as a post inventory.
pub fn format_fetch_output(manifest: &Manifest) -> Vec<String> {
    let locale = manifest.config.site.date_locale;
    let mut lines = vec!["Posts".to_string()];
    let mut seen = HashSet::new();

    for (i, post) in manifest.listing.iter().enumerate() {
        lines.push(entity_header(i + 1, &post.title));
        match post.uid.as_deref() {
            None => lines.push(format!("{}No page: missing UID", indent(1))),
            Some(uid) if !is_path_safe_uid(uid) => {
                lines.push(format!("{}No page: unusable UID {:?}", indent(1), uid))
            }
            Some(uid) if !seen.insert(uid) => {
                lines.push(format!("{}No page: duplicate UID {}", indent(1), uid))
            }
            Some(uid) => lines.push(format!("{}UID: {}", indent(1), uid)),
        }
        if let Some(date) = format_publication_date(post.first_publication_date.as_deref(), locale)
        {
            lines.push(format!("{}Published: {}", indent(1), date));
        }
        if !post.author.is_empty() {
            lines.push(format!("{}Author: {}", indent(1), post.author));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Fetched {} in {}",
        count(manifest.listing.len(), "post"),
        count(manifest.batches.len(), "batch")
    ));
    if manifest.has_more {
        lines.push(format!(
            "More posts available (stopped at cms.max_pages = {})",
            manifest.config.cms.max_pages
        ));
    }

    lines
}

/// Print fetch output to stdout.
pub fn print_fetch_output(manifest: &Manifest) {
    for line in format_fetch_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Format the pages the generate stage wrote for this manifest.
pub fn format_generate_output(manifest: &Manifest) -> Vec<String> {
    let home_pages = generate::home_page_count(manifest);
    let mut lines = Vec::new();

    for page in 1..=home_pages {
        let label = if page == 1 {
            "Home".to_string()
        } else {
            format!("Page {}", page)
        };
        lines.push(format!("{} → {}", label, generate::home_page_path(page)));
    }

    let posts: Vec<_> = generate::post_pages(manifest).collect();
    if !posts.is_empty() {
        lines.push(String::new());
        lines.push("Posts".to_string());
        for (i, (uid, post)) in posts.iter().enumerate() {
            lines.push(format!(
                "{} → post/{}/index.html",
                entity_header(i + 1, &post.data.title),
                uid
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}",
        count(home_pages, "home page"),
        count(posts.len(), "post page")
    ));

    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(manifest: &Manifest) {
    for line in format_generate_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of probing the CMS for its first batch.
pub fn format_check_output(
    endpoint: &str,
    first: &PostPagination,
    locale: DateLocale,
) -> Vec<String> {
    let mut lines = vec![
        format!("Endpoint: {}", endpoint),
        format!("First batch: {}", count(first.results.len(), "post")),
    ];
    for (i, post) in first.results.iter().enumerate() {
        lines.push(entity_header(i + 1, &post.data.title));
        if let Some(date) = format_publication_date(post.first_publication_date.as_deref(), locale)
        {
            lines.push(format!("{}Published: {}", indent(1), date));
        }
    }
    if first.next_page.is_some() {
        lines.push("More posts available".to_string());
    }
    lines
}

pub fn print_check_output(endpoint: &str, first: &PostPagination, locale: DateLocale) {
    for line in format_check_output(endpoint, first, locale) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
