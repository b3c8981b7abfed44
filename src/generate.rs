//! HTML site generation.
//!
//! Stage 2 of the inkpress build pipeline. Takes the fetch manifest and
//! generates the final static HTML site.
//!
//! ## Generated Pages
//!
//! - **Home page** (`/index.html`): the first listing batch
//! - **Listing pages** (`/page/{n}/index.html`): batches `1..=n`, the state of
//!   the home page after pressing "load more" `n - 1` times
//! - **Post pages** (`/post/{uid}/index.html`): banner, title, publication
//!   date, author, reading time, and the rich-text content sections
//!
//! Every listing page except the last links to the next one.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Batch 1
//! ├── page/
//! │   └── 2/
//! │       └── index.html         # Batches 1-2
//! ├── post/
//! │   ├── como-utilizar-hooks/
//! │   │   └── index.html
//! │   └── criando-um-app-cra-do-zero/
//! │       └── index.html
//! └── images/
//!     └── logo.svg               # Copied from site/assets/
//! ```
//!
//! ## CSS
//!
//! `static/style.css` is embedded at compile time; color variables from the
//! config are prepended to it and the result is inlined into every page.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::config::{self, DateLocale, SiteSettings};
use crate::fetch::Manifest;
use crate::reading;
use crate::richtext;
use crate::types::{Post, PostSummary, is_path_safe_uid};
use chrono::{DateTime, FixedOffset};
use maud::{DOCTYPE, Markup, html};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

pub fn generate(
    manifest: &Manifest,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<(), GenerateError> {
    let color_css = config::generate_color_css(&manifest.config.colors);
    let css = format!("{}\n\n{}", color_css, CSS_STATIC);

    fs::create_dir_all(output_dir)?;

    let assets_dir = source_dir.join("assets");
    if assets_dir.is_dir() {
        copy_dir_recursive(&assets_dir, output_dir)?;
    }

    for page in 1..=home_page_count(manifest) {
        let html = render_home_page(manifest, page, &css);
        let path = output_dir.join(home_page_path(page));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, html.into_string())?;
        log::debug!("Generated {}", path.display());
    }

    post_pages(manifest)
        .collect::<Vec<_>>()
        .par_iter()
        .try_for_each(|(uid, post)| -> Result<(), GenerateError> {
            let html = render_post_page(post, &manifest.config, &css);
            let dir = output_dir.join("post").join(uid);
            fs::create_dir_all(&dir)?;
            fs::write(dir.join("index.html"), html.into_string())?;
            log::debug!("Generated post/{}/index.html", uid);
            Ok(())
        })?;

    log::info!("Site generated at {}", output_dir.display());
    Ok(())
}

/// Number of listing pages. An empty blog still gets its home page.
pub fn home_page_count(manifest: &Manifest) -> usize {
    manifest.batches.len().max(1)
}

/// Posts that get a page, with their UIDs.
pub fn post_pages(manifest: &Manifest) -> impl Iterator<Item = (&str, &Post)> {
    manifest.posts.iter().filter_map(|post| {
        post.uid
            .as_deref()
            .filter(|uid| is_path_safe_uid(uid))
            .map(|uid| (uid, post))
    })
}

/// Output path of listing page `page` (1-based), relative to the output root.
pub fn home_page_path(page: usize) -> String {
    if page <= 1 {
        "index.html".to_string()
    } else {
        format!("page/{}/index.html", page)
    }
}

/// Site-absolute URL of listing page `page`.
pub fn home_page_url(page: usize) -> String {
    if page <= 1 {
        "/".to_string()
    } else {
        format!("/page/{}/", page)
    }
}

pub fn post_url(uid: &str) -> String {
    format!("/post/{}/", uid)
}

/// Posts shown on listing page `page`: every batch up to and including it.
fn listing_for_page(manifest: &Manifest, page: usize) -> &[PostSummary] {
    let shown: usize = manifest.batches.iter().take(page).sum();
    &manifest.listing[..shown.min(manifest.listing.len())]
}

fn parse_publication_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

/// Format a CMS timestamp as `dd MMM yyyy` in the given locale.
///
/// Missing or unparsable dates yield `None`, and the date is left out.
pub fn format_publication_date(raw: Option<&str>, locale: DateLocale) -> Option<String> {
    let date = parse_publication_date(raw?)?;
    Some(
        date.format_localized("%d %b %Y", locale.chrono_locale())
            .to_string(),
    )
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, site: &SiteSettings, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (css) }
            }
            body {
                (content)
                @if !site.footer.is_empty() {
                    footer.site-footer {
                        p { (site.footer) }
                    }
                }
            }
        }
    }
}

/// Renders the site header: the logo, linking home
fn site_header(site: &SiteSettings) -> Markup {
    html! {
        header.site-header {
            a href="/" {
                img src=(site.logo) alt="logo";
            }
        }
    }
}

/// Date and author line shared by listing entries and post pages
fn post_info(date: Option<&str>, author: &str, locale: DateLocale) -> Markup {
    let formatted = format_publication_date(date, locale);
    html! {
        @if let (Some(raw), Some(formatted)) = (date, &formatted) {
            time.post-date datetime=(raw) { (formatted) }
        }
        @if !author.is_empty() {
            span.post-author { (author) }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders listing page `page` (1-based)
fn render_home_page(manifest: &Manifest, page: usize, css: &str) -> Markup {
    let site = &manifest.config.site;
    let posts = listing_for_page(manifest, page);
    let has_next = page < manifest.batches.len();

    let content = html! {
        (site_header(site))
        main.home-page {
            div.posts {
                @for post in posts {
                    article.post-card {
                        @if let Some(uid) = post.uid.as_deref().filter(|u| is_path_safe_uid(u)) {
                            a href=(post_url(uid)) {
                                h2.post-title { (post.title) }
                            }
                        } @else {
                            h2.post-title { (post.title) }
                        }
                        @if !post.subtitle.is_empty() {
                            p.post-subtitle { (post.subtitle) }
                        }
                        div.post-info {
                            (post_info(post.first_publication_date.as_deref(), &post.author, site.date_locale))
                        }
                    }
                }
            }
            @if has_next {
                a.load-more href=(home_page_url(page + 1)) { (site.load_more_label) }
            }
        }
    };

    base_document(&site.title, site, css, content)
}

/// Renders a post page
fn render_post_page(post: &Post, config: &config::SiteConfig, css: &str) -> Markup {
    let site = &config.site;
    let data = &post.data;
    let minutes = reading::reading_time(&data.content, config.reading.words_per_minute);

    let page_title = if data.title.is_empty() {
        site.title.clone()
    } else {
        format!("{} | {}", data.title, site.title)
    };

    let content = html! {
        (site_header(site))
        @if let Some(url) = data.banner.url.as_deref().filter(|u| !u.is_empty()) {
            div.banner {
                img src=(url) alt="banner";
            }
        }
        main.post-page {
            article.post {
                h1.post-title { (data.title) }
                div.post-info {
                    (post_info(post.first_publication_date.as_deref(), &data.author, site.date_locale))
                    span.reading-time { (minutes) " min" }
                }
                @for section in &data.content {
                    section.post-section {
                        @if !section.heading.is_empty() {
                            h2 { (section.heading) }
                        }
                        div.post-body {
                            (richtext::as_html(&section.body))
                        }
                    }
                }
            }
        }
    };

    base_document(&page_title, site, css, content)
}

// ============================================================================
// Tests
// ============================================================================
