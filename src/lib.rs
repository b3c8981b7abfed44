//! # Inkpress
//!
//! A static blog generator for a headless CMS. Posts are authored in a
//! Prismic repository; inkpress pulls them and writes a plain HTML site with
//! a paginated home page and one page per post.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! Inkpress runs content through two independent stages, connected by a JSON
//! manifest:
//!
//! ```text
//! 1. Fetch     CMS       →  manifest.json    (API responses → structured data)
//! 2. Generate  manifest  →  dist/            (final HTML site)
//! ```
//!
//! The manifest is human-readable JSON you can inspect, and the generate stage
//! never touches the network, so rendering can be tested and re-run offline.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`cms`] | Content source trait, Prismic client, on-disk response cache |
//! | [`pagination`] | Cursor-following listing with "load more" semantics |
//! | [`fetch`] | Stage 1: walks the listing, loads each post, writes the manifest |
//! | [`generate`] | Stage 2: renders home and post pages with Maud |
//! | [`richtext`] | Rich-text document model, plain-text and HTML renderers |
//! | [`reading`] | Word count and reading-time estimate |
//! | [`config`] | `config.toml` loading, env overrides, validation, CSS generation |
//! | [`types`] | Post records shared between stages |
//! | [`output`] | CLI output formatting of pipeline results |
//!
//! # Design Decisions
//!
//! ## "Load More" as Static Pages
//!
//! The home page shows the first batch of posts. Pressing "load more" on a
//! static site cannot run a query, so each state the button would reach is
//! pre-rendered: `/page/n/` shows batches one through `n`, and every listing
//! page links to the next. The result works without JavaScript.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. CMS text is interpolated, so auto-escaping matters: the
//! only unescaped HTML is the oEmbed markup of embed blocks.
//!
//! ## Response Cache
//!
//! Search responses are cached on disk for `cache.revalidate_secs` (one day
//! by default), so rebuilding a site whose content has not changed costs no
//! requests beyond the master ref lookup.

pub mod cms;
pub mod config;
pub mod fetch;
pub mod generate;
pub mod output;
pub mod pagination;
pub mod reading;
pub mod richtext;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
