//! Everything that talks to the headless CMS.
//!
//! The module is split into:
//! - **Source**: [`ContentSource`] trait, the seam between the pipeline and
//!   the content API, plus [`CmsError`]
//! - **Prismic**: [`PrismicClient`], the HTTP implementation of the trait
//! - **Cache**: [`ResponseCache`], an on-disk store of API responses that
//!   lets repeated builds skip the network while content is fresh

pub mod cache;
pub mod prismic;
pub mod source;

pub use cache::{CacheStats, ResponseCache};
pub use prismic::PrismicClient;
pub use source::{CmsError, ContentSource};
