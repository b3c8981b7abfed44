//! Post records as the CMS delivers them, shared by both pipeline stages.
//!
//! These types deserialize straight from the CMS search API and are written
//! back out to `manifest.json`, so fetch and generate agree on one shape.
//!
//! Every field defaults when missing. Authors leave subtitles blank, banners
//! unset and content groups empty; none of that is allowed to fail a build.

use crate::richtext::RichText;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the type's default.
///
/// The CMS sends empty fields as `null` rather than leaving them out, which
/// `#[serde(default)]` alone does not cover.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A post document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    /// URL slug assigned in the CMS. Posts without one cannot get a page.
    pub uid: Option<String>,
    /// ISO-8601 timestamp of the first publication, `null` for drafts.
    pub first_publication_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub data: PostData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostData {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub banner: Banner,
    #[serde(deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub url: Option<String>,
}

/// One content group of a post: a heading followed by rich-text body blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: RichText,
}

/// One page of search results plus the cursor to the next page.
///
/// `next_page` is opaque: it is followed verbatim, never parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPagination {
    pub next_page: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<Post>,
}

/// The slice of a post the home page lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            uid: post.uid.clone(),
            first_publication_date: post.first_publication_date.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
        }
    }
}

/// Whether a UID can be used as a single URL path segment on disk.
///
/// CMS slugs are lowercase words joined by dashes; anything that could
/// escape the `post/` directory or needs percent-encoding is refused.
pub fn is_path_safe_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
