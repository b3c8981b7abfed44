//! Prismic REST API client.
//!
//! Every query needs a content release `ref`. The client asks the API root
//! for the master ref once, then runs searches against
//! `{endpoint}/documents/search`:
//!
//! ```text
//! GET {endpoint}                      → { "refs": [{ "ref": "...", "isMasterRef": true }] }
//! GET {endpoint}/documents/search
//!     ?ref=<master>
//!     &q=[[at(document.type,"posts")]]
//!     &orderings=[document.first_publication_date desc]
//!     &pageSize=20                    → { "next_page": "...", "results": [...] }
//! ```
//!
//! `next_page` in a search response is a complete URL. It is requested as-is
//! (only an access token is appended when the repository needs one).
//!
//! Search responses go through the [`ResponseCache`]; the API root never does.

use super::cache::{CacheStats, ResponseCache};
use super::source::{CmsError, ContentSource};
use crate::config::SiteConfig;
use crate::types::{Post, PostPagination};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::cell::{OnceCell, RefCell};
use std::time::Duration;

const USER_AGENT: &str = concat!("inkpress/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Blocking client for one Prismic repository.
pub struct PrismicClient {
    http: reqwest::blocking::Client,
    endpoint: Url,
    document_type: String,
    access_token: Option<String>,
    revalidate_secs: u64,
    master_ref: OnceCell<String>,
    cache: RefCell<ResponseCache>,
    stats: RefCell<CacheStats>,
}

impl PrismicClient {
    /// Build a client from the site config, starting from `cache`.
    pub fn new(config: &SiteConfig, cache: ResponseCache) -> Result<Self, CmsError> {
        let endpoint = config.cms.endpoint.trim();
        if endpoint.is_empty() {
            return Err(CmsError::MissingEndpoint);
        }
        let endpoint =
            Url::parse(endpoint).map_err(|_| CmsError::InvalidUrl(endpoint.to_string()))?;

        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.cms.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            document_type: config.cms.document_type.clone(),
            access_token: config.cms.access_token.clone(),
            revalidate_secs: config.cache.revalidate_secs,
            master_ref: OnceCell::new(),
            cache: RefCell::new(cache),
            stats: RefCell::new(CacheStats::default()),
        })
    }

    /// Hits and misses of search requests so far.
    pub fn cache_stats(&self) -> CacheStats {
        *self.stats.borrow()
    }

    /// Give back the cache, with this run's responses added and expired
    /// entries dropped.
    pub fn into_cache(self) -> ResponseCache {
        let mut cache = self.cache.into_inner();
        let removed = cache.prune(now(), self.revalidate_secs);
        if removed > 0 {
            log::debug!("Pruned {} expired CMS cache entries", removed);
        }
        cache
    }

    /// The ref of the currently published content release.
    pub fn master_ref(&self) -> Result<String, CmsError> {
        if let Some(reference) = self.master_ref.get() {
            return Ok(reference.clone());
        }
        let root: ApiRoot = self.get_json(self.endpoint.clone(), false)?;
        let reference = root
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(CmsError::NoMasterRef)?;
        log::debug!("Master ref: {}", reference);
        Ok(self.master_ref.get_or_init(|| reference).clone())
    }

    fn search_url(&self, query: &str, page_size: u32) -> Result<Url, CmsError> {
        let reference = self.master_ref()?;
        let base = format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        );
        let mut url = Url::parse(&base).map_err(|_| CmsError::InvalidUrl(base.clone()))?;
        url.query_pairs_mut()
            .append_pair("ref", &reference)
            .append_pair("q", query)
            .append_pair("orderings", "[document.first_publication_date desc]")
            .append_pair("pageSize", &page_size.to_string());
        Ok(url)
    }

    /// Append the access token unless the URL already carries one.
    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.access_token
            && !url.query_pairs().any(|(key, _)| key == "access_token")
        {
            url.query_pairs_mut().append_pair("access_token", token);
        }
    }

    fn get_json<T: DeserializeOwned>(&self, mut url: Url, cacheable: bool) -> Result<T, CmsError> {
        self.authorize(&mut url);
        let printable = redact(&url);

        if cacheable {
            let cached = self
                .cache
                .borrow()
                .get_fresh(url.as_str(), now(), self.revalidate_secs)
                .map(str::to_owned);
            if let Some(body) = cached {
                log::debug!("cache hit: {}", printable);
                self.stats.borrow_mut().hit();
                return Ok(serde_json::from_str(&body)?);
            }
        }

        log::debug!("GET {}", printable);
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|e| CmsError::Http(e.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                url: printable,
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .map_err(|e| CmsError::Http(e.without_url()))?;
        let value = serde_json::from_str(&body)?;

        if cacheable {
            self.cache.borrow_mut().insert(url.as_str(), body, now());
            self.stats.borrow_mut().miss();
        }
        Ok(value)
    }
}

impl ContentSource for PrismicClient {
    fn first_page(&self, page_size: u32) -> Result<PostPagination, CmsError> {
        let query = format!("[[at(document.type,\"{}\")]]", self.document_type);
        let url = self.search_url(&query, page_size)?;
        self.get_json(url, true)
    }

    fn next_page(&self, cursor: &str) -> Result<PostPagination, CmsError> {
        let url = Url::parse(cursor).map_err(|_| CmsError::InvalidUrl(cursor.to_string()))?;
        self.get_json(url, true)
    }

    fn post_by_uid(&self, uid: &str) -> Result<Option<Post>, CmsError> {
        let query = format!(
            "[[at(my.{}.uid,\"{}\")]]",
            self.document_type,
            uid.replace('"', "")
        );
        let url = self.search_url(&query, 1)?;
        let page: PostPagination = self.get_json(url, true)?;
        Ok(page.results.into_iter().next())
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// URL with the access token masked, for logs and error messages.
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "access_token") {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "access_token" {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};

    type Handler = dyn Fn(&str, &str) -> (u16, String) + Send + Sync;

    /// Minimal HTTP/1.1 server: one request per connection, answers from
    /// `handler(base_url, request_target)`, records every request target.
    fn serve(handler: Arc<Handler>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        let server_base = base.clone();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }
                let target = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("")
                    .to_string();
                log.lock().unwrap().push(target.clone());

                let (status, body) = handler(&server_base, &target);
                let response = format!(
                    "HTTP/1.1 {} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        (base, requests)
    }

    const API_ROOT: &str = r#"{"refs": [
        {"id": "preview", "ref": "preview-ref", "isMasterRef": false},
        {"id": "master", "ref": "master-ref", "isMasterRef": true}
    ]}"#;

    fn post_json(uid: &str, title: &str) -> String {
        format!(
            r#"{{"uid": "{}", "first_publication_date": "2021-03-15T19:25:28+0000",
                "data": {{"title": "{}", "subtitle": "", "author": "Ana", "content": []}}}}"#,
            uid, title
        )
    }

    /// A repository with two listing pages and one detail document.
    fn blog_handler(base: &str, target: &str) -> (u16, String) {
        if target == "/api/v2" || target.starts_with("/api/v2?") {
            return (200, API_ROOT.to_string());
        }
        if target.starts_with("/cursor/2") {
            return (
                200,
                format!(
                    r#"{{"next_page": null, "results": [{}]}}"#,
                    post_json("third", "Third")
                ),
            );
        }
        if target.starts_with("/api/v2/documents/search") {
            if target.contains("my.posts.uid") {
                if target.contains("second") {
                    return (
                        200,
                        format!(r#"{{"results": [{}]}}"#, post_json("second", "Second")),
                    );
                }
                return (200, r#"{"next_page": null, "results": []}"#.to_string());
            }
            return (
                200,
                format!(
                    r#"{{"next_page": "{}/cursor/2?ref=master-ref", "results": [{}, {}]}}"#,
                    base,
                    post_json("first", "First"),
                    post_json("second", "Second")
                ),
            );
        }
        (404, r#"{"message": "not found"}"#.to_string())
    }

    fn client_for(base: &str, cache: ResponseCache) -> PrismicClient {
        let mut config = SiteConfig::default();
        config.cms.endpoint = format!("{}/api/v2", base);
        PrismicClient::new(&config, cache).unwrap()
    }

    fn count(requests: &Arc<Mutex<Vec<String>>>, prefix: &str) -> usize {
        requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    #[test]
    fn missing_endpoint_is_an_error() {
        let result = PrismicClient::new(&SiteConfig::default(), ResponseCache::empty());
        assert!(matches!(result, Err(CmsError::MissingEndpoint)));
    }

    #[test]
    fn invalid_endpoint_is_an_error() {
        let mut config = SiteConfig::default();
        config.cms.endpoint = "not a url".into();
        let result = PrismicClient::new(&config, ResponseCache::empty());
        assert!(matches!(result, Err(CmsError::InvalidUrl(_))));
    }

    #[test]
    fn first_page_uses_master_ref_and_query() {
        let (base, requests) = serve(Arc::new(blog_handler));
        let client = client_for(&base, ResponseCache::empty());

        let page = client.first_page(2).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].uid.as_deref(), Some("first"));
        assert_eq!(
            page.next_page,
            Some(format!("{}/cursor/2?ref=master-ref", base))
        );

        let log = requests.lock().unwrap();
        let search = log
            .iter()
            .find(|r| r.starts_with("/api/v2/documents/search"))
            .unwrap();
        assert!(search.contains("ref=master-ref"));
        assert!(search.contains("pageSize=2"));
        assert!(search.contains("document.type"));
        assert!(search.contains("first_publication_date"));
    }

    #[test]
    fn next_page_follows_cursor_verbatim() {
        let (base, requests) = serve(Arc::new(blog_handler));
        let client = client_for(&base, ResponseCache::empty());

        let page = client
            .next_page(&format!("{}/cursor/2?ref=master-ref", base))
            .unwrap();
        assert_eq!(page.next_page, None);
        assert_eq!(page.results[0].data.title, "Third");
        assert!(
            requests
                .lock()
                .unwrap()
                .contains(&"/cursor/2?ref=master-ref".to_string())
        );
    }

    #[test]
    fn post_by_uid_found_and_missing() {
        let (base, _) = serve(Arc::new(blog_handler));
        let client = client_for(&base, ResponseCache::empty());

        let post = client.post_by_uid("second").unwrap().unwrap();
        assert_eq!(post.data.title, "Second");
        assert!(client.post_by_uid("nope").unwrap().is_none());
    }

    #[test]
    fn master_ref_is_requested_once() {
        let (base, requests) = serve(Arc::new(blog_handler));
        let client = client_for(&base, ResponseCache::empty());

        client.first_page(2).unwrap();
        client.post_by_uid("second").unwrap();
        assert_eq!(client.master_ref().unwrap(), "master-ref");
        assert_eq!(count(&requests, "/api/v2?"), 0);
        assert_eq!(
            requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.as_str() == "/api/v2")
                .count(),
            1
        );
    }

    #[test]
    fn http_errors_carry_status_and_url() {
        let (base, _) = serve(Arc::new(blog_handler));
        let client = client_for(&base, ResponseCache::empty());

        let err = client
            .next_page(&format!("{}/missing", base))
            .unwrap_err();
        match err {
            CmsError::Status { url, status } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fresh_cache_skips_search_requests() {
        let (base, requests) = serve(Arc::new(blog_handler));

        let client = client_for(&base, ResponseCache::empty());
        client.first_page(2).unwrap();
        assert_eq!(client.cache_stats().misses, 1);
        let cache = client.into_cache();
        assert_eq!(cache.len(), 1);

        let client = client_for(&base, cache);
        let page = client.first_page(2).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(client.cache_stats().hits, 1);
        assert_eq!(count(&requests, "/api/v2/documents/search"), 1);
    }

    #[test]
    fn access_token_is_sent_and_redacted() {
        let (base, requests) = serve(Arc::new(blog_handler));
        let mut config = SiteConfig::default();
        config.cms.endpoint = format!("{}/api/v2", base);
        config.cms.access_token = Some("s3cret".into());
        let client = PrismicClient::new(&config, ResponseCache::empty()).unwrap();

        client.first_page(2).unwrap();
        assert!(
            requests
                .lock()
                .unwrap()
                .iter()
                .all(|r| r.contains("access_token=s3cret"))
        );

        let err = client.next_page(&format!("{}/missing", base)).unwrap_err();
        let message = err.to_string();
        assert!(!message.contains("s3cret"));
        assert!(message.contains("access_token=***") || message.contains("access_token=%2A%2A%2A"));
    }

    #[test]
    fn no_master_ref_is_an_error() {
        let handler: Arc<Handler> = Arc::new(|_: &str, _: &str| (200, r#"{"refs": []}"#.to_string()));
        let (base, _) = serve(handler);
        let client = client_for(&base, ResponseCache::empty());
        assert!(matches!(client.first_page(2), Err(CmsError::NoMasterRef)));
    }

    #[test]
    fn redact_leaves_plain_urls_alone() {
        let url = Url::parse("https://x.io/api/v2?ref=abc").unwrap();
        assert_eq!(redact(&url), "https://x.io/api/v2?ref=abc");
    }
}
