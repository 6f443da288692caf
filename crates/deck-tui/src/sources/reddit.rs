//! Subreddit listings and in-subreddit search.

use std::sync::Arc;
use std::time::SystemTime;

use deck_proto::protocol::SourceId;
use deck_proto::row::{format_columns, Reference, Row, RowKind};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{build_url, flex_width, unescape_html, FetchError, FetchRequest, HttpFetch, Source};
use crate::cache::FeedCache;

const IDX_WIDTH: usize = 2;
const SCORE_WIDTH: usize = 5;
const DOMAIN_WIDTH: usize = 20;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    downs: i64,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(default)]
    oembed: Option<Oembed>,
}

#[derive(Debug, Deserialize)]
struct Oembed {
    #[serde(rename = "type", default)]
    kind: String,
}

pub struct Reddit {
    http: Arc<dyn HttpFetch>,
    cache: FeedCache,
    base_url: String,
    limit: u32,
    user_agent: String,
    now: Box<dyn Fn() -> SystemTime + Send>,
}

impl Reddit {
    pub fn new(http: Arc<dyn HttpFetch>, cache: FeedCache, limit: u32, user_agent: String) -> Self {
        Self {
            http,
            cache,
            base_url: "https://www.reddit.com".to_string(),
            limit,
            user_agent,
            now: Box::new(SystemTime::now),
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, now: impl Fn() -> SystemTime + Send + 'static) -> Self {
        self.now = Box::new(now);
        self
    }

    fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        self.http
            .get(url, &[("User-Agent", self.user_agent.as_str())])
            .map_err(FetchError::Http)
    }

    fn listing_url(&self, subreddit: &str) -> Result<String, FetchError> {
        let limit = self.limit.to_string();
        build_url(
            &format!("{}/r/{}.json", self.base_url, subreddit),
            &[("limit", limit.as_str())],
        )
    }

    fn search_url(&self, subreddit: &str, query: &str) -> Result<String, FetchError> {
        let limit = self.limit.to_string();
        build_url(
            &format!("{}/r/{}/search.json", self.base_url, subreddit),
            &[
                ("limit", limit.as_str()),
                ("q", query),
                ("restrict_sr", "on"),
            ],
        )
    }
}

impl Source for Reddit {
    fn id(&self) -> SourceId {
        SourceId::Reddit
    }

    fn title(&self, request: &FetchRequest<'_>) -> String {
        if request.query.is_empty() {
            format!("r/{}", request.key)
        } else {
            format!("r/{} search: {}", request.key, request.query)
        }
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Row>, FetchError> {
        let subreddit = request.key.trim();
        if subreddit.is_empty() {
            return Err(FetchError::NotConfigured("no subreddit given".to_string()));
        }

        // searches always go live and are never cached
        if !request.query.is_empty() {
            let body = self.get(&self.search_url(subreddit, request.query)?)?;
            return nonempty(parse_listing(&body, request.width)?);
        }

        if !request.force_refresh {
            if let Some(payload) = self.cache.load(subreddit, (self.now)()) {
                return nonempty(parse_listing(&payload, request.width)?);
            }
        }

        let body = self.get(&self.listing_url(subreddit)?)?;
        let rows = nonempty(parse_listing(&body, request.width)?)?;
        if let Err(e) = self.cache.store(subreddit, &body) {
            warn!("could not cache r/{}: {:#}", subreddit, e);
        }
        Ok(rows)
    }
}

fn nonempty(rows: Vec<Row>) -> Result<Vec<Row>, FetchError> {
    if rows.is_empty() {
        Err(FetchError::Empty)
    } else {
        Ok(rows)
    }
}

fn parse_listing(body: &str, width: usize) -> Result<Vec<Row>, FetchError> {
    let listing: Listing = serde_json::from_str(body)?;
    let title_width = flex_width(width, &[IDX_WIDTH, SCORE_WIDTH, DOMAIN_WIDTH]);

    let rows = listing
        .data
        .children
        .into_iter()
        .enumerate()
        .map(|(i, child)| {
            let post = child.data;
            let idx = (i + 1).to_string();
            let score = (post.ups - post.downs).to_string();
            let title = unescape_html(&post.title);
            let display = format_columns(&[
                (&idx, IDX_WIDTH),
                (&score, SCORE_WIDTH),
                (&title, title_width),
                (&post.domain, DOMAIN_WIDTH),
            ]);
            let is_video = post
                .media
                .as_ref()
                .and_then(|m| m.oembed.as_ref())
                .is_some_and(|o| o.kind == "video");
            if is_video && !post.url.is_empty() {
                Row::new(display, Some(Reference::new(post.url)), RowKind::Downloadable)
            } else {
                Row::new(display, None, RowKind::None)
            }
        })
        .collect();
    Ok(rows)
}
