//! YouTube Data API v3 video search.

use std::sync::Arc;

use chrono::DateTime;
use deck_proto::protocol::SourceId;
use deck_proto::row::{format_columns, Reference, Row, RowKind};
use serde::Deserialize;
use tracing::debug;

use super::{build_url, flex_width, unescape_html, FetchError, FetchRequest, HttpFetch, Source};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const IDX_WIDTH: usize = 2;
const CHANNEL_WIDTH: usize = 20;
const DATE_WIDTH: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: String,
}

pub struct Youtube {
    http: Arc<dyn HttpFetch>,
    api_key: String,
    max_results: u32,
}

impl Youtube {
    pub fn new(http: Arc<dyn HttpFetch>, api_key: String, max_results: u32) -> Self {
        Self {
            http,
            api_key,
            max_results,
        }
    }
}

impl Source for Youtube {
    fn id(&self) -> SourceId {
        SourceId::Youtube
    }

    fn title(&self, request: &FetchRequest<'_>) -> String {
        if request.query.is_empty() {
            "youtube".to_string()
        } else {
            format!("youtube: {}", request.query)
        }
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Row>, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::NotConfigured(
                "set youtube.api_key in config.toml".to_string(),
            ));
        }
        let max = self.max_results.to_string();
        let url = build_url(
            SEARCH_URL,
            &[
                ("key", self.api_key.as_str()),
                ("type", "video"),
                ("part", "snippet"),
                ("maxResults", max.as_str()),
                ("q", request.query),
            ],
        )?;
        debug!("youtube search {:?}", request.query);
        let body = self.http.get(&url, &[]).map_err(FetchError::Http)?;
        let rows = parse_search(&body, request.width)?;
        if rows.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(rows)
    }
}

fn parse_search(body: &str, width: usize) -> Result<Vec<Row>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let title_width = flex_width(width, &[IDX_WIDTH, CHANNEL_WIDTH, DATE_WIDTH]);

    let rows = response
        .items
        .into_iter()
        .filter_map(|item| Some((item.id.video_id?, item.snippet)))
        .enumerate()
        .map(|(i, (video_id, snippet))| {
            let idx = (i + 1).to_string();
            let title = unescape_html(&snippet.title);
            let date = DateTime::parse_from_rfc3339(&snippet.published_at)
                .map(|d| d.format("%m-%d-%Y").to_string())
                .unwrap_or_default();
            let display = format_columns(&[
                (&idx, IDX_WIDTH),
                (&title, title_width),
                (&snippet.channel_title, CHANNEL_WIDTH),
                (&date, DATE_WIDTH),
            ]);
            let url = format!("https://www.youtube.com/watch?v={video_id}");
            Row::new(display, Some(Reference::new(url)), RowKind::Downloadable)
        })
        .collect();
    Ok(rows)
}
