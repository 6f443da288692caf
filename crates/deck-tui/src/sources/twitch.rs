//! Twitch Helix live directory.

use std::sync::Arc;

use deck_proto::protocol::SourceId;
use deck_proto::row::{format_columns, Reference, Row, RowKind};
use serde::Deserialize;

use super::{build_url, flex_width, FetchError, FetchRequest, HttpFetch, Source};

const HELIX: &str = "https://api.twitch.tv/helix";
const CHANNEL_URL: &str = "https://www.twitch.tv/";
const IDX_WIDTH: usize = 2;
const VIEWERS_WIDTH: usize = 6;
const CHANNEL_WIDTH: usize = 20;
const GAME_WIDTH: usize = 16;

#[derive(Debug, Deserialize)]
struct HelixPage {
    #[serde(default)]
    data: Vec<Stream>,
}

/// `streams` and `search/channels` entries, which name the same things
/// differently.
#[derive(Debug, Deserialize)]
struct Stream {
    #[serde(alias = "broadcaster_login")]
    user_login: String,
    #[serde(default, alias = "display_name")]
    user_name: String,
    #[serde(default)]
    game_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    viewer_count: Option<u64>,
}

pub struct Twitch {
    http: Arc<dyn HttpFetch>,
    client_id: String,
    access_token: String,
}

impl Twitch {
    pub fn new(http: Arc<dyn HttpFetch>, client_id: String, access_token: String) -> Self {
        Self {
            http,
            client_id,
            access_token,
        }
    }
}

impl Source for Twitch {
    fn id(&self) -> SourceId {
        SourceId::Twitch
    }

    fn title(&self, request: &FetchRequest<'_>) -> String {
        if request.query.is_empty() {
            "twitch: top streams".to_string()
        } else {
            format!("twitch: {}", request.query)
        }
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Row>, FetchError> {
        if self.client_id.is_empty() || self.access_token.is_empty() {
            return Err(FetchError::NotConfigured(
                "set twitch.client_id and twitch.access_token in config.toml".to_string(),
            ));
        }
        let url = if request.query.is_empty() {
            build_url(&format!("{HELIX}/streams"), &[("first", "50")])?
        } else {
            build_url(
                &format!("{HELIX}/search/channels"),
                &[
                    ("live_only", "true"),
                    ("first", "50"),
                    ("query", request.query),
                ],
            )?
        };
        let bearer = format!("Bearer {}", self.access_token);
        let body = self
            .http
            .get(
                &url,
                &[
                    ("Client-Id", self.client_id.as_str()),
                    ("Authorization", bearer.as_str()),
                ],
            )
            .map_err(FetchError::Http)?;
        let rows = parse_streams(&body, request.width)?;
        if rows.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(rows)
    }
}

fn parse_streams(body: &str, width: usize) -> Result<Vec<Row>, FetchError> {
    let page: HelixPage = serde_json::from_str(body)?;
    let title_width = flex_width(width, &[IDX_WIDTH, VIEWERS_WIDTH, CHANNEL_WIDTH, GAME_WIDTH]);

    let rows = page
        .data
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let idx = (i + 1).to_string();
            let viewers = s.viewer_count.map(|v| v.to_string()).unwrap_or_default();
            let name = if s.user_name.is_empty() {
                &s.user_login
            } else {
                &s.user_name
            };
            let display = format_columns(&[
                (&idx, IDX_WIDTH),
                (&viewers, VIEWERS_WIDTH),
                (name, CHANNEL_WIDTH),
                (&s.title, title_width),
                (&s.game_name, GAME_WIDTH),
            ]);
            let reference = Reference::new(format!("{CHANNEL_URL}{}", s.user_login));
            Row::new(display, Some(reference), RowKind::Playable)
        })
        .collect();
    Ok(rows)
}

/// Channel login from a stream reference.
pub fn channel_login(reference: &Reference) -> &str {
    let s = reference.as_str().trim_end_matches('/');
    s.rsplit('/').next().unwrap_or(s)
}

/// argv for the chat helper, or `None` when none is configured. `{channel}`
/// is substituted; without a placeholder the login is appended.
pub fn chat_argv(template: &[String], reference: &Reference) -> Option<Vec<String>> {
    if template.is_empty() {
        return None;
    }
    let login = channel_login(reference);
    let mut substituted = false;
    let mut argv: Vec<String> = template
        .iter()
        .map(|arg| {
            if arg.contains("{channel}") {
                substituted = true;
                arg.replace("{channel}", login)
            } else {
                arg.clone()
            }
        })
        .collect();
    if !substituted {
        argv.push(login.to_string());
    }
    Some(argv)
}
