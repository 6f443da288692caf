//! Result source adapters.
//!
//! Each content provider turns its upstream response into `Row`s through the
//! same `Source` trait. Errors stay typed here and are turned into status
//! text by the caller; they never escape the UI loop.

pub mod local;
pub mod reddit;
pub mod twitch;
pub mod youtube;

use std::path::PathBuf;

use anyhow::Context;
use deck_proto::protocol::SourceId;
use deck_proto::row::Row;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0:#}")]
    Http(anyhow::Error),
    #[error("unexpected response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("no results")]
    Empty,
    #[error("{0}")]
    NotConfigured(String),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One fetch: which key (subreddit, directory), an optional free-text query,
/// whether caches should be bypassed and how wide rows should be laid out.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub key: &'a str,
    pub query: &'a str,
    pub force_refresh: bool,
    pub width: usize,
}

impl<'a> FetchRequest<'a> {
    pub fn new(key: &'a str, width: usize) -> Self {
        Self {
            key,
            query: "",
            force_refresh: false,
            width,
        }
    }

    pub fn query(mut self, query: &'a str) -> Self {
        self.query = query;
        self
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }
}

pub trait Source {
    fn id(&self) -> SourceId;
    /// Heading for the help line, e.g. "r/videos".
    fn title(&self, request: &FetchRequest<'_>) -> String;
    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Row>, FetchError>;
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

/// Blocking GET returning the response body. The adapters only see this.
pub trait HttpFetch: Send + Sync {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> anyhow::Result<String>;
}

/// reqwest client driven from the (synchronous) UI thread through the
/// runtime handle that also hosts the remote listener.
pub struct ReqwestFetch {
    client: reqwest::Client,
    handle: tokio::runtime::Handle,
}

impl ReqwestFetch {
    pub fn new(handle: tokio::runtime::Handle, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, handle })
    }
}

impl HttpFetch for ReqwestFetch {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> anyhow::Result<String> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.handle.block_on(async move {
            let response = request
                .send()
                .await
                .context("sending request")?
                .error_for_status()
                .context("server returned an error")?;
            response.text().await.context("reading response body")
        })
    }
}

/// Build `base?k=v&...` with proper escaping.
pub(crate) fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
    reqwest::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| FetchError::Http(anyhow::Error::new(e).context(format!("bad url {base}"))))
}

/// Decode the handful of HTML entities feeds put into titles.
pub(crate) fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => {
                    let code = if let Some(hex) = entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        entity.strip_prefix('#').and_then(|d| d.parse().ok())
                    };
                    code.and_then(char::from_u32)
                }
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Width left for the stretch column once the fixed ones and their
/// separators are taken.
pub(crate) fn flex_width(total: usize, fixed: &[usize]) -> usize {
    let used: usize = fixed.iter().map(|w| w + 1).sum();
    total.saturating_sub(used).max(10)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::HttpFetch;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Canned HTTP responses, recorded URLs.
    #[derive(Default)]
    pub struct FakeHttp {
        pub responses: Mutex<VecDeque<anyhow::Result<String>>>,
        pub urls: Mutex<Vec<String>>,
        pub headers: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl FakeHttp {
        pub fn with(responses: Vec<anyhow::Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.urls.lock().unwrap().len()
        }
    }

    impl HttpFetch for FakeHttp {
        fn get(&self, url: &str, headers: &[(&str, &str)]) -> anyhow::Result<String> {
            self.urls.lock().unwrap().push(url.to_string());
            self.headers.lock().unwrap().push(
                headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no canned response")))
        }
    }
}
