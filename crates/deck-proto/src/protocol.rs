use serde::{Deserialize, Serialize};

/// One of the content providers the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Reddit,
    Youtube,
    Twitch,
    Files,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Reddit,
        SourceId::Youtube,
        SourceId::Twitch,
        SourceId::Files,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Reddit => 0,
            Self::Youtube => 1,
            Self::Twitch => 2,
            Self::Files => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Reddit => "reddit",
            Self::Youtube => "youtube",
            Self::Twitch => "twitch",
            Self::Files => "files",
        }
    }

    /// Accepts the label plus a few short aliases used by the remote page.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "reddit" | "feed" | "r" => Some(Self::Reddit),
            "youtube" | "yt" | "y" => Some(Self::Youtube),
            "twitch" | "live" | "t" => Some(Self::Twitch),
            "files" | "downloads" | "local" | "l" => Some(Self::Files),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Network sources stay warm: switching to them never refetches once loaded.
    pub fn is_remote(self) -> bool {
        !matches!(self, Self::Files)
    }
}

/// Which free-text prompt is open on the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptKind {
    Subreddit,
    FeedSearch,
    VideoSearch,
    LiveSearch,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Subreddit => "subreddit: ",
            Self::FeedSearch => "search: ",
            Self::VideoSearch => "youtube: ",
            Self::LiveSearch => "twitch: ",
        }
    }
}

/// Command tokens consumed by the UI loop. The keyboard and the remote
/// listener both produce these, so a remote request and a keypress go
/// through the same dispatch path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Move the cursor by `delta` rows (negative = up).
    Move { delta: i32 },
    /// Move by a page; `direction` is +1 or -1.
    Page { direction: i32 },
    /// Act on the selection: download, play, or enter a directory.
    Submit,
    /// Play every playable row from the selection onward.
    PlayAll,
    /// Delete the selected local file.
    Delete,
    /// Leave the current directory of the local-file source.
    Parent,
    /// Reload the active source (feeds bypass their cache).
    Refresh,
    SwitchSource { source: SourceId },
    /// Flip between the local files and the last remote source.
    ToggleFiles,
    NextSource,
    OpenPrompt { kind: PromptKind },
    /// Load a source with the given free-text argument.
    Load { kind: PromptKind, text: String },
    /// Enqueue a download by reference without touching the cursor.
    SubmitUrl { url: String },
    Quit,
}

impl Command {
    /// Translate a remote `command=` request into a token.
    ///
    /// `arg` carries the `name=` (source switch) or `url=` (download)
    /// parameter; unknown commands map to `None`.
    pub fn from_remote(command: &str, arg: Option<&str>) -> Option<Self> {
        match command {
            "up" => Some(Self::Move { delta: -1 }),
            "down" => Some(Self::Move { delta: 1 }),
            "pageup" => Some(Self::Page { direction: -1 }),
            "pagedown" => Some(Self::Page { direction: 1 }),
            "enter" => Some(Self::Submit),
            "refresh" => Some(Self::Refresh),
            "source" | "switch-source" => {
                let source = SourceId::parse(arg?)?;
                Some(Self::SwitchSource { source })
            }
            "url" | "submit-url" => {
                let url = arg?.trim();
                if url.is_empty() {
                    return None;
                }
                Some(Self::SubmitUrl {
                    url: url.to_string(),
                })
            }
            _ => None,
        }
    }
}
