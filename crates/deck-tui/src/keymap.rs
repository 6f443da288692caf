//! Key bindings: terminal key events to `Command` tokens.

use deck_proto::protocol::{Command, PromptKind, SourceId};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub fn command_for(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }
    let cmd = match key.code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('r') => Command::Refresh,
        KeyCode::Char('l') => Command::ToggleFiles,
        KeyCode::Tab => Command::NextSource,
        KeyCode::Char('j') | KeyCode::Down => Command::Move { delta: 1 },
        KeyCode::Char('k') | KeyCode::Up => Command::Move { delta: -1 },
        KeyCode::PageDown => Command::Page { direction: 1 },
        KeyCode::PageUp => Command::Page { direction: -1 },
        KeyCode::Enter => Command::Submit,
        KeyCode::Char('a') => Command::PlayAll,
        KeyCode::Char('d') => Command::Delete,
        KeyCode::Backspace | KeyCode::Char('h') => Command::Parent,
        KeyCode::Char('s') => Command::OpenPrompt {
            kind: PromptKind::Subreddit,
        },
        KeyCode::Char('/') => Command::OpenPrompt {
            kind: PromptKind::FeedSearch,
        },
        KeyCode::Char('y') => Command::OpenPrompt {
            kind: PromptKind::VideoSearch,
        },
        KeyCode::Char('t') => Command::OpenPrompt {
            kind: PromptKind::LiveSearch,
        },
        _ => return None,
    };
    Some(cmd)
}

/// Top line, per source.
pub fn help_line(source: SourceId) -> &'static str {
    match source {
        SourceId::Reddit => {
            "q:quit r:refresh s:subreddit /:search y:youtube t:twitch l:files tab:next j/k:move enter:download"
        }
        SourceId::Youtube => {
            "q:quit r:refresh y:search s:subreddit t:twitch l:files tab:next j/k:move enter:download"
        }
        SourceId::Twitch => {
            "q:quit r:refresh t:search s:subreddit y:youtube l:files tab:next j/k:move enter:watch"
        }
        SourceId::Files => {
            "q:quit r:refresh l:results a:playall d:delete h:up tab:next j/k:move enter:play"
        }
    }
}
