//! App: the single-threaded UI event loop.
//!
//! Architecture:
//! - Keyboard events and remote requests both become `Command` tokens and go
//!   through `dispatch`; remote ones arrive through the shared inbox.
//! - The loop polls the terminal with a short timeout so changes made by the
//!   download worker or the listener show up without a keypress.
//! - Only this thread draws. Everyone else sets `needs_redraw`.
//! - Source fetches and foreground players block the loop while they run.

use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};

use deck_proto::config::{CommandsConfig, Config};
use deck_proto::protocol::{Command, PromptKind, SourceId};
use deck_proto::row::{Reference, Row, RowKind};
use deck_proto::state::{DeckState, SharedState};

use crate::cache::FeedCache;
use crate::keymap;
use crate::process::{CommandSpec, Launcher};
use crate::prompt::{Prompt, PromptAction};
use crate::sources::{
    local::LocalFiles, reddit::Reddit, twitch, twitch::Twitch, youtube::Youtube, FetchRequest,
    HttpFetch, Source,
};
use crate::supervisor::{PlaylistOutcome, Supervisor, SupervisorState, TerminalSurface};
use crate::ui;

const POLL_TIMEOUT: Duration = Duration::from_millis(100);
/// How long Esc is listened for between playlist items.
const CANCEL_WINDOW: Duration = Duration::from_secs(1);

/// A terminal surface the loop can also paint on.
pub trait Screen: TerminalSurface {
    fn draw(&mut self, state: &DeckState, prompt: &Prompt) -> anyhow::Result<()>;
}

// ── Real terminal ─────────────────────────────────────────────────────────────

pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui {
    pub fn enter() -> anyhow::Result<Self> {
        debug!("enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        debug!("terminal created, size={:?}", terminal.size());
        Ok(Self { terminal })
    }

    pub fn leave(mut self) -> anyhow::Result<()> {
        // swallow keys typed during shutdown so they don't reach the shell
        while event::poll(Duration::ZERO)? {
            event::read()?;
        }
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn size(&self) -> anyhow::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }
}

impl TerminalSurface for Tui {
    fn suspend(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        self.terminal.clear()?;
        Ok(())
    }

    fn cancel_requested(&mut self) -> bool {
        let deadline = Instant::now() + CANCEL_WINDOW;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match event::poll(remaining) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key))
                        if key.kind == KeyEventKind::Press && key.code == KeyCode::Esc =>
                    {
                        return true
                    }
                    Ok(_) => continue,
                    Err(_) => return false,
                },
                _ => return false,
            }
        }
    }
}

impl Screen for Tui {
    fn draw(&mut self, state: &DeckState, prompt: &Prompt) -> anyhow::Result<()> {
        self.terminal.draw(|f| ui::draw(f, state, prompt))?;
        Ok(())
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    shared: SharedState,
    supervisor: Supervisor,
    reddit: Reddit,
    youtube: Youtube,
    twitch: Twitch,
    local: LocalFiles,
    prompt: Prompt,
    commands: CommandsConfig,
    chat_command: Vec<String>,
    subreddit: String,
    feed_query: String,
    video_query: String,
    live_query: String,
    /// Terminal columns, for row layout.
    width: usize,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        shared: SharedState,
        launcher: Arc<dyn Launcher>,
        http: Arc<dyn HttpFetch>,
    ) -> Self {
        let cache = FeedCache::new(&config.paths.cache_dir, config.feed.cache_ttl());
        Self {
            supervisor: Supervisor::new(launcher, shared.clone()),
            reddit: Reddit::new(
                http.clone(),
                cache,
                config.feed.limit,
                config.feed.user_agent.clone(),
            ),
            youtube: Youtube::new(
                http.clone(),
                config.youtube.api_key.clone(),
                config.youtube.max_results,
            ),
            twitch: Twitch::new(
                http,
                config.twitch.client_id.clone(),
                config.twitch.access_token.clone(),
            ),
            local: LocalFiles::new(&config.paths.files_dir),
            prompt: Prompt::new(),
            commands: config.commands.clone(),
            chat_command: config.twitch.chat_command.clone(),
            subreddit: config.feed.default_subreddit.clone(),
            feed_query: String::new(),
            video_query: String::new(),
            live_query: String::new(),
            width: 80,
            should_quit: false,
            shared,
        }
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        let mut tui = Tui::enter()?;
        let result = self.event_loop(&mut tui);
        // restore the terminal even when the loop failed
        tui.leave()?;
        result
    }

    fn event_loop(&mut self, tui: &mut Tui) -> anyhow::Result<()> {
        let (width, height) = tui.size()?;
        self.on_resize(width, height);
        let start = self.shared.lock().active;
        self.switch(tui, start);

        loop {
            self.tick(tui);
            if self.should_quit || self.shared.is_shutting_down() {
                break;
            }

            if self.shared.take_redraw() {
                let state = self.shared.lock();
                tui.draw(&state, &self.prompt)?;
            }

            if event::poll(POLL_TIMEOUT)? {
                let ev = event::read()?;
                self.handle_event(tui, ev);
            }
        }
        info!("ui loop finished");
        Ok(())
    }

    /// Work that doesn't come from the keyboard: injected remote commands
    /// and file-list refreshes requested by the download worker.
    pub fn tick(&mut self, screen: &mut dyn Screen) {
        while let Some(cmd) = self.shared.next_command() {
            self.dispatch(screen, cmd);
            if self.should_quit {
                return;
            }
        }

        let refresh = {
            let mut state = self.shared.lock();
            std::mem::take(&mut state.refresh_files) && state.source(SourceId::Files).loaded
        };
        if refresh && self.supervisor.state() == SupervisorState::Idle {
            self.load(screen, SourceId::Files, true, false);
        }
    }

    pub fn handle_event(&mut self, screen: &mut dyn Screen, event: Event) {
        match event {
            Event::Key(key) if self.prompt.is_open() => {
                if key.kind != KeyEventKind::Press {
                    return;
                }
                match self.prompt.handle_key(key) {
                    PromptAction::Submitted(kind, text) => {
                        self.dispatch(screen, Command::Load { kind, text })
                    }
                    PromptAction::Cancelled | PromptAction::Editing => {
                        self.shared.request_redraw()
                    }
                }
            }
            Event::Key(key) => {
                if let Some(cmd) = keymap::command_for(key) {
                    self.dispatch(screen, cmd);
                }
            }
            Event::Resize(width, height) => self.on_resize(width, height),
            _ => {}
        }
    }

    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.width = width as usize;
        self.shared.lock().resize(ui::list_height(height));
    }

    pub fn dispatch(&mut self, screen: &mut dyn Screen, cmd: Command) {
        debug!("dispatch {:?}", cmd);
        match cmd {
            Command::Move { delta } => {
                let mut state = self.shared.lock();
                let height = state.visible_height;
                state.active_source_mut().move_cursor(delta as isize, height);
                state.needs_redraw = true;
            }
            Command::Page { direction } => {
                let mut state = self.shared.lock();
                let height = state.visible_height;
                state
                    .active_source_mut()
                    .page_move(direction as isize, height);
                state.needs_redraw = true;
            }
            Command::Submit => self.submit(screen),
            Command::PlayAll => self.play_all(screen),
            Command::Delete => self.delete(),
            Command::Parent => {
                let on_files = self.shared.lock().active == SourceId::Files;
                if on_files && self.local.parent() {
                    self.load(screen, SourceId::Files, false, false);
                }
            }
            Command::Refresh => {
                let active = self.shared.lock().active;
                self.load(screen, active, false, true);
            }
            Command::SwitchSource { source } => self.switch(screen, source),
            Command::ToggleFiles => {
                let (active, back) = {
                    let state = self.shared.lock();
                    (state.active, state.last_remote)
                };
                let target = if active == SourceId::Files {
                    back
                } else {
                    SourceId::Files
                };
                self.switch(screen, target);
            }
            Command::NextSource => {
                let next = self.shared.lock().active.next();
                self.switch(screen, next);
            }
            Command::OpenPrompt { kind } => {
                self.prompt.open(kind);
                self.shared.request_redraw();
            }
            Command::Load { kind, text } => {
                let target = match kind {
                    PromptKind::Subreddit => {
                        self.subreddit = text;
                        self.feed_query.clear();
                        SourceId::Reddit
                    }
                    PromptKind::FeedSearch => {
                        self.feed_query = text;
                        SourceId::Reddit
                    }
                    PromptKind::VideoSearch => {
                        self.video_query = text;
                        SourceId::Youtube
                    }
                    PromptKind::LiveSearch => {
                        self.live_query = text;
                        SourceId::Twitch
                    }
                };
                self.shared.lock().activate(target);
                self.load(screen, target, false, false);
            }
            Command::SubmitUrl { url } => {
                self.shared.enqueue(Reference::new(url));
            }
            Command::Quit => {
                info!("quit requested");
                self.should_quit = true;
            }
        }
    }

    // ── Sources ───────────────────────────────────────────────────────────────

    fn switch(&mut self, screen: &mut dyn Screen, id: SourceId) {
        let cold = self.shared.lock().activate(id);
        if id == SourceId::Files {
            // the file list is cheap; re-read it on every visit
            self.load(screen, id, true, false);
        } else if cold {
            self.load(screen, id, false, false);
        }
    }

    fn source_mut(&mut self, id: SourceId) -> &mut dyn Source {
        match id {
            SourceId::Reddit => &mut self.reddit,
            SourceId::Youtube => &mut self.youtube,
            SourceId::Twitch => &mut self.twitch,
            SourceId::Files => &mut self.local,
        }
    }

    fn params(&self, id: SourceId) -> (String, String) {
        match id {
            SourceId::Reddit => (self.subreddit.clone(), self.feed_query.clone()),
            SourceId::Youtube => (String::new(), self.video_query.clone()),
            SourceId::Twitch => (String::new(), self.live_query.clone()),
            SourceId::Files => (String::new(), String::new()),
        }
    }

    /// Fetch `id` and swap its rows in. Failures keep the old rows and only
    /// change the status line.
    fn load(&mut self, screen: &mut dyn Screen, id: SourceId, preserve: bool, force: bool) {
        let (key, query) = self.params(id);
        let request = FetchRequest::new(&key, self.width)
            .query(&query)
            .forced(force);
        let source = self.source_mut(id);
        let title = source.title(&request);

        if source.id().is_remote() {
            self.shared
                .lock()
                .set_source_status(id, format!("loading {title}..."));
            self.redraw(screen);
        }

        let result = self.source_mut(id).fetch(&request);
        let mut state = self.shared.lock();
        match result {
            Ok(rows) => {
                let count = rows.len();
                let height = state.visible_height;
                let source = state.source_mut(id);
                source.replace_rows(rows, preserve, height);
                source.title = title.clone();
                info!("loaded {} rows for {}", count, title);
                if preserve {
                    state.needs_redraw = true;
                } else {
                    state.set_source_status(id, format!("{title}: {count} items"));
                }
            }
            Err(e) => {
                warn!("fetch failed for {}: {}", title, e);
                state.set_source_status(id, format!("{title}: {e}"));
            }
        }
    }

    fn redraw(&self, screen: &mut dyn Screen) {
        let state = self.shared.lock();
        if let Err(e) = screen.draw(&state, &self.prompt) {
            warn!("draw failed: {:#}", e);
        }
    }

    fn selection(&self) -> Option<(SourceId, usize, Row)> {
        let state = self.shared.lock();
        let source = state.active_source();
        let index = source.selected_index()?;
        Some((state.active, index, source.rows[index].clone()))
    }

    // ── Actions on the selection ─────────────────────────────────────────────

    fn submit(&mut self, screen: &mut dyn Screen) {
        let Some((id, _, row)) = self.selection() else {
            return;
        };
        let Some(reference) = row.item_ref.clone() else {
            self.shared.set_status("not playable");
            return;
        };
        match row.kind {
            RowKind::Downloadable => {
                self.shared.enqueue(reference);
            }
            RowKind::Playable if id == SourceId::Twitch => self.watch_stream(screen, &reference),
            RowKind::Playable => self.play_file(screen, &reference),
            RowKind::Directory => {
                if self.local.enter(&reference) {
                    self.load(screen, SourceId::Files, false, false);
                }
            }
            RowKind::None => self.shared.set_status("not playable"),
        }
    }

    fn play_file(&mut self, screen: &mut dyn Screen, reference: &Reference) {
        let name = display_name(reference);
        let spec = match CommandSpec::from_argv(&self.commands.player, [reference.as_str()]) {
            Ok(spec) => spec.in_dir(self.local.current_dir()),
            Err(e) => {
                self.shared.set_status(format!("playback failed: {e}"));
                return;
            }
        };
        self.shared.set_status(format!("playing {name}"));
        let status = match self.supervisor.run_foreground(screen, &spec, reference) {
            Ok(exit) if exit.success() => format!("finished {name}"),
            Ok(exit) => format!("playback failed: {} exited with {}", spec.program, exit),
            Err(e) => format!("playback failed: {e}"),
        };
        self.foreground_done(status);
    }

    fn watch_stream(&mut self, screen: &mut dyn Screen, reference: &Reference) {
        let channel = twitch::channel_login(reference).to_string();

        if let Some(argv) = twitch::chat_argv(&self.chat_command, reference) {
            match CommandSpec::from_argv(&argv, Vec::<String>::new()) {
                Ok(spec) => {
                    let shared = self.shared.clone();
                    let prompt = &self.prompt;
                    let result = self.supervisor.run_streaming(&spec, reference, |line| {
                        let mut state = shared.lock();
                        state.set_status(line);
                        if let Err(e) = screen.draw(&state, prompt) {
                            debug!("draw failed while relaying: {:#}", e);
                        }
                    });
                    match result {
                        Ok(exit) if !exit.success() => {
                            warn!("chat helper for {} exited with {}", channel, exit)
                        }
                        Ok(_) => {}
                        Err(e) => warn!("chat helper for {} failed: {}", channel, e),
                    }
                }
                Err(e) => warn!("chat helper not started: {}", e),
            }
        }

        let spec = match CommandSpec::from_argv(&self.commands.stream_player, [reference.as_str()])
        {
            Ok(spec) => spec,
            Err(e) => {
                self.shared.set_status(format!("stream failed: {e}"));
                return;
            }
        };
        self.shared.set_status(format!("watching {channel}"));
        let status = match self.supervisor.run_foreground(screen, &spec, reference) {
            Ok(exit) if exit.success() => format!("stream ended: {channel}"),
            Ok(exit) => format!("stream failed: {} exited with {}", spec.program, exit),
            Err(e) => format!("stream failed: {e}"),
        };
        self.foreground_done(status);
    }

    fn play_all(&mut self, screen: &mut dyn Screen) {
        let references: Vec<Reference> = {
            let state = self.shared.lock();
            if state.active != SourceId::Files {
                drop(state);
                self.shared.set_status("play-all works on local files");
                return;
            }
            let source = state.active_source();
            let Some(start) = source.selected_index() else {
                return;
            };
            let playable: Vec<Reference> = source.rows[start..]
                .iter()
                .filter(|row| row.kind == RowKind::Playable)
                .filter_map(|row| row.item_ref.clone())
                .collect();
            playable
        };
        if references.is_empty() {
            self.shared.set_status("nothing to play");
            return;
        }

        let mut items = Vec::with_capacity(references.len());
        for reference in references {
            match CommandSpec::from_argv(&self.commands.player, [reference.as_str()]) {
                Ok(spec) => items.push((spec, reference)),
                Err(e) => {
                    self.shared.set_status(format!("playback failed: {e}"));
                    return;
                }
            }
        }

        let shared = self.shared.clone();
        let total = items.len();
        let outcome = self.supervisor.play_all(screen, &items, |reference| {
            shared.set_status(format!("playing {}", display_name(reference)))
        });
        let status = match outcome {
            PlaylistOutcome::Finished { played } => format!("played {played} of {total}"),
            PlaylistOutcome::Cancelled { played } => {
                format!("cancelled playlist after {played} of {total}")
            }
            PlaylistOutcome::Aborted { played, reason } => {
                format!("playlist stopped after {played} of {total}: {reason}")
            }
        };
        self.foreground_done(status);
    }

    /// The loop was blocked on a player. Remote commands that piled up in
    /// the meantime are dropped, and the file list is re-read since
    /// downloads finishing meanwhile didn't ask for it.
    fn foreground_done(&self, status: String) {
        let stale = self.shared.drain_inbox();
        if !stale.is_empty() {
            info!("dropped {} remote command(s) received during playback", stale.len());
        }
        let mut state = self.shared.lock();
        state.set_status(status);
        state.refresh_files = true;
    }

    fn delete(&mut self) {
        let Some((id, index, row)) = self.selection() else {
            return;
        };
        if id != SourceId::Files || row.kind != RowKind::Playable {
            self.shared.set_status("only files can be deleted");
            return;
        }
        let Some(reference) = row.item_ref else {
            return;
        };
        if let Err(e) = self.local.delete(&reference) {
            self.shared.set_status(format!("delete failed: {e}"));
            return;
        }

        let listing = self.local.fetch(&FetchRequest::new("", self.width));
        let mut state = self.shared.lock();
        match listing {
            Ok(rows) => {
                let height = state.visible_height;
                state
                    .source_mut(SourceId::Files)
                    .replace_after_delete(rows, index, height);
                state.set_status(format!("deleted {}", display_name(&reference)));
            }
            Err(e) => state.set_status(format!("deleted, but listing failed: {e}")),
        }
    }

    #[cfg(test)]
    fn should_quit(&self) -> bool {
        self.should_quit
    }
}

fn display_name(reference: &Reference) -> String {
    Path::new(reference.as_str())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeLauncher;
    use crate::process::ProcessExit;
    use crate::sources::testing::FakeHttp;
    use ratatui::crossterm::event::{KeyEvent, KeyModifiers};
    use std::fs;

    #[derive(Default)]
    struct NullScreen {
        draws: usize,
        cancel: bool,
    }

    impl TerminalSurface for NullScreen {
        fn suspend(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn resume(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn cancel_requested(&mut self) -> bool {
            self.cancel
        }
    }

    impl Screen for NullScreen {
        fn draw(&mut self, _state: &DeckState, _prompt: &Prompt) -> anyhow::Result<()> {
            self.draws += 1;
            Ok(())
        }
    }

    const LISTING: &str = r#"{"data": {"children": [
        {"data": {"title": "video one", "url": "https://v.example/1", "ups": 5, "downs": 0,
                  "domain": "v.example", "media": {"oembed": {"type": "video"}}}},
        {"data": {"title": "self post", "url": "https://www.reddit.com/x", "ups": 1, "downs": 0,
                  "domain": "self.videos", "media": null}}
    ]}}"#;

    struct Harness {
        app: App,
        shared: SharedState,
        launcher: Arc<FakeLauncher>,
        http: Arc<FakeHttp>,
        screen: NullScreen,
        files: std::path::PathBuf,
        _dir: tempfile::TempDir,
    }

    fn harness(responses: Vec<anyhow::Result<String>>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.cache_dir = dir.path().join("cache");
        config.paths.files_dir = dir.path().join("files");
        config.commands.player = vec!["mpv".to_string()];
        config.commands.stream_player = vec!["streamlink".to_string()];
        config.twitch.chat_command = vec!["chat".to_string(), "{channel}".to_string()];
        config.twitch.client_id = "cid".to_string();
        config.twitch.access_token = "tok".to_string();
        fs::create_dir_all(&config.paths.files_dir).unwrap();

        let shared = SharedState::new();
        let launcher = FakeLauncher::new();
        let http = Arc::new(FakeHttp::with(responses));
        let mut app = App::new(&config, shared.clone(), launcher.clone(), http.clone());
        app.on_resize(80, 13);
        Harness {
            app,
            shared,
            launcher,
            http,
            screen: NullScreen::default(),
            files: config.paths.files_dir.clone(),
            _dir: dir,
        }
    }

    impl Harness {
        fn send(&mut self, cmd: Command) {
            self.app.dispatch(&mut self.screen, cmd);
        }

        fn selected(&self) -> Option<usize> {
            self.shared.lock().active_source().selected_index()
        }

        fn status(&self) -> String {
            self.shared.lock().status.clone()
        }
    }

    fn write_files(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), name.as_bytes()).unwrap();
            std::thread::sleep(Duration::from_millis(15));
        }
    }

    #[test]
    fn test_start_loads_feed_and_enter_enqueues_video() {
        let mut h = harness(vec![Ok(LISTING.to_string())]);
        h.send(Command::SwitchSource {
            source: SourceId::Reddit,
        });
        assert_eq!(h.shared.lock().active_source().rows.len(), 2);
        assert!(h.status().contains("r/videos: 2 items"));
        assert!(h.screen.draws >= 1, "loading notice is painted before the fetch");

        h.send(Command::Submit);
        assert_eq!(h.shared.queue_depth(), 1);
        assert_eq!(
            h.shared.lock().queue[0].reference.as_str(),
            "https://v.example/1"
        );

        h.send(Command::Move { delta: 1 });
        h.send(Command::Submit);
        assert_eq!(h.status(), "not playable");
        assert_eq!(h.shared.queue_depth(), 1);
    }

    #[test]
    fn test_network_sources_stay_warm() {
        let mut h = harness(vec![Ok(LISTING.to_string())]);
        h.send(Command::SwitchSource {
            source: SourceId::Reddit,
        });
        h.send(Command::Move { delta: 1 });
        h.send(Command::ToggleFiles);
        h.send(Command::ToggleFiles);

        assert_eq!(h.http.calls(), 1);
        assert_eq!(h.shared.lock().active, SourceId::Reddit);
        assert_eq!(h.selected(), Some(1));
    }

    #[test]
    fn test_failed_fetch_keeps_rows() {
        let mut h = harness(vec![
            Ok(LISTING.to_string()),
            Err(anyhow::anyhow!("offline")),
        ]);
        h.send(Command::SwitchSource {
            source: SourceId::Reddit,
        });
        h.send(Command::Refresh);
        assert_eq!(h.shared.lock().active_source().rows.len(), 2);
        assert!(h.status().contains("offline"));
    }

    #[test]
    fn test_subreddit_prompt_loads_new_feed() {
        let mut h = harness(vec![Ok(LISTING.to_string()), Ok(LISTING.to_string())]);
        h.send(Command::SwitchSource {
            source: SourceId::Reddit,
        });
        h.send(Command::Move { delta: 1 });

        h.send(Command::OpenPrompt {
            kind: PromptKind::Subreddit,
        });
        for c in "aww".chars() {
            h.app.handle_event(
                &mut h.screen,
                Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)),
            );
        }
        h.app.handle_event(
            &mut h.screen,
            Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
        );

        assert!(h.http.urls.lock().unwrap()[1].contains("/r/aww.json"));
        assert_eq!(h.selected(), Some(0), "a new listing starts at the top");
        assert_eq!(h.shared.lock().active_source().title, "r/aww");
    }

    #[test]
    fn test_remote_commands_go_through_inbox() {
        let mut h = harness(vec![Ok(LISTING.to_string())]);
        h.send(Command::SwitchSource {
            source: SourceId::Reddit,
        });
        h.shared.inject(Command::Move { delta: 1 });
        h.shared.inject(Command::Quit);
        h.app.tick(&mut h.screen);
        assert_eq!(h.selected(), Some(1));
        assert!(h.app.should_quit());
    }

    #[test]
    fn test_remote_commands_queued_behind_player_are_dropped() {
        let mut h = harness(vec![]);
        write_files(&h.files, &["a.mp4", "b.mp4"]);
        h.send(Command::SwitchSource {
            source: SourceId::Files,
        });
        h.shared.inject(Command::Submit);
        h.shared.inject(Command::Submit);
        h.shared.inject(Command::Move { delta: 1 });
        h.app.tick(&mut h.screen);

        assert_eq!(h.launcher.programs().len(), 1);
        assert!(h.shared.lock().inbox.is_empty());
        assert_eq!(h.selected(), Some(0));
        assert_eq!(h.status(), "finished a.mp4");
    }

    #[test]
    fn test_play_file_and_refresh_after() {
        let mut h = harness(vec![]);
        write_files(&h.files, &["a.mp4", "b.mp4"]);
        h.send(Command::SwitchSource {
            source: SourceId::Files,
        });
        h.send(Command::Move { delta: 1 });
        h.send(Command::Submit);

        let played = h.launcher.spawned.lock().unwrap()[0].clone();
        assert_eq!(played.program, "mpv");
        assert!(played.args[0].ends_with("b.mp4"));
        assert_eq!(h.status(), "finished b.mp4");
        assert!(!h.shared.is_foreground_active());

        // a download landed while the player had the terminal
        write_files(&h.files, &["c.mp4"]);
        h.app.tick(&mut h.screen);
        assert_eq!(h.shared.lock().active_source().rows.len(), 3);
        assert_eq!(h.selected(), Some(1), "refresh keeps the cursor");
    }

    #[test]
    fn test_play_all_from_selection_stops_on_failure() {
        let mut h = harness(vec![]);
        write_files(&h.files, &["1.mp4", "2.mp4", "3.mp4", "4.mp4"]);
        h.launcher
            .wait_exits
            .lock()
            .unwrap()
            .extend([ProcessExit::Success, ProcessExit::Code(1)]);
        h.send(Command::SwitchSource {
            source: SourceId::Files,
        });
        h.send(Command::Move { delta: 1 });
        h.send(Command::PlayAll);

        let programs = h.launcher.programs();
        assert_eq!(programs.len(), 2);
        assert!(programs[0].ends_with("2.mp4"));
        assert!(programs[1].ends_with("3.mp4"));
        assert!(h.status().starts_with("playlist stopped after 1 of 3"));
    }

    #[test]
    fn test_play_all_cancel() {
        let mut h = harness(vec![]);
        write_files(&h.files, &["1.mp4", "2.mp4"]);
        h.screen.cancel = true;
        h.send(Command::SwitchSource {
            source: SourceId::Files,
        });
        h.send(Command::PlayAll);
        assert_eq!(h.launcher.programs().len(), 1);
        assert_eq!(h.status(), "cancelled playlist after 1 of 2");
    }

    #[test]
    fn test_delete_last_file_moves_selection_up() {
        let mut h = harness(vec![]);
        write_files(&h.files, &["a.mp4", "b.mp4", "c.mp4"]);
        h.send(Command::SwitchSource {
            source: SourceId::Files,
        });
        h.send(Command::Move { delta: 2 });
        h.send(Command::Delete);

        assert!(!h.files.join("c.mp4").exists());
        let state = h.shared.lock();
        let files = state.active_source();
        assert_eq!(files.rows.len(), 2);
        assert_eq!(files.selected_index(), Some(1));
        assert!(files.viewport.holds_invariants(2, state.visible_height));
        assert_eq!(state.status, "deleted c.mp4");
    }

    #[test]
    fn test_directories_are_entered_and_left() {
        let mut h = harness(vec![]);
        fs::create_dir(h.files.join("shows")).unwrap();
        write_files(&h.files.join("shows"), &["ep.mkv"]);
        h.send(Command::SwitchSource {
            source: SourceId::Files,
        });
        h.send(Command::Submit);
        assert_eq!(h.shared.lock().active_source().title, "files/shows");

        h.send(Command::Parent);
        assert_eq!(h.shared.lock().active_source().title, "files");
        assert!(h.launcher.programs().is_empty());
    }

    #[test]
    fn test_twitch_runs_chat_helper_before_stream() {
        let streams = r#"{"data": [{"user_login": "xqc", "user_name": "xQc",
            "game_name": "Chatting", "title": "hi", "viewer_count": 10}]}"#;
        let mut h = harness(vec![Ok(streams.to_string())]);
        *h.launcher.stdout.lock().unwrap() = Some("chat ready\n".to_string());

        h.send(Command::SwitchSource {
            source: SourceId::Twitch,
        });
        h.send(Command::Submit);

        assert_eq!(
            h.launcher.programs(),
            vec!["chat xqc", "streamlink https://www.twitch.tv/xqc"]
        );
        assert_eq!(h.status(), "stream ended: xqc");
    }

    #[test]
    fn test_resize_reclamps_every_source() {
        let mut h = harness(vec![]);
        write_files(&h.files, &["1", "2", "3", "4", "5", "6"]);
        h.send(Command::SwitchSource {
            source: SourceId::Files,
        });
        h.send(Command::Move { delta: 5 });
        h.app.on_resize(80, 5);

        let state = h.shared.lock();
        assert_eq!(state.visible_height, 2);
        assert_eq!(state.active_source().selected_index(), Some(5));
        assert!(state.active_source().viewport.holds_invariants(6, 2));
    }
}
