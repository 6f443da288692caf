//! SharedState: the one container every thread touches.
//!
//! The UI loop, the download worker and the remote listener all hold a clone
//! of `SharedState`. Rows, cursors, the download FIFO, status text and the
//! injected command inbox sit behind a single mutex, so any mutation is one
//! critical section. Only the UI loop draws; other threads set
//! `needs_redraw` and the loop picks it up on its next cycle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::protocol::{Command, SourceId};
use crate::row::{Reference, Row};
use crate::viewport::Viewport;

// ── SourceState ──────────────────────────────────────────────────────────────

/// Rows plus the per-source cursor/scroll. Each source keeps its own, so
/// switching away and back lands on the same row.
#[derive(Debug, Clone, Default)]
pub struct SourceState {
    pub rows: Vec<Row>,
    pub status_text: String,
    pub viewport: Viewport,
    /// Set after the first successful fetch.
    pub loaded: bool,
    /// Heading shown above the list, e.g. "r/videos".
    pub title: String,
}

impl SourceState {
    /// Swap in a freshly fetched sequence. The whole `Vec` is replaced at once.
    pub fn replace_rows(&mut self, rows: Vec<Row>, preserve: bool, height: usize) {
        self.rows = rows;
        self.loaded = true;
        self.viewport
            .on_rows_replaced(preserve, self.rows.len(), height);
    }

    /// Swap in a listing where `deleted` was removed from the old one.
    pub fn replace_after_delete(&mut self, rows: Vec<Row>, deleted: usize, height: usize) {
        self.rows = rows;
        self.viewport.on_row_deleted(deleted, self.rows.len(), height);
    }

    pub fn move_cursor(&mut self, delta: isize, height: usize) {
        self.viewport.move_cursor(delta, self.rows.len(), height);
    }

    pub fn page_move(&mut self, direction: isize, height: usize) {
        self.viewport
            .page_move(direction, height, self.rows.len(), height);
    }

    pub fn on_resize(&mut self, height: usize) {
        self.viewport.on_resize(self.rows.len(), height);
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.viewport.selected(self.rows.len())
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.selected_index().and_then(|i| self.rows.get(i))
    }
}

// ── Jobs and processes ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    pub reference: Reference,
    pub enqueued_at: DateTime<Local>,
}

impl DownloadJob {
    pub fn new(reference: Reference) -> Self {
        Self {
            reference,
            enqueued_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessKind {
    Foreground,
    BackgroundDownload,
}

/// What is running in one of the two process slots. The child handle itself
/// stays with its owner (the supervisor or the worker); this is the view the
/// other threads and the renderer get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveProcess {
    pub kind: ProcessKind,
    pub reference: Reference,
    pub started_at: DateTime<Local>,
}

impl ActiveProcess {
    pub fn new(kind: ProcessKind, reference: Reference) -> Self {
        Self {
            kind,
            reference,
            started_at: Local::now(),
        }
    }
}

// ── DeckState ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct DeckState {
    sources: [SourceState; 4],
    pub active: SourceId,
    /// Remote source to return to when leaving the file list.
    pub last_remote: SourceId,
    /// Rows available to the result list.
    pub visible_height: usize,
    /// Bottom status line.
    pub status: String,
    pub queue: VecDeque<DownloadJob>,
    pub download: Option<ActiveProcess>,
    pub foreground: Option<ActiveProcess>,
    /// Commands injected by the remote listener, drained by the UI loop.
    pub inbox: VecDeque<Command>,
    /// A download finished; the file list should be re-read.
    pub refresh_files: bool,
    pub needs_redraw: bool,
}

impl Default for DeckState {
    fn default() -> Self {
        Self {
            sources: Default::default(),
            active: SourceId::Reddit,
            last_remote: SourceId::Reddit,
            visible_height: 20,
            status: String::new(),
            queue: VecDeque::new(),
            download: None,
            foreground: None,
            inbox: VecDeque::new(),
            refresh_files: false,
            needs_redraw: true,
        }
    }
}

impl DeckState {
    pub fn source(&self, id: SourceId) -> &SourceState {
        &self.sources[id.index()]
    }

    pub fn source_mut(&mut self, id: SourceId) -> &mut SourceState {
        &mut self.sources[id.index()]
    }

    pub fn active_source(&self) -> &SourceState {
        self.source(self.active)
    }

    pub fn active_source_mut(&mut self) -> &mut SourceState {
        let id = self.active;
        self.source_mut(id)
    }

    /// Switch the viewport to another source. Returns true when the target
    /// has never been loaded.
    pub fn activate(&mut self, id: SourceId) -> bool {
        if id.is_remote() {
            self.last_remote = id;
        }
        self.active = id;
        let height = self.visible_height;
        let source = self.source_mut(id);
        source.viewport.clamp(source.rows.len(), height);
        if !source.status_text.is_empty() {
            self.status = self.source(id).status_text.clone();
        }
        self.needs_redraw = true;
        !self.source(id).loaded
    }

    /// Terminal resize: every source re-clamps, not just the visible one.
    pub fn resize(&mut self, height: usize) {
        self.visible_height = height;
        for source in self.sources.iter_mut() {
            source.on_resize(height);
        }
        self.needs_redraw = true;
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
        self.needs_redraw = true;
    }

    /// Status notice belonging to one source; mirrored to the status line
    /// when that source is on screen.
    pub fn set_source_status(&mut self, id: SourceId, text: impl Into<String>) {
        let text = text.into();
        if self.active == id {
            self.status = text.clone();
        }
        self.source_mut(id).status_text = text;
        self.needs_redraw = true;
    }
}

// ── SharedState ──────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<DeckState>>,
    shutdown: Arc<AtomicBool>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section. A panic on another thread does not make
    /// the state unusable for the rest of the program.
    pub fn lock(&self) -> MutexGuard<'_, DeckState> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Append a job to the FIFO. Returns the queue depth afterwards.
    pub fn enqueue(&self, reference: Reference) -> usize {
        let mut state = self.lock();
        state.queue.push_back(DownloadJob::new(reference.clone()));
        let depth = state.queue.len();
        let busy = state.download.is_some();
        state.set_status(if busy || depth > 1 {
            format!("queued {} ({} waiting)", reference, depth)
        } else {
            format!("queued {}", reference)
        });
        tracing::info!("enqueued download {} (depth {})", reference, depth);
        depth
    }

    pub fn queue_depth(&self) -> usize {
        self.lock().queue.len()
    }

    /// Hand a command to the UI loop and wake it for a redraw.
    pub fn inject(&self, command: Command) {
        let mut state = self.lock();
        state.inbox.push_back(command);
        state.needs_redraw = true;
    }

    /// Pop the oldest injected command.
    pub fn next_command(&self) -> Option<Command> {
        self.lock().inbox.pop_front()
    }

    pub fn drain_inbox(&self) -> Vec<Command> {
        self.lock().inbox.drain(..).collect()
    }

    pub fn request_redraw(&self) {
        self.lock().needs_redraw = true;
    }

    /// Read-and-clear the redraw request.
    pub fn take_redraw(&self) -> bool {
        std::mem::take(&mut self.lock().needs_redraw)
    }

    pub fn set_status(&self, text: impl Into<String>) {
        self.lock().set_status(text);
    }

    pub fn is_foreground_active(&self) -> bool {
        self.lock().foreground.is_some()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}
