//! Background download worker.
//!
//! Owns the consumer side of the download FIFO and the single
//! `BackgroundDownload` slot. Completion is detected by polling the child
//! once per tick; the worker never blocks on it.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use deck_proto::row::Reference;
use deck_proto::state::{ActiveProcess, ProcessKind, SharedState};
use tracing::{error, info, warn};

use crate::process::{ChildProcess, CommandSpec, Launcher, ProcessExit, StdioMode};

/// What one tick did. Only the tests look at this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Running,
    Started(Reference),
    Finished(Reference, ProcessExit),
    SpawnFailed(Reference),
}

pub struct DownloadWorker {
    shared: SharedState,
    launcher: Arc<dyn Launcher>,
    /// argv prefix; the reference is appended
    downloader: Vec<String>,
    files_dir: PathBuf,
    running: Option<(Reference, Box<dyn ChildProcess>)>,
}

impl DownloadWorker {
    pub fn new(
        shared: SharedState,
        launcher: Arc<dyn Launcher>,
        downloader: Vec<String>,
        files_dir: PathBuf,
    ) -> Self {
        Self {
            shared,
            launcher,
            downloader,
            files_dir,
            running: None,
        }
    }

    pub fn tick(&mut self) -> Tick {
        if let Some((reference, child)) = self.running.as_mut() {
            let exit = match child.try_wait() {
                Ok(None) => return Tick::Running,
                Ok(Some(exit)) => exit,
                Err(e) => {
                    // no proof it exited; the next download has to wait
                    warn!("could not poll download {}: {}", reference, e);
                    return Tick::Running;
                }
            };
            let reference = reference.clone();
            self.running = None;
            self.finish(&reference, exit);
            return Tick::Finished(reference, exit);
        }

        let job = match self.shared.lock().queue.pop_front() {
            Some(job) => job,
            None => return Tick::Idle,
        };
        self.start(job.reference)
    }

    fn start(&mut self, reference: Reference) -> Tick {
        if let Err(e) = std::fs::create_dir_all(&self.files_dir) {
            warn!("could not create {}: {}", self.files_dir.display(), e);
        }

        let spawned = CommandSpec::from_argv(&self.downloader, [reference.as_str()])
            .map(|spec| spec.in_dir(&self.files_dir))
            .and_then(|spec| self.launcher.spawn(&spec, StdioMode::Null));

        let mut state = self.shared.lock();
        match spawned {
            Ok(child) => {
                let waiting = state.queue.len();
                state.download = Some(ActiveProcess::new(
                    ProcessKind::BackgroundDownload,
                    reference.clone(),
                ));
                state.set_status(if waiting > 0 {
                    format!("downloading {} ({} queued)", reference, waiting)
                } else {
                    format!("downloading {}", reference)
                });
                drop(state);
                info!("download started: {}", reference);
                self.running = Some((reference.clone(), child));
                Tick::Started(reference)
            }
            Err(e) => {
                error!("download of {} could not start: {}", reference, e);
                state.set_status(format!("download failed: {}", e));
                Tick::SpawnFailed(reference)
            }
        }
    }

    fn finish(&self, reference: &Reference, exit: ProcessExit) {
        let mut state = self.shared.lock();
        state.download = None;
        let waiting = state.queue.len();
        let mut status = if exit.success() {
            format!("downloaded {}", reference)
        } else {
            format!("download of {} exited with {}", reference, exit)
        };
        if waiting > 0 {
            status.push_str(&format!(" ({} queued)", waiting));
        }
        state.set_status(status);
        // a player owns the terminal; the list is re-read after it returns
        if state.foreground.is_none() {
            state.refresh_files = true;
        }
        info!("download finished: {} ({})", reference, exit);
    }

    /// Run the tick loop on its own thread until shutdown is requested.
    /// Unpark the returned thread to make it notice shutdown immediately.
    pub fn spawn(mut self, interval: Duration) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("download-worker".to_string())
            .spawn(move || {
                info!("download worker running, polling every {:?}", interval);
                while !self.shared.is_shutting_down() {
                    self.tick();
                    std::thread::park_timeout(interval);
                }
                if let Some((reference, _)) = &self.running {
                    info!("leaving download {} to finish on its own", reference);
                }
                info!("download worker stopped");
            })
    }
}
