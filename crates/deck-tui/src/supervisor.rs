//! Foreground process supervisor.
//!
//! At most one foreground child (player, viewer, helper) runs at a time and
//! the UI thread blocks on it. The terminal is handed to the child for the
//! duration and taken back afterwards. The `foreground` slot of the shared
//! state mirrors what is running so the download worker can tell whether it
//! is safe to ask for a file-list refresh.

use std::io::{BufRead, BufReader};
use std::sync::Arc;

use deck_proto::row::Reference;
use deck_proto::state::{ActiveProcess, ProcessKind, SharedState};
use tracing::{info, warn};

use crate::process::{CommandSpec, Launcher, ProcessExit, SpawnError, StdioMode};

/// Something that owns the terminal and can lend it to a child process.
pub trait TerminalSurface {
    /// Leave raw mode / alternate screen so the child sees a normal tty.
    fn suspend(&mut self) -> anyhow::Result<()>;
    /// Re-enter the UI and force a full repaint.
    fn resume(&mut self) -> anyhow::Result<()>;
    /// Between playlist items: did the user ask to stop?
    fn cancel_requested(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
}

/// Result of walking a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistOutcome {
    Finished { played: usize },
    Cancelled { played: usize },
    Aborted { played: usize, reason: String },
}

pub struct Supervisor {
    launcher: Arc<dyn Launcher>,
    shared: SharedState,
}

impl Supervisor {
    pub fn new(launcher: Arc<dyn Launcher>, shared: SharedState) -> Self {
        Self { launcher, shared }
    }

    pub fn state(&self) -> SupervisorState {
        if self.shared.is_foreground_active() {
            SupervisorState::Running
        } else {
            SupervisorState::Idle
        }
    }

    /// Run `spec` in the foreground and block until it exits.
    ///
    /// Fails with `Busy` without spawning when a foreground child is already
    /// registered. A non-zero exit is returned as `Ok`; callers decide how
    /// to report it.
    pub fn run_foreground<S: TerminalSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        spec: &CommandSpec,
        reference: &Reference,
    ) -> Result<ProcessExit, SpawnError> {
        self.claim(reference)?;

        if let Err(e) = surface.suspend() {
            warn!("failed to suspend terminal: {:#}", e);
        }

        let result = self
            .launcher
            .spawn(spec, StdioMode::Inherit)
            .and_then(|mut child| {
                child.wait().map_err(|source| SpawnError::Io {
                    program: spec.program.clone(),
                    source,
                })
            });

        if let Err(e) = surface.resume() {
            warn!("failed to restore terminal: {:#}", e);
        }
        self.release();

        match &result {
            Ok(exit) => info!("{} finished with {}", spec.program, exit),
            Err(e) => warn!("foreground run failed: {}", e),
        }
        result
    }

    /// Run `spec` without giving up the terminal, relaying each stdout line
    /// to `on_line` as it arrives.
    pub fn run_streaming(
        &mut self,
        spec: &CommandSpec,
        reference: &Reference,
        mut on_line: impl FnMut(&str),
    ) -> Result<ProcessExit, SpawnError> {
        self.claim(reference)?;

        let result = self
            .launcher
            .spawn(spec, StdioMode::PipedStdout)
            .and_then(|mut child| {
                if let Some(stdout) = child.take_stdout() {
                    for line in BufReader::new(stdout).lines() {
                        match line {
                            Ok(line) => on_line(line.trim_end()),
                            Err(e) => {
                                warn!("stopped relaying {} output: {}", spec.program, e);
                                break;
                            }
                        }
                    }
                }
                child.wait().map_err(|source| SpawnError::Io {
                    program: spec.program.clone(),
                    source,
                })
            });

        self.release();
        result
    }

    /// Play `items` one after another. The surface is asked for a cancel
    /// between items; a spawn failure or non-zero exit stops the walk.
    pub fn play_all<S: TerminalSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        items: &[(CommandSpec, Reference)],
        mut on_item: impl FnMut(&Reference),
    ) -> PlaylistOutcome {
        let mut played = 0;
        for (i, (spec, reference)) in items.iter().enumerate() {
            if i > 0 && surface.cancel_requested() {
                info!("playlist cancelled after {} item(s)", played);
                return PlaylistOutcome::Cancelled { played };
            }
            on_item(reference);
            match self.run_foreground(surface, spec, reference) {
                Ok(exit) if exit.success() => played += 1,
                Ok(exit) => {
                    let reason = SpawnError::Failed {
                        program: spec.program.clone(),
                        exit,
                    }
                    .to_string();
                    return PlaylistOutcome::Aborted { played, reason };
                }
                Err(e) => {
                    return PlaylistOutcome::Aborted {
                        played,
                        reason: e.to_string(),
                    }
                }
            }
        }
        PlaylistOutcome::Finished { played }
    }

    fn claim(&self, reference: &Reference) -> Result<(), SpawnError> {
        let mut state = self.shared.lock();
        if state.foreground.is_some() {
            return Err(SpawnError::Busy);
        }
        state.foreground = Some(ActiveProcess::new(
            ProcessKind::Foreground,
            reference.clone(),
        ));
        Ok(())
    }

    fn release(&self) {
        let mut state = self.shared.lock();
        state.foreground = None;
        state.needs_redraw = true;
    }
}
