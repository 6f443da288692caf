//! Child-process plumbing shared by the foreground supervisor and the
//! download worker.
//!
//! Both sides talk to a `Launcher` so tests can swap the real
//! `std::process` implementation for a scripted one.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;

/// How a child finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    Success,
    Code(i32),
    /// Killed by a signal, no exit code.
    Abnormal,
}

impl ProcessExit {
    pub fn success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<std::process::ExitStatus> for ProcessExit {
    fn from(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(0) => Self::Success,
            Some(code) => Self::Code(code),
            None => Self::Abnormal,
        }
    }
}

impl std::fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("status 0"),
            Self::Code(code) => write!(f, "status {code}"),
            Self::Abnormal => f.write_str("a signal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("another player is already running")]
    Busy,
    #[error("no command configured")]
    EmptyCommand,
    #[error("{program} not found in PATH")]
    NotFound { program: String },
    #[error("failed to start {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {exit}")]
    Failed { program: String, exit: ProcessExit },
}

/// Where a child's standard streams go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Child owns the terminal (players, viewers).
    Inherit,
    /// Nothing may reach the terminal (background downloads).
    Null,
    /// stdout is captured for line relaying, stderr dropped.
    PipedStdout,
}

/// A fully resolved program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Build from a configured argv prefix plus trailing arguments.
    pub fn from_argv<I, S>(argv: &[String], extra: I) -> Result<Self, SpawnError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (program, rest) = argv.split_first().ok_or(SpawnError::EmptyCommand)?;
        let mut args = rest.to_vec();
        args.extend(extra.into_iter().map(Into::into));
        Ok(Self {
            program: program.clone(),
            args,
            cwd: None,
        })
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }
}

/// A started child. `try_wait` never blocks; `wait` does.
pub trait ChildProcess: Send {
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;
    fn wait(&mut self) -> io::Result<ProcessExit>;
    /// Captured stdout, when spawned with `StdioMode::PipedStdout`.
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>>;
}

pub trait Launcher: Send + Sync {
    fn spawn(&self, spec: &CommandSpec, stdio: StdioMode)
        -> Result<Box<dyn ChildProcess>, SpawnError>;
}

// ── std::process implementation ──────────────────────────────────────────────

pub struct SystemLauncher;

struct SystemChild {
    child: std::process::Child,
}

impl ChildProcess for SystemChild {
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        Ok(self.child.try_wait()?.map(ProcessExit::from))
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        Ok(self.child.wait()?.into())
    }

    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn Read + Send>)
    }
}

impl Launcher for SystemLauncher {
    fn spawn(
        &self,
        spec: &CommandSpec,
        stdio: StdioMode,
    ) -> Result<Box<dyn ChildProcess>, SpawnError> {
        let mut cmd = std::process::Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        match stdio {
            StdioMode::Inherit => {}
            StdioMode::Null => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
            }
            StdioMode::PipedStdout => {
                // stderr must not be piped without a reader or the child
                // blocks once the pipe buffer fills
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null());
            }
        }

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                SpawnError::NotFound {
                    program: spec.program.clone(),
                }
            } else {
                SpawnError::Io {
                    program: spec.program.clone(),
                    source: e,
                }
            }
        })?;
        tracing::debug!("spawned pid {}: {}", child.id(), spec.display());
        Ok(Box::new(SystemChild { child }))
    }
}

// ── scripted launcher for tests ───────────────────────────────────────────────

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Completion switch for one fake child. `None` = still running.
    pub type ExitSlot = Arc<Mutex<Option<ProcessExit>>>;

    #[derive(Default)]
    pub struct FakeLauncher {
        pub spawned: Mutex<Vec<CommandSpec>>,
        pub slots: Mutex<Vec<ExitSlot>>,
        /// Programs that fail to spawn with NotFound.
        pub missing: Mutex<HashSet<String>>,
        /// Exit reported by `wait()` for each spawn, in order; Success when empty.
        pub wait_exits: Mutex<std::collections::VecDeque<ProcessExit>>,
        /// stdout text handed to piped children.
        pub stdout: Mutex<Option<String>>,
        /// Children spawned while set fail every `try_wait`.
        pub failing_polls: Mutex<bool>,
    }

    impl FakeLauncher {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn programs(&self) -> Vec<String> {
            self.spawned
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.display())
                .collect()
        }

        /// Mark the n-th spawned child as exited.
        pub fn finish(&self, n: usize, exit: ProcessExit) {
            *self.slots.lock().unwrap()[n].lock().unwrap() = Some(exit);
        }
    }

    struct FakeChild {
        slot: ExitSlot,
        wait_exit: ProcessExit,
        stdout: Option<String>,
        failing_polls: bool,
    }

    impl ChildProcess for FakeChild {
        fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
            if self.failing_polls {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "transient"));
            }
            Ok(*self.slot.lock().unwrap())
        }

        fn wait(&mut self) -> io::Result<ProcessExit> {
            let exit = self.slot.lock().unwrap().unwrap_or(self.wait_exit);
            *self.slot.lock().unwrap() = Some(exit);
            Ok(exit)
        }

        fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
            self.stdout
                .take()
                .map(|s| Box::new(io::Cursor::new(s.into_bytes())) as Box<dyn Read + Send>)
        }
    }

    impl Launcher for FakeLauncher {
        fn spawn(
            &self,
            spec: &CommandSpec,
            stdio: StdioMode,
        ) -> Result<Box<dyn ChildProcess>, SpawnError> {
            if self.missing.lock().unwrap().contains(&spec.program) {
                return Err(SpawnError::NotFound {
                    program: spec.program.clone(),
                });
            }
            self.spawned.lock().unwrap().push(spec.clone());
            let slot: ExitSlot = Arc::new(Mutex::new(None));
            self.slots.lock().unwrap().push(slot.clone());
            let wait_exit = self
                .wait_exits
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ProcessExit::Success);
            let stdout = match stdio {
                StdioMode::PipedStdout => self.stdout.lock().unwrap().clone(),
                _ => None,
            };
            Ok(Box::new(FakeChild {
                slot,
                wait_exit,
                stdout,
                failing_polls: *self.failing_polls.lock().unwrap(),
            }))
        }
    }
}
