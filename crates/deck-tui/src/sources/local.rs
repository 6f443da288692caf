//! Local file tree rooted at the download directory.
//!
//! Directories come first (lexicographic, with a `..` entry below the root),
//! then files oldest first by creation time. Navigation never leaves the
//! root.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use deck_proto::protocol::SourceId;
use deck_proto::row::{format_columns, Reference, Row, RowKind};
use tracing::{info, warn};

use super::{FetchError, FetchRequest, Source};

const IDX_WIDTH: usize = 2;

pub struct LocalFiles {
    root: PathBuf,
    current: PathBuf,
}

impl LocalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            current: root.clone(),
            root,
        }
    }

    pub fn current_dir(&self) -> &Path {
        &self.current
    }

    pub fn at_root(&self) -> bool {
        self.current == self.root
    }

    /// Descend into the directory named by `reference`. Returns false when it
    /// is not a directory under the root.
    pub fn enter(&mut self, reference: &Reference) -> bool {
        let path = PathBuf::from(reference.as_str());
        if !path.starts_with(&self.root) || !path.is_dir() {
            return false;
        }
        self.current = path;
        true
    }

    /// Go up one level. Returns false at the root.
    pub fn parent(&mut self) -> bool {
        if self.at_root() {
            return false;
        }
        match self.current.parent() {
            Some(parent) if parent.starts_with(&self.root) => {
                self.current = parent.to_path_buf();
                true
            }
            _ => {
                self.current = self.root.clone();
                true
            }
        }
    }

    /// Remove the file named by `reference`. Directories are left alone.
    pub fn delete(&self, reference: &Reference) -> Result<(), FetchError> {
        let path = PathBuf::from(reference.as_str());
        if !path.starts_with(&self.root) || !path.is_file() {
            return Err(FetchError::NotConfigured(format!(
                "{} is not a file in the download directory",
                reference
            )));
        }
        std::fs::remove_file(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        info!("deleted {}", path.display());
        Ok(())
    }

    fn list(&self, width: usize) -> Result<Vec<Row>, FetchError> {
        let io_err = |source: std::io::Error| FetchError::Io {
            path: self.current.clone(),
            source,
        };
        if self.at_root() {
            std::fs::create_dir_all(&self.root).map_err(io_err)?;
        }

        let mut dirs: Vec<(String, PathBuf)> = Vec::new();
        let mut files: Vec<(SystemTime, String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&self.current).map_err(io_err)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable entry in {}: {}", self.current.display(), e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let Ok(meta) = entry.metadata() else { continue };
            if meta.is_dir() {
                dirs.push((name, entry.path()));
            } else {
                // not every filesystem records a birth time
                let created = meta
                    .created()
                    .or_else(|_| meta.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((created, name, entry.path()));
            }
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let name_width = width.saturating_sub(IDX_WIDTH + 1).max(10);
        let mut rows = Vec::with_capacity(dirs.len() + files.len() + 1);
        let mut push = |label: String, path: &Path, kind: RowKind| {
            let idx = (rows.len() + 1).to_string();
            let display = format_columns(&[(&idx, IDX_WIDTH), (&label, name_width)]);
            let reference = Reference::new(path.to_string_lossy().into_owned());
            rows.push(Row::new(display, Some(reference), kind));
        };

        if !self.at_root() {
            let up = self.current.parent().unwrap_or(&self.root).to_path_buf();
            push("../".to_string(), &up, RowKind::Directory);
        }
        for (name, path) in &dirs {
            push(format!("{name}/"), path, RowKind::Directory);
        }
        for (_, name, path) in &files {
            push(name.clone(), path, RowKind::Playable);
        }
        Ok(rows)
    }
}

impl Source for LocalFiles {
    fn id(&self) -> SourceId {
        SourceId::Files
    }

    fn title(&self, _request: &FetchRequest<'_>) -> String {
        match self.current.strip_prefix(&self.root) {
            Ok(rel) if !rel.as_os_str().is_empty() => format!("files/{}", rel.display()),
            _ => "files".to_string(),
        }
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Row>, FetchError> {
        // the directory may have vanished underneath us
        if !self.current.is_dir() && !self.at_root() {
            self.current = self.root.clone();
        }
        self.list(request.width)
    }
}
