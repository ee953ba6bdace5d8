//! Debounced file change notifications
//!
//! Parent directories are watched rather than the files themselves:
//! Kubernetes updates mounted Secrets and ConfigMaps by swapping a `..data`
//! symlink, which never touches the visible file names.

use super::TlsError;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Live watch; dropping it stops notifications
pub struct FileWatch {
    _debouncer: Debouncer<RecommendedWatcher>,
    changes: mpsc::UnboundedReceiver<Result<(), notify::Error>>,
}

impl std::fmt::Debug for FileWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatch").finish_non_exhaustive()
    }
}

impl FileWatch {
    /// Wait for the next relevant change burst
    pub async fn changed(&mut self) -> Result<(), TlsError> {
        match self.changes.recv().await {
            Some(result) => Ok(result?),
            None => Err(TlsError::WatchClosed),
        }
    }
}

/// Watch `paths` (files or directories). Bursts within `debounce` yield one notification.
pub fn watch_paths(paths: &[PathBuf], debounce: Duration) -> Result<FileWatch, TlsError> {
    let (sender, changes) = mpsc::unbounded_channel();

    let mut directories = BTreeSet::new();
    let mut file_names = BTreeSet::new();
    for path in paths {
        if path.is_dir() {
            directories.insert(path.clone());
        } else {
            directories.insert(parent_dir(path));
            if let Some(name) = path.file_name() {
                file_names.insert(name.to_os_string());
            }
        }
    }
    let watch_all: BTreeSet<PathBuf> = paths.iter().filter(|p| p.is_dir()).cloned().collect();

    let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
        let forwarded = match result {
            Ok(events) => {
                let relevant = events
                    .iter()
                    .any(|event| is_relevant(&event.path, &watch_all, &file_names));
                if !relevant {
                    return;
                }
                debug!("Detected change in {} watched entries", events.len());
                Ok(())
            }
            Err(e) => {
                warn!("File watch error: {}", e);
                Err(e)
            }
        };
        let _ = sender.send(forwarded);
    })?;

    for directory in &directories {
        debouncer
            .watcher()
            .watch(directory, RecursiveMode::NonRecursive)?;
        debug!("Watching {}", directory.display());
    }

    Ok(FileWatch {
        _debouncer: debouncer,
        changes,
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_relevant(path: &Path, directories: &BTreeSet<PathBuf>, file_names: &BTreeSet<OsString>) -> bool {
    if path.parent().is_some_and(|parent| directories.contains(parent)) {
        return true;
    }
    path.file_name().is_some_and(|name| {
        file_names.contains(name) || name.to_string_lossy().starts_with("..")
    })
}
