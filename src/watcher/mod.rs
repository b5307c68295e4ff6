//! File watching for external-change reload.
//!
//! Uses notify crate for cross-platform file system events. The parent
//! directory is watched rather than the file itself, so editors that save by
//! renaming a temp file over the target (tked included) are still seen.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a single file and emits debounced change notifications.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl FileWatcher {
    /// Create a watcher for `path`.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Event paths from the OS are absolute and canonical.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(target = %target_path.display(), root = %watch_root.display(), "watching");

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
            pending_since: None,
        })
    }

    /// The canonical path of the file being watched.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Returns true once a burst of relevant events has been quiet for the
    /// debounce interval.
    pub fn take_change_ready(&mut self) -> bool {
        let mut relevant = 0u32;
        let mut ignored = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => relevant += 1,
                Ok(ev) => {
                    ignored += 1;
                    tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "ignored fs event");
                }
                Err(err) => tracing::warn!(error = %err, "watcher error"),
            }
        }

        if relevant + ignored > 0 {
            tracing::debug!(relevant, ignored, target = %self.target_path.display(), "watcher poll");
        }
        if relevant > 0 {
            self.pending_since = Some(Instant::now());
        }

        match self.pending_since {
            Some(since) if since.elapsed() >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, EventAttributes, ModifyKind};
    use tempfile::tempdir;

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event {
            kind,
            paths: vec![path],
            attrs: EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_level_event_is_relevant_for_watched_file() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("notes.txt");
        std::fs::write(&path, "hi").expect("write");
        let watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        assert!(watcher.is_relevant(&event(EventKind::Any, canonical_dir)));
    }

    #[test]
    fn test_sibling_file_event_is_ignored() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("notes.txt");
        std::fs::write(&path, "hi").expect("write");
        let watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        let other = canonical_dir.join("other.txt");
        assert!(!watcher.is_relevant(&event(EventKind::Modify(ModifyKind::Any), other)));
        assert!(watcher.is_relevant(&event(EventKind::Modify(ModifyKind::Any), path)));
    }

    #[test]
    fn test_access_events_are_ignored() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().canonicalize().expect("canonicalize").join("notes.txt");
        std::fs::write(&path, "hi").expect("write");
        let watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");

        assert!(!watcher.is_relevant(&event(EventKind::Access(AccessKind::Any), path)));
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        let root = watch_root_for(Path::new("notes.txt"));
        assert_eq!(root, PathBuf::from("."));
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("watched.txt");
        std::fs::write(&path, "original").expect("write");

        let mut watcher = FileWatcher::new(&path, Duration::from_millis(50)).expect("watcher");
        assert_eq!(watcher.target_path(), path.as_path());

        // Give the backend time to register the watch
        std::thread::sleep(Duration::from_millis(500));
        std::fs::write(&path, "modified").expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        assert!(
            detected,
            "watcher should detect real file modification within 5 seconds"
        );
    }
}
