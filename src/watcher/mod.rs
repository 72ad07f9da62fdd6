//! File watching for live title preview.
//!
//! Uses notify crate for cross-platform file system events.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// The file being watched and the directory its events arrive on.
#[derive(Debug, Clone)]
struct WatchTarget {
    root: PathBuf,
    path: PathBuf,
    name: Option<OsString>,
}

impl WatchTarget {
    fn new(path: &Path) -> Self {
        // Event paths from the OS are canonical.
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self {
            root: watch_root_for(&path),
            name: path.file_name().map(std::ffi::OsStr::to_os_string),
            path,
        }
    }

    fn matches(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.root
                || path == &self.path
                || self
                    .name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

/// Watches one file and reports debounced changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    target: WatchTarget,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl FileWatcher {
    /// Create a watcher for `path`.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        let target = WatchTarget::new(path.as_ref());

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&target.root, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %target.path.display(), root = %target.root.display(), "watching");

        Ok(Self {
            _watcher: watcher,
            rx,
            target,
            debounce,
            pending_since: None,
        })
    }

    /// The canonical path of the file being watched.
    pub fn target_path(&self) -> &Path {
        &self.target.path
    }

    /// Drain pending events; true once a debounced change is ready.
    pub fn poll(&mut self) -> bool {
        let mut relevant = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            relevant += u32::from(self.record(event));
        }
        if relevant > 0 {
            tracing::trace!(relevant, "file events");
        }
        self.settled()
    }

    /// Block up to `timeout` for a debounced change.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.poll() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let step = self
                .pending_since
                .map_or(deadline - now, |since| {
                    (since + self.debounce).saturating_duration_since(now)
                })
                .min(deadline - now);
            match self.rx.recv_timeout(step) {
                Ok(event) => {
                    self.record(event);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return self.settled(),
            }
        }
    }

    fn record(&mut self, event: notify::Result<Event>) -> bool {
        match event {
            Ok(ev) if self.target.matches(&ev) => {
                self.pending_since = Some(Instant::now());
                true
            }
            Ok(ev) => {
                tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "ignoring file event");
                false
            }
            Err(err) => {
                tracing::warn!(%err, "file watcher error");
                false
            }
        }
    }

    fn settled(&mut self) -> bool {
        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
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
    use notify::EventKind;
    use tempfile::tempdir;

    fn event_on(path: PathBuf) -> Event {
        Event {
            kind: EventKind::Any,
            paths: vec![path],
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_event_matches_target() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("notes.txt");
        std::fs::write(&path, "hi").expect("write");

        let target = WatchTarget::new(&path);
        assert!(target.matches(&event_on(canonical_dir)));
    }

    #[test]
    fn test_unrelated_file_event_is_ignored() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("notes.txt");
        std::fs::write(&path, "hi").expect("write");

        let target = WatchTarget::new(&path);
        assert!(!target.matches(&event_on(canonical_dir.join("other.txt"))));
    }

    #[test]
    fn test_relative_path_matches_canonical_event() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("scratch");
        std::fs::write(&path, "x").expect("write");

        let target = WatchTarget::new(&path);
        let canonical = path.canonicalize().expect("canonicalize");
        assert!(target.matches(&event_on(canonical)));
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        let root = watch_root_for(Path::new("scratch.txt"));
        assert_eq!(root, PathBuf::from("."));
    }

    #[test]
    fn test_no_change_without_events() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("quiet.txt");
        std::fs::write(&path, "still").expect("write");
        let mut watcher = FileWatcher::new(&path, Duration::from_millis(10)).expect("watcher");
        assert!(!watcher.wait(Duration::from_millis(50)));
    }

    #[test]
    fn test_real_modification_detected() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("watched.txt");
        std::fs::write(&path, "original").expect("write");

        let mut watcher = FileWatcher::new(&path, Duration::from_millis(50)).expect("watcher");
        assert_eq!(watcher.target_path(), path.as_path());

        // Give the backend time to register the watch
        std::thread::sleep(Duration::from_millis(500));
        std::fs::write(&path, "modified").expect("write");

        assert!(
            watcher.wait(Duration::from_secs(5)),
            "watcher should detect real file modification within 5 seconds"
        );
    }
}
