//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File was created
    Created(PathBuf),

    /// File was deleted
    Deleted(PathBuf),

    /// File was modified
    Modified(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Deleted(p) | WatchEvent::Modified(p) => p,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Changes under any of the `ignored` prefixes (the output directory,
    /// excluded entries) are dropped. Returns the watcher and a channel to
    /// receive events.
    pub fn new(
        paths: &[PathBuf],
        ignored: Vec<PathBuf>,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            let mut last_event_time = std::time::Instant::now();
            let debounce_duration = Duration::from_millis(100);

            while let Ok(event) = sync_rx.recv() {
                let relevant: Vec<_> = event
                    .paths
                    .iter()
                    .filter(|p| !is_ignored(p, &ignored))
                    .filter_map(|p| classify_event(p, &event.kind))
                    .collect();

                if relevant.is_empty() {
                    continue;
                }

                // Debounce rapid events
                let now = std::time::Instant::now();
                if now.duration_since(last_event_time) < debounce_duration {
                    continue;
                }
                last_event_time = now;

                for watch_event in relevant {
                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

fn is_ignored(path: &Path, ignored: &[PathBuf]) -> bool {
    ignored.iter().any(|prefix| path.starts_with(prefix))
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    match kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Modify(_) => Some(WatchEvent::Modified(path.to_path_buf())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn watches_file_changes() {
        let temp = tempdir().unwrap();
        let root = temp.path().canonicalize().unwrap();

        let (watcher, mut rx) = FileWatcher::new(&[root.clone()], vec![]).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(root.join("index.html"), "<p>hi</p>").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert!(event.unwrap().is_some(), "channel should not be closed");
    }

    #[test]
    fn ignores_output_directory() {
        let ignored = vec![PathBuf::from("/site/public")];

        assert!(is_ignored(Path::new("/site/public/index.html"), &ignored));
        assert!(!is_ignored(Path::new("/site/index.html"), &ignored));
        assert!(!is_ignored(Path::new("/site/public-notes.txt"), &ignored));
    }

    #[test]
    fn classifies_event_kinds() {
        use notify::event::{CreateKind, ModifyKind, RemoveKind};
        use notify::EventKind;

        let path = Path::new("/site/index.html");

        assert_eq!(
            classify_event(path, &EventKind::Create(CreateKind::File)),
            Some(WatchEvent::Created(path.to_path_buf()))
        );
        assert_eq!(
            classify_event(path, &EventKind::Remove(RemoveKind::File)),
            Some(WatchEvent::Deleted(path.to_path_buf()))
        );
        assert_eq!(
            classify_event(path, &EventKind::Modify(ModifyKind::Any)),
            Some(WatchEvent::Modified(path.to_path_buf()))
        );
        assert_eq!(classify_event(path, &EventKind::Any), None);
    }
}
