use crate::app::Event;
use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::Duration;
use tracing::warn;

/// Feeds [`Event::Modified`] for every changed path under the repository into the loop.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    pub fn new(repo_path: &Path, events: Sender<Event>) -> Result<Self> {
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) if is_content_change(&event.kind) => {
                    for path in event.paths {
                        if events.send(Event::Modified(path)).is_err() {
                            return;
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "file watcher error");
                    let _ = events.send(Event::WatchFailed(err.to_string()));
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(repo_path, RecursiveMode::Recursive)?;

        Ok(Self { _watcher: watcher })
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => false,
    }
}
