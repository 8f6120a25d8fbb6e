use std::path::PathBuf;

use crossbeam_channel::{Receiver, unbounded};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches the config and palette files. The watcher stops when this is
/// dropped.
pub struct ConfigWatch {
    _watcher: RecommendedWatcher,
    rx: Receiver<PathBuf>,
}

impl ConfigWatch {
    pub fn new(paths: &[PathBuf]) -> notify::Result<Self> {
        let (tx, rx) = unbounded::<PathBuf>();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                match event.kind {
                    EventKind::Modify(_)
                    | EventKind::Create(_)
                    | EventKind::Remove(_)
                    | EventKind::Any => {
                        for p in event.paths {
                            let _ = tx.send(p);
                        }
                    }
                    _ => {}
                }
            })?;
        for path in paths {
            match watcher.watch(path, RecursiveMode::NonRecursive) {
                Ok(()) => log::info!("Watching {}", path.display()),
                Err(e) => log::warn!("Cannot watch {}: {e}", path.display()),
            }
        }
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Drains pending events; true when anything changed since the last call.
    pub fn changed(&self) -> bool {
        let mut any = false;
        for p in self.rx.try_iter() {
            log::debug!("Changed: {}", p.display());
            any = true;
        }
        any
    }
}
