//! Stable numeric identities for every file that took part in preprocessing.
//!
//! The identifiers end up in `#line <line> <id>` markers, so compiler
//! diagnostics can be traced back to their file. Files are never removed;
//! identifiers survive repeated `process` calls on the same preprocessor.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::ResolvedIncludePath;

type ChangeCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Shared slot for the user's change callback. Watchers hold a clone and call
/// [`ChangeHook::notify`]; replacing the callback reaches every clone.
#[derive(Clone, Default)]
pub struct ChangeHook(Arc<Mutex<Option<ChangeCallback>>>);

impl ChangeHook {
    pub fn set(&self, callback: impl Fn() + Send + Sync + 'static) {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(callback));
    }

    /// Run the current callback. The slot is unlocked while it runs, so the
    /// callback may replace itself.
    pub fn notify(&self) {
        let callback = self
            .0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl std::fmt::Debug for ChangeHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChangeHook")
    }
}

/// External file-change facility. `watch` is called once per file that becomes
/// tracked; the watcher should call `on_change.notify()` whenever it changes.
pub trait FileWatcher {
    fn watch(&mut self, path: &Path, on_change: ChangeHook);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub path: ResolvedIncludePath,
    pub id: usize,
    pub tracked: bool,
}

#[derive(Default)]
pub struct FileRegistry {
    entries: Vec<FileEntry>,
    index: HashMap<ResolvedIncludePath, usize>,
    watcher: Option<Box<dyn FileWatcher>>,
    hook: ChangeHook,
}

impl FileRegistry {
    pub fn new(hook: ChangeHook) -> Self {
        Self {
            hook,
            ..Default::default()
        }
    }

    pub fn set_watcher(&mut self, mut watcher: Box<dyn FileWatcher>) {
        for entry in self.entries.iter().filter(|e| e.tracked) {
            watcher.watch(entry.path.as_path(), self.hook.clone());
        }
        self.watcher = Some(watcher);
    }

    /// Identifier of `path`, registering it on first sight. A file is tracked
    /// once any include asks for tracking; later untracked includes do not
    /// undo that.
    pub fn register(&mut self, path: &ResolvedIncludePath, track: bool) -> usize {
        if let Some(&id) = self.index.get(path) {
            let entry = &mut self.entries[id];
            if track && !entry.tracked {
                tracing::debug!(path = %path.display(), id, "file is now tracked");
                entry.tracked = true;
                if let Some(watcher) = self.watcher.as_mut() {
                    watcher.watch(path.as_path(), self.hook.clone());
                }
            }
            return id;
        }

        let id = self.entries.len();
        tracing::debug!(path = %path.display(), id, tracked = track, "registered file");

        self.entries.push(FileEntry {
            path: path.clone(),
            id,
            tracked: track,
        });
        self.index.insert(path.clone(), id);

        if track {
            if let Some(watcher) = self.watcher.as_mut() {
                watcher.watch(path.as_path(), self.hook.clone());
            }
        }

        id
    }

    pub fn id_of(&self, path: &ResolvedIncludePath) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub fn path_of(&self, id: usize) -> Option<&ResolvedIncludePath> {
        self.entries.get(id).map(|e| &e.path)
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `<id>: <path>` line per registered file, in identifier order.
    pub fn identifiers_string(&self) -> String {
        let mut s = String::new();
        for entry in &self.entries {
            let _ = writeln!(s, "{}: {}", entry.id, entry.path.display());
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn callback_can_replace_itself() {
        let hook = ChangeHook::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let inner = hook.clone();
        let counter = calls.clone();
        hook.set(move || {
            let counter = counter.clone();
            inner.set(move || {
                counter.fetch_add(10, Ordering::SeqCst);
            });
        });

        hook.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        hook.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut registry = FileRegistry::default();
        let a = ResolvedIncludePath("/a.glsl".into());
        let b = ResolvedIncludePath("/b.glsl".into());

        assert_eq!(registry.register(&a, false), 0);
        assert_eq!(registry.register(&b, true), 1);
        assert_eq!(registry.register(&a, true), 0);

        assert_eq!(registry.id_of(&b), Some(1));
        assert_eq!(registry.id_of(&ResolvedIncludePath("/c.glsl".into())), None);
        assert_eq!(registry.path_of(0), Some(&a));
        assert!(registry.entries()[0].tracked);
    }
}
