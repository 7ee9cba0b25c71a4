use std::path::{Path, PathBuf};

use crate::config::PreprocessorConfig;
use crate::dictionary::Dictionary;
use crate::file_registry::{ChangeHook, FileRegistry, FileWatcher};
use crate::include_provider::{FsIncludeProvider, IncludeProvider};
use crate::scanner::Scanner;
use crate::PrepperError;

/// Expands a GLSL shader file, with its includes, loops and substitutions,
/// into a single source string.
///
/// File identifiers assigned during [`process`](Preprocessor::process) are kept
/// between calls, so re-processing after a change keeps `#line` markers stable.
pub struct Preprocessor {
    shader_path: PathBuf,
    dictionary: Dictionary,
    config: PreprocessorConfig,
    include_provider: Box<dyn IncludeProvider>,
    registry: FileRegistry,
    on_change: ChangeHook,
}

impl Preprocessor {
    pub fn new(shader_path: impl Into<PathBuf>, dictionary: Dictionary) -> Self {
        let on_change = ChangeHook::default();
        Self {
            shader_path: shader_path.into(),
            dictionary,
            config: PreprocessorConfig::default(),
            include_provider: Box::new(FsIncludeProvider),
            registry: FileRegistry::new(on_change.clone()),
            on_change,
        }
    }

    pub fn with_config(mut self, config: PreprocessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_include_provider(mut self, provider: impl IncludeProvider + 'static) -> Self {
        self.include_provider = Box::new(provider);
        self
    }

    /// Watch every tracked file, current and future, for changes.
    pub fn with_file_watcher(mut self, watcher: impl FileWatcher + 'static) -> Self {
        self.registry.set_watcher(Box::new(watcher));
        self
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Replace the dictionary; the change callback fires if it differs.
    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        if self.dictionary != dictionary {
            self.dictionary = dictionary;
            self.on_change.notify();
        }
    }

    pub fn filename(&self) -> &Path {
        &self.shader_path
    }

    /// Replace the root file; the change callback fires if it differs.
    pub fn set_filename(&mut self, shader_path: impl Into<PathBuf>) {
        let shader_path = shader_path.into();
        if self.shader_path != shader_path {
            self.shader_path = shader_path;
            self.on_change.notify();
        }
    }

    /// Called when the dictionary or filename change, and by the file watcher
    /// whenever a tracked file changes on disk.
    pub fn set_change_callback(&mut self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_change.set(callback);
    }

    /// Append a search directory for quoted includes. Duplicates are ignored.
    pub fn add_include_path(&mut self, dir: impl Into<PathBuf>) -> crate::Result<()> {
        let dir = dir.into();
        if dir.as_os_str().is_empty() || !self.include_provider.is_dir(&dir) {
            return Err(PrepperError::InvalidIncludePath { path: dir });
        }

        if !self.config.include_paths.contains(&dir) {
            self.config.include_paths.push(dir);
        }
        Ok(())
    }

    /// Run a full pass and return the flattened source.
    pub fn process(&mut self) -> crate::Result<String> {
        let root = self.include_provider.absolute(&self.shader_path);
        tracing::debug!(root = %root.display(), "preprocessing shader");

        Scanner::new(
            &mut *self.include_provider,
            &mut self.registry,
            &self.config,
            &self.dictionary,
        )
        .process(root)
    }

    pub fn file_registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// `<id>: <path>` for every file seen so far, for decoding `#line` markers.
    pub fn file_identifiers_string(&self) -> String {
        self.registry.identifiers_string()
    }
}
