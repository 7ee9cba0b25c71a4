use std::path::{Component, Path, PathBuf};

use crate::BoxedIncludeProviderError;

/// Absolute, normalized path of a file taking part in preprocessing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedIncludePath(pub PathBuf);

impl ResolvedIncludePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn display(&self) -> std::path::Display<'_> {
        self.0.display()
    }
}

/// User-supplied file access. The default, [`FsIncludeProvider`], reads from disk;
/// custom providers enable virtual file systems and in-memory shaders.
pub trait IncludeProvider {
    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn get_include(
        &mut self,
        path: &ResolvedIncludePath,
    ) -> Result<String, BoxedIncludeProviderError>;

    /// Turn `path` into the identity used by the file registry.
    /// Two spellings of the same file must map to the same result.
    fn absolute(&self, path: &Path) -> ResolvedIncludePath {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(path),
                Err(_) => path.to_path_buf(),
            }
        };
        ResolvedIncludePath(normalize(&joined))
    }
}

pub struct FsIncludeProvider;

impl IncludeProvider for FsIncludeProvider {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn get_include(
        &mut self,
        path: &ResolvedIncludePath,
    ) -> Result<String, BoxedIncludeProviderError> {
        // Invalid UTF-8, such as a Latin-1 comment, is replaced rather than rejected
        let bytes = std::fs::read(&path.0)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Lexically collapse `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            c => out.push(c.as_os_str()),
        }
    }
    out
}

/// Resolve a quoted include: next to the including file first, then in each
/// include path, and finally as given.
pub(crate) fn resolve_quoted(
    provider: &dyn IncludeProvider,
    include: &Path,
    including_file: &Path,
    include_paths: &[PathBuf],
) -> Option<ResolvedIncludePath> {
    let sibling = including_file
        .parent()
        .map(|dir| dir.join(include))
        .unwrap_or_else(|| include.to_path_buf());

    std::iter::once(sibling)
        .chain(include_paths.iter().map(|dir| dir.join(include)))
        .chain(std::iter::once(include.to_path_buf()))
        .find(|candidate| provider.is_file(candidate))
        .map(|found| provider.absolute(&found))
}

/// Resolve an angle-bracket include, which names the file directly.
pub(crate) fn resolve_angled(
    provider: &dyn IncludeProvider,
    include: &Path,
) -> Option<ResolvedIncludePath> {
    let resolved = provider.absolute(include);
    if provider.is_file(resolved.as_path()) {
        Some(resolved)
    } else {
        None
    }
}
