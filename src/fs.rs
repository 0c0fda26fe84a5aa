//! Directory capability consumed by the translation source.
//!
//! Translation files can live on the real filesystem during development or
//! be compiled into the binary for deployment. Both backings are exposed
//! through the same minimal [`TranslationDir`] trait so the loading code
//! stays agnostic of the storage.

use std::io;
use std::marker::PhantomData;
use std::path::{
    Path,
    PathBuf,
};

use rust_embed::RustEmbed;

/// A single entry of a translation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name relative to the directory (no path separators).
    pub name: String,
    /// Whether the entry is itself a directory.
    pub is_dir: bool,
}

/// Read access to a directory of translation files.
///
/// Implementations must be shareable across request-handling threads.
pub trait TranslationDir: Send + Sync {
    /// Lists the direct entries of the directory (non-recursive).
    fn entries(&self) -> io::Result<Vec<DirEntry>>;

    /// Reads a named entry as UTF-8 text.
    fn read(&self, name: &str) -> io::Result<String>;
}

/// [`TranslationDir`] backed by a real filesystem directory.
#[derive(Debug, Clone)]
pub struct OsDir {
    /// Root of the directory.
    path: PathBuf,
}

impl OsDir {
    /// Opens a filesystem directory.
    ///
    /// # Errors
    /// - The path does not exist or is not readable
    /// - The path exists but is not a directory
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", path.display()),
            ));
        }
        Ok(Self { path: path.to_path_buf() })
    }
}

impl TranslationDir for OsDir {
    fn entries(&self) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "Skipping non-UTF-8 file name");
                continue;
            };
            let is_dir = entry.file_type()?.is_dir();
            entries.push(DirEntry { name, is_dir });
        }
        Ok(entries)
    }

    fn read(&self, name: &str) -> io::Result<String> {
        std::fs::read_to_string(self.path.join(name))
    }
}

/// [`TranslationDir`] backed by assets embedded at compile time.
///
/// `prefix` selects a subdirectory of the embedded tree; pass an empty
/// string when the embedded folder itself is the translation directory.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedDir<A: RustEmbed> {
    /// Subdirectory prefix inside the embedded tree, without a trailing `/`.
    prefix: String,
    /// Asset type carrying the embedded files.
    _assets: PhantomData<A>,
}

impl<A: RustEmbed> EmbeddedDir<A> {
    /// Creates a view over the embedded assets rooted at `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        while prefix.ends_with('/') {
            prefix.pop();
        }
        Self { prefix, _assets: PhantomData }
    }

    /// Full embedded path for a named entry.
    fn asset_path(&self, name: &str) -> String {
        if self.prefix.is_empty() { name.to_string() } else { format!("{}/{name}", self.prefix) }
    }
}

impl<A: RustEmbed + Send + Sync> TranslationDir for EmbeddedDir<A> {
    fn entries(&self) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for file in A::iter() {
            let path = file.as_ref();
            let relative = if self.prefix.is_empty() {
                path
            } else {
                match path.strip_prefix(self.prefix.as_str()).and_then(|rest| rest.strip_prefix('/')) {
                    Some(rest) => rest,
                    None => continue,
                }
            };
            // 入れ子のファイルは直下のディレクトリ名として一度だけ報告する
            if let Some((dir_name, _)) = relative.split_once('/') {
                let entry = DirEntry { name: dir_name.to_string(), is_dir: true };
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            } else {
                entries.push(DirEntry { name: relative.to_string(), is_dir: false });
            }
        }
        Ok(entries)
    }

    fn read(&self, name: &str) -> io::Result<String> {
        let path = self.asset_path(name);
        let file = A::get(&path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no embedded asset: {path}"))
        })?;
        Ok(String::from_utf8_lossy(file.data.as_ref()).into_owned())
    }
}
