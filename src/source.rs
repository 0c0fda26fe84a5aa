//! Lazily loaded, flattened translation table.
//!
//! A [`TranslationSource`] owns one process-lifetime table mapping dotted
//! keys (e.g. `en-US.greetings.hello`) to translated strings. The table is
//! built on first access from every `.yml`/`.yaml` file in the backing
//! directory and can be cleared at runtime to pick up edited files.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_yaml::Value;
use thiserror::Error;

use crate::fs::TranslationDir;

/// Errors raised while building the translation table.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Error when the directory listing itself fails
    #[error("Failed to list translation directory: {0}")]
    List(#[source] std::io::Error),
    /// Error when reading a translation file fails
    #[error("Failed to read translation file '{name}': {source}")]
    Read {
        /// File name within the translation directory
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Error when a translation file is not valid YAML
    #[error("Failed to parse translation file '{name}': {source}")]
    Parse {
        /// File name within the translation directory
        name: String,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Table contents and load marker, guarded together by one lock.
struct TableState {
    /// Flattened dotted key → translated string.
    values: HashMap<String, String>,
    /// True once a load attempt finished, even a failed one.
    loaded: bool,
}

/// Thread-safe translation table with lazy loading and explicit reload.
pub struct TranslationSource {
    /// Directory the table is built from.
    dir: Box<dyn TranslationDir>,
    /// ロック順序: このロックのみ。読み取りは read、ロードと reload は write。
    state: RwLock<TableState>,
}

impl TranslationSource {
    /// Creates an empty source bound to a translation directory.
    ///
    /// Nothing is read until the first [`get`](Self::get) or
    /// [`load_if_needed`](Self::load_if_needed).
    #[must_use]
    pub fn new(dir: Box<dyn TranslationDir>) -> Self {
        Self { dir, state: RwLock::new(TableState { values: HashMap::new(), loaded: false }) }
    }

    /// Looks up a flattened key, loading the table first if necessary.
    ///
    /// Returns the empty string when the key is absent. Load failures are
    /// logged and the table keeps whatever was merged before the failure;
    /// the request path never sees an error.
    pub fn get(&self, key: &str) -> String {
        if let Err(error) = self.load_if_needed() {
            tracing::warn!(%error, "Translation load failed, serving partial table");
        }
        self.state.read().values.get(key).cloned().unwrap_or_default()
    }

    /// Loads the table once, serializing concurrent first callers.
    ///
    /// The fast path only takes the read lock. On first call the write
    /// lock is held for the entire load, so no caller ever observes a
    /// partially merged table. `loaded` flips to true even when the load
    /// fails; a failed load is not retried until [`reload`](Self::reload).
    pub fn load_if_needed(&self) -> Result<(), LoadError> {
        if self.state.read().loaded {
            return Ok(());
        }
        let mut state = self.state.write();
        // 書き込みロック取得までの間に他スレッドがロード済みの場合がある
        if state.loaded {
            return Ok(());
        }
        let result = load(self.dir.as_ref(), &mut state.values);
        state.loaded = true;
        result
    }

    /// Clears the table so the next access reloads from the directory.
    pub fn reload(&self) {
        let mut state = self.state.write();
        state.values.clear();
        state.loaded = false;
        tracing::debug!("Translation table cleared, next access reloads");
    }
}

impl std::fmt::Debug for TranslationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("TranslationSource")
            .field("keys", &state.values.len())
            .field("loaded", &state.loaded)
            .finish_non_exhaustive()
    }
}

/// Merges every recognized file of `dir` into `values`.
///
/// Entries are processed in file-name order, so on duplicate keys the
/// lexicographically last file wins. The first read or parse error aborts
/// the remaining files; already merged entries stay in place.
fn load(dir: &dyn TranslationDir, values: &mut HashMap<String, String>) -> Result<(), LoadError> {
    let mut entries = dir.entries().map_err(LoadError::List)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in entries {
        if entry.is_dir {
            continue;
        }
        let Some(group) = locale_group(&entry.name) else {
            continue;
        };
        let text = dir
            .read(&entry.name)
            .map_err(|source| LoadError::Read { name: entry.name.clone(), source })?;
        let document: Value = serde_yaml::from_str(&text)
            .map_err(|source| LoadError::Parse { name: entry.name.clone(), source })?;
        flatten_yaml(&document, &format!("{group}."), values);
        tracing::debug!(file = %entry.name, locale_group = %group, "Merged translation file");
    }
    Ok(())
}

/// Derives the locale group from a translation file name.
///
/// Strips the `.yml`/`.yaml` extension, then keeps only the part before
/// the first remaining dot so that `en-US.common.yml` and
/// `en-US.errors.yml` both contribute to the `en-US` group. Returns
/// `None` for files without a recognized extension.
fn locale_group(file_name: &str) -> Option<&str> {
    let stem = file_name
        .strip_suffix(".yml")
        .or_else(|| file_name.strip_suffix(".yaml"))?;
    let stem = stem.strip_prefix('/').unwrap_or(stem);
    Some(stem.split('.').next().unwrap_or(stem))
}

/// Flattens a nested YAML mapping into `out` under a dotted path prefix.
///
/// Nested mappings recurse with `prefix + key + "."`; every other value
/// is stringified and stored at `prefix + key`. Mapping keys take their
/// natural string form, so numeric keys become their decimal text.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
///
/// use request_i18n::source::flatten_yaml;
///
/// let document = serde_yaml::from_str("greetings:\n  hello: Hello").unwrap();
/// let mut out = HashMap::new();
/// flatten_yaml(&document, "en-US.", &mut out);
/// assert_eq!(out.get("en-US.greetings.hello"), Some(&"Hello".to_string()));
/// ```
pub fn flatten_yaml(value: &Value, prefix: &str, out: &mut HashMap<String, String>) {
    let Value::Mapping(mapping) = value else {
        return;
    };
    for (key, val) in mapping {
        let key_text = scalar_text(key);
        if let Value::Mapping(_) = val {
            flatten_yaml(val, &format!("{prefix}{key_text}."), out);
        } else {
            out.insert(format!("{prefix}{key_text}"), scalar_text(val));
        }
    }
}

/// Natural string form of a YAML value.
///
/// Strings are taken verbatim; numbers and booleans use their scalar
/// text; null becomes the empty string. Anything else keeps its YAML
/// serialization as a single value.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default(),
    }
}
