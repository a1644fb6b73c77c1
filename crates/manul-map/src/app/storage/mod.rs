//! Preference storage
//!
//! A tiny string key/value store with two platform backends:
//!
//! - `WebLocalStorage` (wasm32) keeps values in `window.localStorage`.
//! - `FileStorage` (native) keeps a single JSON object in the user's
//!   configuration directory, rewritten on every change.
//!
//! [`Preferences`] sits on top and knows the three keys the map remembers
//! between visits. Storage failures never stop the app; they are logged and
//! the defaults are used.

use crate::app::tiles::TileTheme;
use thiserror::Error;

pub const THEME_KEY: &str = "manul_map_theme";
pub const SEARCH_COLLAPSED_KEY: &str = "manul_map_search_collapsed";
pub const UI_HIDDEN_KEY: &str = "manul_map_ui_hidden";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    #[cfg(not(target_arch = "wasm32"))]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Platform storage error: {0}")]
    Platform(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value backend
pub trait StorageBackend {
    fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// `Ok(None)` when the key is missing
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;
}

/// What the map remembers between visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub theme: TileTheme,
    pub search_collapsed: bool,
    pub ui_hidden: bool,
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn read(backend: &dyn StorageBackend, key: &str) -> Option<String> {
    match backend.get_string(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, "Failed to read preference: {e}");
            None
        }
    }
}

fn write(backend: &dyn StorageBackend, key: &str, value: &str) {
    match backend.set_string(key, value) {
        Ok(()) => tracing::trace!(key, value, "Saved preference"),
        Err(e) => tracing::warn!(key, "Failed to save preference: {e}"),
    }
}

impl Preferences {
    /// Read all preferences; missing or unreadable keys keep their default
    pub fn load(backend: &dyn StorageBackend) -> Self {
        let prefs = Self {
            theme: read(backend, THEME_KEY)
                .map(|k| TileTheme::from_key(&k))
                .unwrap_or_default(),
            search_collapsed: read(backend, SEARCH_COLLAPSED_KEY).as_deref() == Some("1"),
            ui_hidden: read(backend, UI_HIDDEN_KEY).as_deref() == Some("1"),
        };
        tracing::debug!(?prefs, "Loaded preferences");
        prefs
    }

    pub fn set_theme(&mut self, theme: TileTheme, backend: Option<&dyn StorageBackend>) {
        self.theme = theme;
        if let Some(backend) = backend {
            write(backend, THEME_KEY, theme.key());
        }
    }

    pub fn set_search_collapsed(&mut self, collapsed: bool, backend: Option<&dyn StorageBackend>) {
        self.search_collapsed = collapsed;
        if let Some(backend) = backend {
            write(backend, SEARCH_COLLAPSED_KEY, flag(collapsed));
        }
    }

    pub fn set_ui_hidden(&mut self, hidden: bool, backend: Option<&dyn StorageBackend>) {
        self.ui_hidden = hidden;
        if let Some(backend) = backend {
            write(backend, UI_HIDDEN_KEY, flag(hidden));
        }
    }
}

//
// Web implementation (localStorage)
//
#[cfg(target_arch = "wasm32")]
mod web_storage {
    use super::*;
    use web_sys::Storage;

    fn local_storage() -> Result<Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Platform("no window".into()))?
            .local_storage()
            .map_err(|e| StorageError::Platform(format!("local_storage() failed: {:?}", e)))?
            .ok_or_else(|| StorageError::Platform("local_storage not available".into()))
    }

    /// Browser-backed localStorage implementation.
    pub struct WebLocalStorage;

    impl StorageBackend for WebLocalStorage {
        fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
            local_storage()?
                .set_item(key, value)
                .map_err(|e| StorageError::Platform(format!("set_item error: {:?}", e)))
        }

        fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
            local_storage()?
                .get_item(key)
                .map_err(|e| StorageError::Platform(format!("get_item error: {:?}", e)))
        }
    }

    pub fn default_backend() -> StorageResult<Box<dyn StorageBackend>> {
        // Fail early if storage is disabled (private mode, sandboxed iframe)
        local_storage()?;
        Ok(Box::new(WebLocalStorage))
    }
}

//
// Native file-backed implementation
//
#[cfg(not(target_arch = "wasm32"))]
mod file_storage {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Single JSON file holding a map of key -> string value
    ///
    /// The file is read once on creation; every mutation rewrites it.
    pub struct FileStorage {
        path: PathBuf,
        inner: Mutex<HashMap<String, String>>,
    }

    impl FileStorage {
        /// `%APPDATA%/ManulMap/storage.json` on Windows,
        /// `$HOME/.config/manul-map/storage.json` elsewhere
        fn default_storage_path() -> PathBuf {
            if cfg!(windows)
                && let Ok(appdata) = std::env::var("APPDATA")
            {
                return Path::new(&appdata).join("ManulMap").join("storage.json");
            }

            if let Ok(home) = std::env::var("HOME") {
                return Path::new(&home)
                    .join(".config")
                    .join("manul-map")
                    .join("storage.json");
            }

            Path::new(".").join("manul-map-storage.json")
        }

        pub fn new_with_path(path: Option<PathBuf>) -> StorageResult<Self> {
            let path = path.unwrap_or_else(Self::default_storage_path);

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Io(format!("Failed to create storage directory: {}", e))
                })?;
            }

            let map = match fs::read_to_string(&path) {
                Ok(s) if !s.trim().is_empty() => serde_json::from_str::<HashMap<String, String>>(&s)
                    .map_err(|e| StorageError::Json(format!("Failed to parse storage JSON: {}", e)))?,
                Ok(_) => HashMap::new(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
                Err(e) => return Err(StorageError::Io(format!("Failed to read storage file: {}", e))),
            };

            Ok(FileStorage {
                path,
                inner: Mutex::new(map),
            })
        }

        fn flush_locked(&self, locked: &HashMap<String, String>) -> StorageResult<()> {
            let s = serde_json::to_string_pretty(locked).map_err(|e| StorageError::Json(e.to_string()))?;
            fs::write(&self.path, s).map_err(|e| StorageError::Io(format!("write failed: {}", e)))
        }
    }

    impl StorageBackend for FileStorage {
        fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
            let mut guard = self
                .inner
                .lock()
                .map_err(|e| StorageError::Platform(format!("mutex poisoned: {:?}", e)))?;
            guard.insert(key.to_string(), value.to_string());
            self.flush_locked(&guard)
        }

        fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
            let guard = self
                .inner
                .lock()
                .map_err(|e| StorageError::Platform(format!("mutex poisoned: {:?}", e)))?;
            Ok(guard.get(key).cloned())
        }
    }

    pub fn default_backend() -> StorageResult<Box<dyn StorageBackend>> {
        Ok(Box::new(FileStorage::new_with_path(None)?))
    }

}

#[cfg(target_arch = "wasm32")]
pub use web_storage::default_backend as default_storage_backend;

#[cfg(not(target_arch = "wasm32"))]
pub use file_storage::default_backend as default_storage_backend;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory backend; `fail` makes every call error
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        pub values: RefCell<HashMap<String, String>>,
        pub fail: bool,
    }

    impl StorageBackend for MemoryStorage {
        fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.fail {
                return Err(StorageError::Platform("quota exceeded".into()));
            }
            self.values.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
            if self.fail {
                return Err(StorageError::Platform("access denied".into()));
            }
            Ok(self.values.borrow().get(key).cloned())
        }
    }

    #[test]
    fn test_defaults_when_empty() {
        let storage = MemoryStorage::default();
        assert_eq!(Preferences::load(&storage), Preferences::default());
        assert_eq!(Preferences::default().theme, TileTheme::Dark);
    }

    #[test]
    fn test_round_trip_through_keys() {
        let storage = MemoryStorage::default();
        let mut prefs = Preferences::default();
        prefs.set_theme(TileTheme::Relief, Some(&storage));
        prefs.set_search_collapsed(true, Some(&storage));
        prefs.set_ui_hidden(false, Some(&storage));

        {
            let values = storage.values.borrow();
            assert_eq!(values.get(THEME_KEY).map(String::as_str), Some("relief"));
            assert_eq!(values.get(SEARCH_COLLAPSED_KEY).map(String::as_str), Some("1"));
            assert_eq!(values.get(UI_HIDDEN_KEY).map(String::as_str), Some("0"));
        }
        assert_eq!(Preferences::load(&storage), prefs);
    }

    #[test]
    fn test_unknown_theme_and_flag_values() {
        let storage = MemoryStorage::default();
        storage.set_string(THEME_KEY, "neon").unwrap();
        storage.set_string(UI_HIDDEN_KEY, "true").unwrap();
        let prefs = Preferences::load(&storage);
        assert_eq!(prefs.theme, TileTheme::Dark);
        assert!(!prefs.ui_hidden);
    }

    #[test]
    fn test_failing_backend_is_ignored() {
        let storage = MemoryStorage {
            fail: true,
            ..Default::default()
        };
        let mut prefs = Preferences::load(&storage);
        assert_eq!(prefs, Preferences::default());
        prefs.set_search_collapsed(true, Some(&storage));
        assert!(prefs.search_collapsed);
    }
}
