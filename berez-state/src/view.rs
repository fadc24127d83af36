//! List/map view mode and its persisted preference.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

/// Key under which the mode is stored.
pub const VIEW_MODE_KEY: &str = "view_mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Map,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Map => "map",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Map,
            ViewMode::Map => ViewMode::List,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(ViewMode::List),
            "map" => Ok(ViewMode::Map),
            other => Err(format!("unknown view mode '{}', expected list or map", other)),
        }
    }
}

/// Pick the mode to open with: an explicit parameter wins, then the stored
/// preference, then list. Values that do not parse are skipped.
pub fn resolve_mode(param: Option<&str>, stored: Option<&str>) -> ViewMode {
    [param, stored]
        .into_iter()
        .flatten()
        .find_map(|value| value.parse().ok())
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the last view mode is kept between runs.
pub trait PreferenceStore {
    fn load(&self) -> Result<Option<String>, PreferenceError>;
    fn store(&self, mode: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    view_mode: Option<String>,
}

/// JSON file holding `{"view_mode": "list"}`.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<String>, PreferenceError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let prefs: Preferences = serde_json::from_str(&text)?;
        Ok(prefs.view_mode)
    }

    fn store(&self, mode: &str) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let prefs = Preferences {
            view_mode: Some(mode.to_string()),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&prefs)?)?;
        debug!("[Berez] view: stored {} in {}", mode, self.path.display());
        Ok(())
    }
}

/// In-memory store; clones share the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    value: Rc<RefCell<Option<String>>>,
}

impl MemoryPreferenceStore {
    pub fn new(initial: Option<&str>) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial.map(str::to_string))),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<String>, PreferenceError> {
        Ok(self.get())
    }

    fn store(&self, mode: &str) -> Result<(), PreferenceError> {
        *self.value.borrow_mut() = Some(mode.to_string());
        Ok(())
    }
}

/// Current view mode, persisted on every change.
pub struct ViewStateController {
    store: Box<dyn PreferenceStore>,
    mode: Cell<ViewMode>,
}

impl ViewStateController {
    /// Resolve the opening mode from `param` and the stored preference. A
    /// valid `param` that differs from what was stored is written back;
    /// opening without one never touches the store.
    pub fn open(store: impl PreferenceStore + 'static, param: Option<&str>) -> Self {
        let stored = store.load().unwrap_or_else(|e| {
            warn!("[Berez] view: ignoring unreadable preference: {}", e);
            None
        });
        let mode = resolve_mode(param, stored.as_deref());
        let controller = Self {
            store: Box::new(store),
            mode: Cell::new(mode),
        };
        let explicit = param.and_then(|p| p.parse::<ViewMode>().ok());
        if explicit.is_some() && stored.as_deref() != Some(mode.as_str()) {
            controller.persist();
        }
        controller
    }

    pub fn mode(&self) -> ViewMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: ViewMode) {
        self.mode.set(mode);
        self.persist();
    }

    pub fn toggle(&self) -> ViewMode {
        let mode = self.mode().toggled();
        self.set_mode(mode);
        mode
    }

    /// Storage failures are logged; the in-memory mode still changes.
    pub fn persist(&self) {
        if let Err(e) = self.store.store(self.mode().as_str()) {
            warn!("[Berez] view: could not persist view mode: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn load(&self) -> Result<Option<String>, PreferenceError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into())
        }
        fn store(&self, _mode: &str) -> Result<(), PreferenceError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into())
        }
    }

    #[test]
    fn test_resolve_mode_precedence() {
        assert_eq!(resolve_mode(Some("map"), Some("list")), ViewMode::Map);
        assert_eq!(resolve_mode(None, Some("map")), ViewMode::Map);
        assert_eq!(resolve_mode(None, None), ViewMode::List);
        assert_eq!(resolve_mode(Some("list"), Some("map")), ViewMode::List);
    }

    #[test]
    fn test_resolve_mode_skips_garbage() {
        assert_eq!(resolve_mode(Some("satellite"), Some("map")), ViewMode::Map);
        assert_eq!(resolve_mode(Some(""), Some("nope")), ViewMode::List);
        assert_eq!(resolve_mode(Some("MAP"), None), ViewMode::Map);
    }

    #[test]
    fn test_open_persists_resolved_mode() {
        let store = MemoryPreferenceStore::new(Some("list"));
        let view = ViewStateController::open(store.clone(), Some("map"));
        assert_eq!(view.mode(), ViewMode::Map);
        assert_eq!(store.get().as_deref(), Some("map"));
    }

    #[test]
    fn test_every_change_is_persisted() {
        let store = MemoryPreferenceStore::default();
        let view = ViewStateController::open(store.clone(), None);
        assert_eq!(view.mode(), ViewMode::List);
        assert_eq!(store.get(), None);

        assert_eq!(view.toggle(), ViewMode::Map);
        assert_eq!(store.get().as_deref(), Some("map"));

        view.set_mode(ViewMode::List);
        assert_eq!(store.get().as_deref(), Some("list"));
    }

    #[test]
    fn test_open_without_param_leaves_store_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let view = ViewStateController::open(FilePreferenceStore::new(&path), None);
        assert_eq!(view.mode(), ViewMode::List);
        assert!(!path.exists());

        let garbage = ViewStateController::open(FilePreferenceStore::new(&path), Some("globe"));
        assert_eq!(garbage.mode(), ViewMode::List);
        assert!(!path.exists());

        let stored = MemoryPreferenceStore::new(Some("map"));
        ViewStateController::open(stored.clone(), Some("map"));
        assert_eq!(stored.get().as_deref(), Some("map"));
    }

    #[test]
    fn test_broken_store_does_not_block() {
        let view = ViewStateController::open(BrokenStore, Some("map"));
        assert_eq!(view.mode(), ViewMode::Map);
        assert_eq!(view.toggle(), ViewMode::List);
        assert_eq!(view.mode(), ViewMode::List);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let store = FilePreferenceStore::new(&path);

        assert_eq!(store.load().unwrap(), None);
        store.store("map").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("map"));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[VIEW_MODE_KEY], "map");

        let reopened = ViewStateController::open(FilePreferenceStore::new(&path), None);
        assert_eq!(reopened.mode(), ViewMode::Map);
    }

    #[test]
    fn test_file_store_rejects_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();
        let store = FilePreferenceStore::new(&path);
        assert!(matches!(store.load(), Err(PreferenceError::Json(_))));

        // A corrupt file falls back to the default until the next change.
        let view = ViewStateController::open(store, None);
        assert_eq!(view.mode(), ViewMode::List);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
        view.set_mode(ViewMode::Map);
        assert!(fs::read_to_string(&path).unwrap().contains("map"));
    }
}
