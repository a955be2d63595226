//! Per-project scatter settings persistence.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use scene::settings::ScatterSettings;
use streaming::ProjectId;
use tracing::debug;

#[derive(Debug)]
pub enum SettingsError {
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Corrupt(msg) => write!(f, "settings file corrupt: {msg}"),
            SettingsError::Io(msg) => write!(f, "settings storage error: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

pub trait SettingsStore {
    /// `None` when the project has never been configured.
    fn load(&self, project: ProjectId) -> Result<Option<ScatterSettings>, SettingsError>;
    fn save(&mut self, project: ProjectId, settings: &ScatterSettings) -> Result<(), SettingsError>;

    fn load_or_default(&self, project: ProjectId) -> Result<ScatterSettings, SettingsError> {
        Ok(self.load(project)?.unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    projects: BTreeMap<ProjectId, ScatterSettings>,
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, project: ProjectId) -> Result<Option<ScatterSettings>, SettingsError> {
        Ok(self.projects.get(&project).cloned())
    }

    fn save(
        &mut self,
        project: ProjectId,
        settings: &ScatterSettings,
    ) -> Result<(), SettingsError> {
        self.projects.insert(project, settings.clone());
        Ok(())
    }
}

/// All projects in one JSON object keyed by project id.
///
/// A missing file reads as empty. Each write goes to its own uniquely named
/// temp file in the same directory, which is then persisted over the target.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, ScatterSettings>, SettingsError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(SettingsError::Io(format!("{}: {e}", self.path.display()))),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| SettingsError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn write_all(&self, all: &BTreeMap<String, ScatterSettings>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(all).map_err(|e| SettingsError::Io(e.to_string()))?;
        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| SettingsError::Io(format!("{}: {e}", dir.display())))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| SettingsError::Io(format!("{}: {e}", dir.display())))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| SettingsError::Io(format!("{}: {e}", tmp.path().display())))?;
        tmp.persist(&self.path)
            .map_err(|e| SettingsError::Io(format!("{}: {}", self.path.display(), e.error)))?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self, project: ProjectId) -> Result<Option<ScatterSettings>, SettingsError> {
        Ok(self.read_all()?.remove(&project.to_string()))
    }

    fn save(
        &mut self,
        project: ProjectId,
        settings: &ScatterSettings,
    ) -> Result<(), SettingsError> {
        let mut all = self.read_all()?;
        all.insert(project.to_string(), settings.clone());
        self.write_all(&all)?;
        debug!(%project, path = %self.path.display(), "scatter settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonFileSettingsStore, MemorySettingsStore, SettingsError, SettingsStore};
    use pretty_assertions::assert_eq;
    use scene::settings::ScatterSettings;
    use streaming::ProjectId;

    #[test]
    fn memory_store_round_trips_per_project() {
        let mut store = MemorySettingsStore::default();
        assert_eq!(store.load(ProjectId(1)).unwrap(), None);
        let s = ScatterSettings::default().with_class_field("sentiment");
        store.save(ProjectId(1), &s).unwrap();
        assert_eq!(store.load(ProjectId(1)).unwrap(), Some(s));
        assert_eq!(store.load_or_default(ProjectId(2)).unwrap(), ScatterSettings::default());
    }

    #[test]
    fn file_store_keeps_other_projects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scatter_settings.json");
        let mut store = JsonFileSettingsStore::new(&path);

        assert_eq!(store.load(ProjectId(7)).unwrap(), None);
        store
            .save(ProjectId(7), &ScatterSettings::default().with_class_field("topic"))
            .unwrap();
        store.save(ProjectId(8), &ScatterSettings::default()).unwrap();

        let reopened = JsonFileSettingsStore::new(&path);
        assert_eq!(
            reopened.load(ProjectId(7)).unwrap().map(|s| s.class_field),
            Some("topic".to_string())
        );
        assert!(reopened.load(ProjectId(8)).unwrap().is_some());

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("scatter_settings.json")]);
    }

    #[test]
    fn concurrent_saves_always_leave_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scatter_settings.json");

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut store = JsonFileSettingsStore::new(path);
                    let settings = ScatterSettings::default().with_class_field(format!("f{i}"));
                    for _ in 0..10 {
                        store.save(ProjectId(i), &settings).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Every save replaced the whole file atomically, so it always parses.
        let store = JsonFileSettingsStore::new(&path);
        let present = (0..8u64)
            .filter(|i| store.load(ProjectId(*i)).unwrap().is_some())
            .count();
        assert!(present >= 1);
        for i in 0..8u64 {
            if let Some(s) = store.load(ProjectId(i)).unwrap() {
                assert_eq!(s.class_field, format!("f{i}"));
            }
        }
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scatter_settings.json");
        std::fs::write(&path, "{ nope").unwrap();
        let store = JsonFileSettingsStore::new(&path);
        assert!(matches!(store.load(ProjectId(1)), Err(SettingsError::Corrupt(_))));
    }
}
