use crate::model::{Project, Task, Workspace};
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub const TASKS_KEY: &str = "tasks";
pub const PROJECTS_KEY: &str = "projects";
pub const THEME_KEY: &str = "theme";

const PROJECT_DIR: &str = ".timeblock";

/// String blobs addressed by key; each `set` replaces the whole value.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("invalid blob key: {:?}", key);
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("reading {:?}", path))?;
        let data = String::from_utf8(bytes).unwrap_or_else(|err| {
            warn!(key, error = %err, "stored data is not valid UTF-8");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        });
        Ok(Some(data))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::write(&path, value).with_context(|| format!("writing {:?}", path))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub dir: PathBuf,
    pub scope: StoreScope,
}

impl StoreLocation {
    pub fn open(&self) -> Result<FileStore> {
        FileStore::open(&self.dir)
    }
}

pub fn init_project_store(start: &Path) -> Result<StoreLocation> {
    let dir = start.join(PROJECT_DIR);
    fs::create_dir_all(&dir).context("failed to create .timeblock directory")?;
    let location = StoreLocation {
        dir,
        scope: StoreScope::Project,
    };
    let mut store = location.open()?;
    if store.get(TASKS_KEY)?.is_none() {
        save_workspace(&mut store, &Workspace::default())?;
    }
    Ok(location)
}

/// Nearest `.timeblock` directory at or above `start`, else the per-user data directory.
pub fn locate_store(start: &Path) -> Result<StoreLocation> {
    if let Some(dir) = find_project_store(start) {
        return Ok(StoreLocation {
            dir,
            scope: StoreScope::Project,
        });
    }
    Ok(StoreLocation {
        dir: global_store_dir()?,
        scope: StoreScope::Global,
    })
}

fn find_project_store(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_store_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "timeblock").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Writes both sequences, one key each.
pub fn save_workspace(store: &mut impl BlobStore, workspace: &Workspace) -> Result<()> {
    let tasks = serde_json::to_string(&workspace.tasks).context("serializing tasks")?;
    let projects = serde_json::to_string(&workspace.projects).context("serializing projects")?;
    store.set(TASKS_KEY, &tasks)?;
    store.set(PROJECTS_KEY, &projects)?;
    debug!(
        tasks = workspace.tasks.len(),
        projects = workspace.projects.len(),
        "saved workspace"
    );
    Ok(())
}

/// Reads both sequences. Missing keys and unparsable blobs come back empty;
/// only read failures are errors.
pub fn load_workspace(store: &impl BlobStore) -> Result<Workspace> {
    let tasks: Vec<Task> = load_collection(store, TASKS_KEY)?;
    let projects: Vec<Project> = load_collection(store, PROJECTS_KEY)?;
    Ok(Workspace::new(tasks, projects))
}

fn load_collection<T: DeserializeOwned>(store: &impl BlobStore, key: &str) -> Result<Vec<T>> {
    let Some(data) = store.get(key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&data) {
        Ok(items) => Ok(items),
        Err(err) => {
            warn!(key, error = %err, "stored data is unreadable, starting empty");
            Ok(Vec::new())
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(String);

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

pub fn load_theme(store: &impl BlobStore) -> Result<Theme> {
    let Some(data) = store.get(THEME_KEY)? else {
        return Ok(Theme::default());
    };
    Ok(serde_json::from_str(&data).unwrap_or_else(|err| {
        warn!(error = %err, "stored theme is unreadable, using default");
        Theme::default()
    }))
}

pub fn save_theme(store: &mut impl BlobStore, theme: Theme) -> Result<()> {
    let data = serde_json::to_string(&theme).context("serializing theme")?;
    store.set(THEME_KEY, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Subtask, TimeBlock};
    use crate::parser::parse_quick_entry;
    use crate::selection::ViewSelection;
    use chrono::Utc;

    fn sample_workspace() -> Workspace {
        let mut ws = Workspace::default();
        for task in parse_quick_entry(
            "Write report @work\n  outline\n  draft @writing\nWater plants",
            &ViewSelection::weekday(3).unwrap(),
        ) {
            ws.add_task(task);
        }
        ws.tasks[1].completed = true;
        ws.add_project("work", "day job", Utc::now()).unwrap();
        ws
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let ws = sample_workspace();
        let mut store = MemoryStore::new();
        save_workspace(&mut store, &ws).unwrap();
        let restored = load_workspace(&store).unwrap();
        assert_eq!(restored, ws);
        let subtasks: Vec<&str> = restored.tasks[0]
            .subtasks
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(subtasks, vec!["outline", "draft"]);
    }

    #[test]
    fn missing_data_restores_empty() {
        let store = MemoryStore::new();
        assert_eq!(load_workspace(&store).unwrap(), Workspace::default());
    }

    #[test]
    fn corrupted_blob_restores_empty() {
        let ws = sample_workspace();
        let mut store = MemoryStore::new();
        save_workspace(&mut store, &ws).unwrap();
        store.set(TASKS_KEY, "{not json").unwrap();
        let restored = load_workspace(&store).unwrap();
        assert!(restored.tasks.is_empty());
        assert_eq!(restored.projects, ws.projects);
    }

    #[test]
    fn non_utf8_file_restores_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        let ws = sample_workspace();
        save_workspace(&mut store, &ws).unwrap();
        fs::write(dir.path().join("tasks.json"), [0xff, 0xfe, b'[', b']']).unwrap();
        let restored = load_workspace(&store).unwrap();
        assert!(restored.tasks.is_empty());
        assert_eq!(restored.projects, ws.projects);
    }

    #[test]
    fn serialized_task_uses_camel_case_keys() {
        let mut ws = Workspace::default();
        let mut task = crate::model::Task::new(
            "t1".into(),
            "Plan".into(),
            Some("home".into()),
            TimeBlock::Week,
            "next-6",
            None,
            Utc::now(),
        );
        task.subtasks
            .push(Subtask::new("s1".into(), "step".into(), None));
        ws.add_task(task);
        let json = serde_json::to_value(&ws.tasks).unwrap();
        let first = &json[0];
        assert_eq!(first["timeBlock"], "week");
        assert_eq!(first["timePeriod"], "next-6");
        assert!(first.get("createdAt").is_some());
        assert!(first.get("day").is_none());
        assert_eq!(first["subtasks"][0]["text"], "step");
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ws = sample_workspace();
        let mut store = FileStore::open(dir.path().join("data")).unwrap();
        save_workspace(&mut store, &ws).unwrap();
        assert!(dir.path().join("data/tasks.json").exists());

        let reopened = FileStore::open(dir.path().join("data")).unwrap();
        assert_eq!(load_workspace(&reopened).unwrap(), ws);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn locate_prefers_nearest_project_store() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let created = init_project_store(dir.path()).unwrap();
        let found = locate_store(&nested).unwrap();
        assert_eq!(found.scope, StoreScope::Project);
        assert_eq!(found.dir, created.dir);
        let store = found.open().unwrap();
        assert_eq!(load_workspace(&store).unwrap(), Workspace::default());
    }

    #[test]
    fn theme_defaults_and_toggles() {
        let mut store = MemoryStore::new();
        assert_eq!(load_theme(&store).unwrap(), Theme::Light);
        save_theme(&mut store, Theme::Light.toggled()).unwrap();
        assert_eq!(load_theme(&store).unwrap(), Theme::Dark);
        store.set(THEME_KEY, "purple").unwrap();
        assert_eq!(load_theme(&store).unwrap(), Theme::Light);
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert!("neon".parse::<Theme>().is_err());
    }
}
