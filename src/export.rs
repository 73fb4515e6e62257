use crate::model::{Project, Task, Workspace};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only snapshot of everything the store holds.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub exported_at: DateTime<Utc>,
}

impl ExportSnapshot {
    pub fn capture(workspace: &Workspace, exported_at: DateTime<Utc>) -> Self {
        ExportSnapshot {
            tasks: workspace.tasks.clone(),
            projects: workspace.projects.clone(),
            exported_at,
        }
    }

    pub fn file_name(&self) -> String {
        format!("todo-export-{}.json", self.exported_at.format("%Y-%m-%d"))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing export")
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_json_pretty()?).with_context(|| format!("writing {:?}", path))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_quick_entry;
    use crate::selection::ViewSelection;
    use chrono::TimeZone;

    #[test]
    fn writes_dated_pretty_json() {
        let mut ws = Workspace::default();
        for task in parse_quick_entry("Pay rent @home", &ViewSelection::default()) {
            ws.add_task(task);
        }
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 18, 30, 0).unwrap();
        let snapshot = ExportSnapshot::capture(&ws, at);
        assert_eq!(snapshot.file_name(), "todo-export-2026-03-09.json");

        let dir = tempfile::tempdir().unwrap();
        let path = snapshot.write_to(dir.path()).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"tasks\""));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["tasks"][0]["project"], "home");
        assert!(value["exportedAt"].as_str().unwrap().starts_with("2026-03-09T18:30:00"));

        let back: ExportSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, snapshot);
    }
}
