use crate::export::ExportSnapshot;
use crate::filter::{filter_tasks, FilteredView};
use crate::model::{Project, Task, TaskId, TimeBlock, Workspace};
use crate::parser::parse_quick_entry;
use crate::selection::ViewSelection;
use crate::storage::{load_workspace, save_workspace, BlobStore};
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::info;

pub struct Session<S: BlobStore> {
    workspace: Workspace,
    store: S,
    view: ViewSelection,
    selected: BTreeSet<TaskId>,
}

impl<S: BlobStore> Session<S> {
    /// Restores the workspace from `store`; no prior data starts empty.
    pub fn restore(store: S) -> Result<Self> {
        let workspace = load_workspace(&store)?;
        info!(
            tasks = workspace.tasks.len(),
            projects = workspace.projects.len(),
            "restored session"
        );
        Ok(Session {
            workspace,
            store,
            view: ViewSelection::default(),
            selected: BTreeSet::new(),
        })
    }

    pub fn with_view(mut self, view: ViewSelection) -> Self {
        self.view = view;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn tasks(&self) -> &[Task] {
        &self.workspace.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.workspace.projects
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn view(&self) -> &ViewSelection {
        &self.view
    }

    pub fn set_view(&mut self, view: ViewSelection) {
        self.view = view;
    }

    pub fn selected(&self) -> &BTreeSet<TaskId> {
        &self.selected
    }

    pub fn visible(&self) -> FilteredView<'_> {
        filter_tasks(&self.workspace.tasks, &self.view)
    }

    pub fn persist(&mut self) -> Result<()> {
        save_workspace(&mut self.store, &self.workspace)
    }

    /// Parses `raw` under the active view and appends the resulting tasks.
    pub fn quick_entry(&mut self, raw: &str) -> Result<Vec<TaskId>> {
        let tasks = parse_quick_entry(raw, &self.view);
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<TaskId> = tasks.iter().map(|t| t.id.clone()).collect();
        for task in tasks {
            self.workspace.add_task(task);
        }
        self.persist()?;
        info!(added = ids.len(), view = %self.view, "quick entry");
        Ok(ids)
    }

    pub fn add_task(&mut self, task: Task) -> Result<()> {
        self.workspace.add_task(task);
        self.persist()
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<bool> {
        let changed = self.workspace.toggle_task(id);
        self.persist_if(changed)
    }

    pub fn toggle_subtask(&mut self, id: &str) -> Result<bool> {
        let changed = self.workspace.toggle_subtask(id);
        self.persist_if(changed)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<bool> {
        self.selected.remove(id);
        let changed = self.workspace.delete_task(id);
        if changed {
            info!(id, "deleted task");
        }
        self.persist_if(changed)
    }

    pub fn delete_tasks(&mut self, ids: &[TaskId]) -> Result<usize> {
        for id in ids {
            self.selected.remove(id);
        }
        let removed = self.workspace.delete_tasks(ids);
        self.persist_if(removed > 0)?;
        Ok(removed)
    }

    pub fn move_tasks(&mut self, ids: &[TaskId], target: TimeBlock) -> Result<usize> {
        let moved = self.workspace.move_tasks(ids, target);
        self.persist_if(moved > 0)?;
        Ok(moved)
    }

    /// Adds or removes `id` from the selection. Unknown ids are ignored.
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            return true;
        }
        if !self.workspace.contains_task(id) {
            return false;
        }
        self.selected.insert(id.to_string())
    }

    pub fn select(&mut self, id: &str) -> bool {
        self.workspace.contains_task(id) && self.selected.insert(id.to_string())
    }

    /// Adds every task visible under the active view to the selection.
    pub fn select_all_visible(&mut self) -> usize {
        let ids: Vec<TaskId> = self
            .visible()
            .visible
            .iter()
            .map(|t| t.id.clone())
            .collect();
        let before = self.selected.len();
        self.selected.extend(ids);
        self.selected.len() - before
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn delete_selected(&mut self) -> Result<usize> {
        if self.selected.is_empty() {
            return Ok(0);
        }
        let ids = self.take_selection();
        self.delete_tasks(&ids)
    }

    /// Moves the selected tasks to `target` and clears the selection.
    pub fn move_selected(&mut self, target: TimeBlock) -> Result<usize> {
        if self.selected.is_empty() {
            return Ok(0);
        }
        let ids = self.take_selection();
        self.move_tasks(&ids, target)
    }

    pub fn add_project(&mut self, name: &str, description: &str) -> Result<Project> {
        let project = self
            .workspace
            .add_project(name, description, Utc::now())?
            .clone();
        self.persist()?;
        info!(name = %project.name, "created project");
        Ok(project)
    }

    pub fn export(&self) -> ExportSnapshot {
        ExportSnapshot::capture(&self.workspace, Utc::now())
    }

    fn take_selection(&mut self) -> Vec<TaskId> {
        std::mem::take(&mut self.selected).into_iter().collect()
    }

    fn persist_if(&mut self, changed: bool) -> Result<bool> {
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }
}
