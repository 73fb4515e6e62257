use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub type TaskId = String;

/// Period tag for the "today" bucket of the day block.
pub const PERIOD_TODAY: &str = "today";
/// Generic period tag; moved tasks are reset to it.
pub const PERIOD_CURRENT: &str = "current";
/// Period tag for the look-ahead buckets of the week and month blocks.
pub const PERIOD_NEXT_SIX: &str = "next-6";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeBlock {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub time_block: TimeBlock,
    pub time_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Subtask {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Task counts for one project, keyed by the project's name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary<'a> {
    pub project: &'a Project,
    pub task_count: usize,
    pub completed_count: usize,
}

/// The authoritative task and project sequences of one session.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Workspace {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown time block: {0}")]
    UnknownTimeBlock(String),
    #[error("project name must not be empty")]
    EmptyProjectName,
    #[error("project already exists: {0}")]
    DuplicateProject(String),
}

impl TimeBlock {
    pub const ALL: [TimeBlock; 4] = [
        TimeBlock::Day,
        TimeBlock::Week,
        TimeBlock::Month,
        TimeBlock::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBlock::Day => "day",
            TimeBlock::Week => "week",
            TimeBlock::Month => "month",
            TimeBlock::Year => "year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeBlock::Day => "Day",
            TimeBlock::Week => "Week",
            TimeBlock::Month => "Month",
            TimeBlock::Year => "Year",
        }
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeBlock {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TimeBlock::ALL
            .into_iter()
            .find(|block| block.as_str() == wanted)
            .ok_or_else(|| ModelError::UnknownTimeBlock(s.to_string()))
    }
}

impl Task {
    pub fn new(
        id: TaskId,
        text: String,
        project: Option<String>,
        time_block: TimeBlock,
        time_period: impl Into<String>,
        day: Option<u8>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Task {
            id,
            text,
            completed: false,
            project,
            subtasks: Vec::new(),
            time_block,
            time_period: time_period.into(),
            day,
            created_at,
        }
    }

    pub fn find_subtask_index(&self, id: &str) -> Option<usize> {
        self.subtasks.iter().position(|s| s.id == id)
    }
}

impl Subtask {
    pub fn new(id: TaskId, text: String, project: Option<String>) -> Self {
        Subtask {
            id,
            text,
            completed: false,
            project,
        }
    }
}

impl Workspace {
    pub fn new(tasks: Vec<Task>, projects: Vec<Project>) -> Self {
        Workspace { tasks, projects }
    }

    pub fn find_task_index(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.find_task_index(id).map(|idx| &self.tasks[idx])
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.find_task_index(id).is_some()
    }

    /// Appends to the end of the task sequence. Text is not checked for duplicates.
    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Runs `f` against the task with `id`. Returns false when no task matches.
    pub fn update_task<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Task),
    {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }

    pub fn toggle_task(&mut self, id: &str) -> bool {
        self.update_task(id, |task| task.completed = !task.completed)
    }

    /// Flips the first subtask with `id`, scanning tasks in store order.
    pub fn toggle_subtask(&mut self, id: &str) -> bool {
        for task in &mut self.tasks {
            if let Some(idx) = task.find_subtask_index(id) {
                let subtask = &mut task.subtasks[idx];
                subtask.completed = !subtask.completed;
                return true;
            }
        }
        false
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        before != self.tasks.len()
    }

    /// Removes every task whose id is listed; unknown ids are ignored.
    pub fn delete_tasks(&mut self, ids: &[TaskId]) -> usize {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = self.tasks.len();
        self.tasks.retain(|t| !wanted.contains(t.id.as_str()));
        let removed = before - self.tasks.len();
        if removed > 0 {
            info!(removed, "deleted tasks");
        }
        removed
    }

    /// Reassigns the listed tasks to `target` and resets their period to
    /// [`PERIOD_CURRENT`].
    pub fn move_tasks(&mut self, ids: &[TaskId], target: TimeBlock) -> usize {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut moved = 0;
        for task in self
            .tasks
            .iter_mut()
            .filter(|t| wanted.contains(t.id.as_str()))
        {
            task.time_block = target;
            task.time_period = PERIOD_CURRENT.to_string();
            moved += 1;
        }
        if moved > 0 {
            info!(moved, target = %target, "moved tasks");
        }
        moved
    }

    /// Creates a project. Names are the linking key for task tags, so empty
    /// and duplicate names are rejected.
    pub fn add_project(
        &mut self,
        name: &str,
        description: &str,
        created_at: DateTime<Utc>,
    ) -> Result<&Project, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyProjectName);
        }
        if self.resolve_project(name).is_some() {
            return Err(ModelError::DuplicateProject(name.to_string()));
        }
        self.projects.push(Project {
            id: generate_id(),
            name: name.to_string(),
            description: description.trim().to_string(),
            created_at,
        });
        let idx = self.projects.len() - 1;
        Ok(&self.projects[idx])
    }

    /// Looks up the project a tag refers to.
    pub fn resolve_project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn project_summaries(&self) -> Vec<ProjectSummary<'_>> {
        self.projects
            .iter()
            .map(|project| {
                let tagged = self
                    .tasks
                    .iter()
                    .filter(|t| t.project.as_deref() == Some(project.name.as_str()));
                let (task_count, completed_count) =
                    tagged.fold((0usize, 0usize), |(all, done), t| {
                        (all + 1, done + usize::from(t.completed))
                    });
                ProjectSummary {
                    project,
                    task_count,
                    completed_count,
                }
            })
            .collect()
    }

    /// Distinct tags on tasks and subtasks that match no project, sorted.
    pub fn unresolved_project_tags(&self) -> Vec<String> {
        let task_tags = self.tasks.iter().filter_map(|t| t.project.as_deref());
        let subtask_tags = self
            .tasks
            .iter()
            .flat_map(|t| t.subtasks.iter())
            .filter_map(|s| s.project.as_deref());
        task_tags
            .chain(subtask_tags)
            .filter(|tag| self.resolve_project(tag).is_none())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Fresh identifier: base-36 millisecond timestamp followed by random characters.
pub fn generate_id() -> TaskId {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
