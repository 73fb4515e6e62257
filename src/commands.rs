use crate::cli::{ThemeAction, ViewArgs};
use anyhow::{Context as _, Result};
use std::env;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use timeblock::calendar::WeekCursor;
use timeblock::config::Config;
use timeblock::filter::{filter_tasks, restrict_to_project, FilteredView};
use timeblock::model::{Task, TimeBlock};
use timeblock::selection::ViewSelection;
use timeblock::session::Session;
use timeblock::storage::{
    init_project_store, load_theme, locate_store, save_theme, FileStore, StoreLocation, StoreScope,
    Theme,
};

pub struct Context {
    config: Config,
    data_dir: Option<PathBuf>,
}

impl Context {
    pub fn new(config: Config, data_dir: Option<PathBuf>) -> Self {
        Context { config, data_dir }
    }

    fn location(&self) -> Result<StoreLocation> {
        if let Some(dir) = self
            .data_dir
            .clone()
            .or_else(|| self.config.data_dir_override())
        {
            return Ok(StoreLocation {
                dir,
                scope: StoreScope::Global,
            });
        }
        let cwd = env::current_dir()?;
        locate_store(&cwd)
    }

    fn open_store(&self) -> Result<FileStore> {
        let location = self.location()?;
        location
            .open()
            .with_context(|| format!("opening task store at {}", location.dir.display()))
    }

    fn open_session(&self, view: &ViewArgs) -> Result<Session<FileStore>> {
        let view = self.resolve_view(view)?;
        Ok(Session::restore(self.open_store()?)?.with_view(view))
    }

    fn resolve_view(&self, args: &ViewArgs) -> Result<ViewSelection> {
        if args.block.is_none() && args.period.is_none() && args.day.is_none() {
            return self.config.default_view();
        }
        let block = match (args.block, args.day) {
            (Some(block), _) => block,
            (None, Some(_)) => TimeBlock::Day,
            (None, None) => self.config.default_view.block,
        };
        Ok(ViewSelection::from_tags(
            block,
            args.period.as_deref(),
            args.day,
        )?)
    }
}

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let location = init_project_store(&cwd)?;
    println!("Initialized task store at {}", location.dir.display());
    Ok(())
}

pub fn add(ctx: &Context, lines: Vec<String>, view: &ViewArgs) -> Result<()> {
    let raw = if lines.is_empty() {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading quick entry from stdin")?;
        buf
    } else {
        lines.join("\n")
    };
    let mut session = ctx.open_session(view)?;
    let ids = session.quick_entry(&raw)?;
    if ids.is_empty() {
        println!("Nothing to add");
        return Ok(());
    }
    println!("Added {} task(s) to {}", ids.len(), session.view().title());
    for id in ids {
        if let Some(task) = session.workspace().find_task(&id) {
            print_task(task);
        }
    }
    Ok(())
}

pub fn list(ctx: &Context, view: &ViewArgs, project: Option<String>) -> Result<()> {
    let session = ctx.open_session(view)?;
    let mut filtered = session.visible();
    let mut title = session.view().title();
    if let Some(ref name) = project {
        filtered = restrict_to_project(filtered, name);
        title = format!("{} @{}", title, name);
    }
    println!("{}", title);
    print_view(&filtered);
    Ok(())
}

pub fn toggle(ctx: &Context, id: &str) -> Result<()> {
    let mut session = ctx.open_session(&ViewArgs::default())?;
    if session.toggle_task(id)? {
        if let Some(task) = session.workspace().find_task(id) {
            print_task(task);
        }
    } else {
        println!("No task {}", id);
    }
    Ok(())
}

pub fn toggle_subtask(ctx: &Context, id: &str) -> Result<()> {
    let mut session = ctx.open_session(&ViewArgs::default())?;
    if session.toggle_subtask(id)? {
        println!("Toggled subtask {}", id);
    } else {
        println!("No subtask {}", id);
    }
    Ok(())
}

pub fn delete(
    ctx: &Context,
    ids: Vec<String>,
    all_visible: bool,
    view: &ViewArgs,
    yes: bool,
) -> Result<()> {
    let mut session = ctx.open_session(view)?;
    let count = select(&mut session, &ids, all_visible);
    if count == 0 {
        println!("Nothing to delete");
        return Ok(());
    }
    if needs_confirmation(count, all_visible, yes)
        && !confirm(&format!("Delete {} selected task(s)?", count))?
    {
        println!("Cancelled");
        return Ok(());
    }
    let removed = session.delete_selected()?;
    println!("Deleted {} task(s)", removed);
    Ok(())
}

pub fn move_tasks(
    ctx: &Context,
    ids: Vec<String>,
    to: TimeBlock,
    all_visible: bool,
    view: &ViewArgs,
) -> Result<()> {
    let mut session = ctx.open_session(view)?;
    if select(&mut session, &ids, all_visible) == 0 {
        println!("Nothing to move");
        return Ok(());
    }
    let moved = session.move_selected(to)?;
    println!("Moved {} task(s) to {}", moved, to.label());
    Ok(())
}

pub fn add_project(ctx: &Context, name: &str, description: &str) -> Result<()> {
    let mut session = ctx.open_session(&ViewArgs::default())?;
    let project = session.add_project(name, description)?;
    println!("Created project {} ({})", project.name, project.id);
    Ok(())
}

pub fn list_projects(ctx: &Context) -> Result<()> {
    let session = ctx.open_session(&ViewArgs::default())?;
    let summaries = session.workspace().project_summaries();
    if summaries.is_empty() {
        println!("No projects yet");
    }
    for summary in summaries {
        println!(
            "{}  {}/{} done",
            summary.project.name, summary.completed_count, summary.task_count
        );
        if !summary.project.description.is_empty() {
            println!("    {}", summary.project.description);
        }
    }
    let unresolved = session.workspace().unresolved_project_tags();
    if !unresolved.is_empty() {
        println!();
        println!("Tags without a project: {}", unresolved.join(", "));
    }
    Ok(())
}

pub fn week(ctx: &Context, offset: i64) -> Result<()> {
    let session = ctx.open_session(&ViewArgs::default())?;
    let mut cursor = WeekCursor::today();
    cursor.shift(offset)?;
    println!("{}", cursor.label());
    let today = WeekCursor::today().anchor();
    for column in cursor.day_columns(today) {
        let view = ViewSelection::weekday(column.index.get())?;
        let stats = filter_tasks(session.tasks(), &view).stats;
        let marker = if column.is_today { "*" } else { " " };
        println!(
            "{} {:<13} {} task(s), {} done",
            marker,
            column.label(),
            stats.total,
            stats.completed
        );
    }
    Ok(())
}

pub fn export(ctx: &Context, out: Option<PathBuf>) -> Result<()> {
    let session = ctx.open_session(&ViewArgs::default())?;
    let dir = match out.or_else(|| ctx.config.export_dir.clone()) {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let path = session.export().write_to(&dir)?;
    println!("Exported to {}", path.display());
    Ok(())
}

pub fn theme(ctx: &Context, action: ThemeAction) -> Result<()> {
    let mut store = ctx.open_store()?;
    let current = load_theme(&store)?;
    let next = match action {
        ThemeAction::Show => {
            println!("{}", current);
            return Ok(());
        }
        ThemeAction::Toggle => current.toggled(),
        ThemeAction::Set { name } => name.parse::<Theme>()?,
    };
    save_theme(&mut store, next)?;
    println!("Theme set to {}", next);
    Ok(())
}

fn select(session: &mut Session<FileStore>, ids: &[String], all_visible: bool) -> usize {
    if all_visible {
        session.select_all_visible();
    }
    for id in ids {
        if !session.select(id) && !session.selected().contains(id) {
            eprintln!("skipping unknown task {}", id);
        }
    }
    session.selected().len()
}

/// Deleting a whole view, or more than one task, asks first.
fn needs_confirmation(count: usize, all_visible: bool, yes: bool) -> bool {
    !yes && (all_visible || count > 1)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_view(view: &FilteredView<'_>) {
    if view.visible.is_empty() {
        println!("  No tasks yet");
    }
    for task in &view.visible {
        print_task(task);
    }
    println!(
        "{} total, {} completed, {}%",
        view.stats.total, view.stats.completed, view.stats.percent_complete
    );
}

fn print_task(task: &Task) {
    let mut meta = vec![task.time_block.label().to_string()];
    if let Some(project) = &task.project {
        meta.insert(0, format!("@{}", project));
    }
    println!(
        "  [{}] {}: {}  ({})",
        check(task.completed),
        task.id,
        task.text,
        meta.join(", ")
    );
    for subtask in &task.subtasks {
        let project = subtask
            .project
            .as_ref()
            .map(|p| format!("  @{}", p))
            .unwrap_or_default();
        println!(
            "      [{}] {}: {}{}",
            check(subtask.completed),
            subtask.id,
            subtask.text,
            project
        );
    }
}

fn check(done: bool) -> char {
    if done {
        'x'
    } else {
        ' '
    }
}
