use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use timeblock::TimeBlock;

#[derive(Parser, Debug)]
#[command(name = "timeblock", version, about = "Time-blocked task lists with quick entry")]
pub struct Cli {
    /// Path to a config file (defaults to the per-user config.yml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding task data (overrides config and project discovery)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

/// Which slice of the task list a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Time block: day, week, month or year
    #[arg(long, value_parser = parse_block)]
    pub block: Option<TimeBlock>,
    /// Period within the block (today, current, next-6)
    #[arg(long)]
    pub period: Option<String>,
    /// Weekday column, 0 (Sunday) to 6 (Saturday)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub day: Option<u8>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project-local task store in the current directory
    Init,
    /// Add tasks from quick-entry text; indent lines by two spaces for subtasks
    Add {
        /// Entry lines; read from stdin when omitted
        lines: Vec<String>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List the tasks visible in a view
    List {
        #[command(flatten)]
        view: ViewArgs,
        /// Only show tasks tagged with this project
        #[arg(long)]
        project: Option<String>,
    },
    /// Toggle a task's completion
    Toggle {
        /// Task id
        id: String,
    },
    /// Toggle a subtask's completion
    ToggleSubtask {
        /// Subtask id
        id: String,
    },
    /// Delete one or more tasks
    Delete {
        /// Task ids
        ids: Vec<String>,
        /// Delete every task visible in the view
        #[arg(long)]
        all_visible: bool,
        #[command(flatten)]
        view: ViewArgs,
        /// Skip the confirmation prompt for bulk deletes
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Move tasks to another time block
    Move {
        /// Task ids
        ids: Vec<String>,
        /// Destination block
        #[arg(long, value_parser = parse_block)]
        to: TimeBlock,
        /// Move every task visible in the view
        #[arg(long)]
        all_visible: bool,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Show a week with task counts per day
    Week {
        /// Weeks relative to the current one
        #[arg(
            long,
            default_value_t = 0,
            allow_hyphen_values = true,
            value_parser = clap::value_parser!(i64).range(-5200..=5200)
        )]
        offset: i64,
    },
    /// Write all tasks and projects to a JSON file
    Export {
        /// Output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show or change the colour theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Create a project
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List projects with task counts
    List,
}

#[derive(Subcommand, Debug)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set { name: String },
}

fn parse_block(raw: &str) -> Result<TimeBlock, String> {
    raw.parse().map_err(|err| format!("{err}"))
}
