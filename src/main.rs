mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Context;
use timeblock::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = Config::load(args.config.as_deref())?;
    install_tracing(config.log_filter.as_deref());
    let ctx = Context::new(config, args.data_dir);
    match args.command {
        cli::Command::Init => commands::init(),
        cli::Command::Add { lines, view } => commands::add(&ctx, lines, &view),
        cli::Command::List { view, project } => commands::list(&ctx, &view, project),
        cli::Command::Toggle { id } => commands::toggle(&ctx, &id),
        cli::Command::ToggleSubtask { id } => commands::toggle_subtask(&ctx, &id),
        cli::Command::Delete {
            ids,
            all_visible,
            view,
            yes,
        } => commands::delete(&ctx, ids, all_visible, &view, yes),
        cli::Command::Move {
            ids,
            to,
            all_visible,
            view,
        } => commands::move_tasks(&ctx, ids, to, all_visible, &view),
        cli::Command::Project { action } => match action {
            cli::ProjectAction::Add { name, description } => {
                commands::add_project(&ctx, &name, &description)
            }
            cli::ProjectAction::List => commands::list_projects(&ctx),
        },
        cli::Command::Week { offset } => commands::week(&ctx, offset),
        cli::Command::Export { out } => commands::export(&ctx, out),
        cli::Command::Theme { action } => {
            commands::theme(&ctx, action.unwrap_or(cli::ThemeAction::Show))
        }
    }
}

/// `RUST_LOG` wins; otherwise the configured filter, otherwise warnings only.
fn install_tracing(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
