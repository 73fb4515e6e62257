use crate::model::{Task, TimeBlock, PERIOD_NEXT_SIX, PERIOD_TODAY};
use crate::selection::{DayView, Span, ViewSelection};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub percent_complete: u8,
}

/// Visible tasks in store order, with statistics over exactly those tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    pub visible: Vec<&'a Task>,
    pub stats: Stats,
}

impl Stats {
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let (total, completed) = tasks.into_iter().fold((0usize, 0usize), |(all, done), t| {
            (all + 1, done + usize::from(t.completed))
        });
        Stats {
            total,
            completed,
            percent_complete: percent(completed, total),
        }
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round().clamp(0.0, 100.0) as u8
}

pub fn is_visible(task: &Task, view: &ViewSelection) -> bool {
    match view {
        ViewSelection::Day(DayView::Weekday(day)) => task.day == Some(day.get()),
        ViewSelection::Day(DayView::Today) => {
            task.time_block == TimeBlock::Day && task.time_period == PERIOD_TODAY
        }
        ViewSelection::Week(Span::Current) => {
            task.time_block == TimeBlock::Week
                || (task.time_block == TimeBlock::Day && falls_in_current_week(task))
        }
        ViewSelection::Week(Span::NextSix) => {
            task.time_block == TimeBlock::Week && task.time_period == PERIOD_NEXT_SIX
        }
        ViewSelection::Month(Span::Current) => {
            matches!(task.time_block, TimeBlock::Month | TimeBlock::Week)
                || (task.time_block == TimeBlock::Day && falls_in_current_month(task))
        }
        ViewSelection::Month(Span::NextSix) => {
            task.time_block == TimeBlock::Month && task.time_period == PERIOD_NEXT_SIX
        }
        ViewSelection::Year => matches!(
            task.time_block,
            TimeBlock::Year | TimeBlock::Month | TimeBlock::Week | TimeBlock::Day
        ),
        // No rule narrows this selection, so nothing is hidden.
        ViewSelection::Unscoped { .. } => true,
    }
}

/// Day tasks carry no date beyond `created_at`; week membership is not computed
/// and every day task counts as part of the current week.
fn falls_in_current_week(_task: &Task) -> bool {
    true
}

/// Same as [`falls_in_current_week`] for the month view.
fn falls_in_current_month(_task: &Task) -> bool {
    true
}

pub fn filter_tasks<'a>(tasks: &'a [Task], view: &ViewSelection) -> FilteredView<'a> {
    let visible: Vec<&Task> = tasks.iter().filter(|t| is_visible(t, view)).collect();
    let stats = Stats::from_tasks(visible.iter().copied());
    debug!(view = %view, visible = stats.total, of = tasks.len(), "filtered tasks");
    FilteredView { visible, stats }
}

/// Narrows an already filtered view to tasks tagged with `project`.
pub fn restrict_to_project<'a>(view: FilteredView<'a>, project: &str) -> FilteredView<'a> {
    let visible: Vec<&Task> = view
        .visible
        .into_iter()
        .filter(|t| t.project.as_deref() == Some(project))
        .collect();
    let stats = Stats::from_tasks(visible.iter().copied());
    FilteredView { visible, stats }
}
