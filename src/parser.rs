use crate::model::{generate_id, Subtask, Task};
use crate::selection::ViewSelection;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const TASK_MARKER: &str = "- ";
const SUBTASK_INDENT: usize = 2;
/// Columns a leading tab counts for when measuring indentation.
const TAB_WIDTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    pub text: String,
    pub project: Option<String>,
}

enum Line<'a> {
    Task(&'a str),
    Subtask(&'a str),
}

/// Parses a batch submitted under `view`, timestamped now.
pub fn parse_quick_entry(raw: &str, view: &ViewSelection) -> Vec<Task> {
    parse_quick_entry_at(raw, view, Utc::now())
}

/// Parses a batch; every task in it shares `created_at` and the view's placement.
pub fn parse_quick_entry_at(
    raw: &str,
    view: &ViewSelection,
    created_at: DateTime<Utc>,
) -> Vec<Task> {
    let tags = view.tags();
    let period = tags.period.unwrap_or_default();
    let mut tasks: Vec<Task> = Vec::new();

    for (line_no, line) in raw.lines().enumerate() {
        match classify(line) {
            None => continue,
            Some(Line::Task(cleaned)) => {
                let Tagged { text, project } = extract_project(cleaned);
                tasks.push(Task::new(
                    generate_id(),
                    text,
                    project,
                    tags.block,
                    period.clone(),
                    tags.day,
                    created_at,
                ));
            }
            Some(Line::Subtask(cleaned)) => match tasks.last_mut() {
                Some(parent) => {
                    let Tagged { text, project } = extract_project(cleaned);
                    parent
                        .subtasks
                        .push(Subtask::new(generate_id(), text, project));
                }
                // No task has started in this batch yet, so there is nothing to attach to.
                None => debug!(line = line_no + 1, "dropping indented line with no parent task"),
            },
        }
    }

    tasks
}

fn classify(line: &str) -> Option<Line<'_>> {
    let body = line.trim_start();
    if body.trim_end().is_empty() {
        return None;
    }
    let indented = indent_width(line) >= SUBTASK_INDENT;
    if indented && !body.starts_with(TASK_MARKER) {
        return Some(Line::Subtask(body.trim_end()));
    }
    let body = body.strip_prefix(TASK_MARKER).unwrap_or(body).trim();
    // A bare marker has nothing to display.
    (!body.is_empty()).then_some(Line::Task(body))
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn project_tag() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"@(\w+)").ok()).as_ref()
}

/// Splits the first `@word` token off `text`.
///
/// When removing the token would leave nothing to display, the text keeps
/// the token and the project is still recorded.
pub fn extract_project(text: &str) -> Tagged {
    let Some(caps) = project_tag().and_then(|re| re.captures(text)) else {
        return Tagged {
            text: text.trim().to_string(),
            project: None,
        };
    };
    let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
        return Tagged {
            text: text.trim().to_string(),
            project: None,
        };
    };
    let mut cleaned = String::with_capacity(text.len());
    cleaned.push_str(&text[..token.start()]);
    cleaned.push_str(&text[token.end()..]);
    let cleaned = cleaned.trim();
    let display = if cleaned.is_empty() {
        text.trim()
    } else {
        cleaned
    };
    Tagged {
        text: display.to_string(),
        project: Some(name.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeBlock;
    use crate::selection::Span;
    use std::collections::HashSet;

    fn parse(raw: &str) -> Vec<Task> {
        parse_quick_entry(raw, &ViewSelection::default())
    }

    fn subtask_texts(task: &Task) -> Vec<&str> {
        task.subtasks.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn extracts_project_tag() {
        let tasks = parse("Buy milk @home");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Buy milk");
        assert_eq!(tasks[0].project.as_deref(), Some("home"));
        assert!(!tasks[0].completed);
        assert!(tasks[0].subtasks.is_empty());
    }

    #[test]
    fn nests_indented_lines_under_previous_task() {
        let tasks = parse("- Task A\n  Subtask A1\n  Subtask A2\nTask B");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].text, "Task A");
        assert_eq!(subtask_texts(&tasks[0]), vec!["Subtask A1", "Subtask A2"]);
        assert_eq!(tasks[1].text, "Task B");
        assert!(tasks[1].subtasks.is_empty());
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("   \n\t\n\r\n  ").is_empty());
    }

    #[test]
    fn orphan_indented_line_is_dropped() {
        let tasks = parse("  orphan\nReal task\n  child");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Real task");
        assert_eq!(subtask_texts(&tasks[0]), vec!["child"]);
    }

    #[test]
    fn blank_lines_do_not_break_nesting() {
        let tasks = parse("Parent\n\n   \n  still a child");
        assert_eq!(tasks.len(), 1);
        assert_eq!(subtask_texts(&tasks[0]), vec!["still a child"]);
    }

    #[test]
    fn indented_marker_starts_a_new_task() {
        let tasks = parse("First\n  - Second\n    third");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].text, "Second");
        assert_eq!(subtask_texts(&tasks[1]), vec!["third"]);
    }

    #[test]
    fn bare_marker_line_is_skipped() {
        let tasks = parse("Parent\n- \n  child");
        assert_eq!(tasks.len(), 1);
        assert_eq!(subtask_texts(&tasks[0]), vec!["child"]);
    }

    #[test]
    fn single_space_indent_is_a_task() {
        let tasks = parse("First\n Second");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].text, "Second");
    }

    #[test]
    fn tab_indent_counts_as_subtask() {
        let tasks = parse("Parent\n\tchild");
        assert_eq!(subtask_texts(&tasks[0]), vec!["child"]);
    }

    #[test]
    fn subtask_project_is_independent_of_parent() {
        let tasks = parse("Plan trip @travel\n  book hotel @admin\n  pack");
        let subs = &tasks[0].subtasks;
        assert_eq!(tasks[0].project.as_deref(), Some("travel"));
        assert_eq!(subs[0].text, "book hotel");
        assert_eq!(subs[0].project.as_deref(), Some("admin"));
        assert_eq!(subs[1].project, None);
    }

    #[test]
    fn only_first_tag_is_extracted() {
        let tagged = extract_project("call @bob about @work stuff");
        assert_eq!(tagged.project.as_deref(), Some("bob"));
        assert_eq!(tagged.text, "call  about @work stuff");
    }

    #[test]
    fn lone_tag_keeps_display_text() {
        let tagged = extract_project("@errands");
        assert_eq!(tagged.text, "@errands");
        assert_eq!(tagged.project.as_deref(), Some("errands"));
    }

    #[test]
    fn bare_at_sign_is_not_a_tag() {
        let tagged = extract_project("email me @ noon");
        assert_eq!(tagged.project, None);
        assert_eq!(tagged.text, "email me @ noon");
    }

    #[test]
    fn tasks_inherit_the_submitted_view() {
        let now = Utc::now();
        let week = parse_quick_entry_at("a\nb", &ViewSelection::Week(Span::NextSix), now);
        assert!(week.iter().all(|t| t.time_block == TimeBlock::Week
            && t.time_period == "next-6"
            && t.day.is_none()
            && t.created_at == now));

        let thursday = parse_quick_entry("a", &ViewSelection::weekday(4).unwrap());
        assert_eq!(thursday[0].time_block, TimeBlock::Day);
        assert_eq!(thursday[0].day, Some(4));
    }

    #[test]
    fn ids_are_unique_across_tasks_and_subtasks() {
        let tasks = parse("a\n  a1\n  a2\nb\n  b1");
        let ids: Vec<&str> = tasks
            .iter()
            .flat_map(|t| std::iter::once(t.id.as_str()).chain(t.subtasks.iter().map(|s| s.id.as_str())))
            .collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(unique.len(), 5);
    }
}
