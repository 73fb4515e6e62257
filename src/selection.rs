use crate::model::{TimeBlock, PERIOD_CURRENT, PERIOD_NEXT_SIX, PERIOD_TODAY};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Weekday column index, 0 (Sunday) through 6 (Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayIndex(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayView {
    Today,
    Weekday(DayIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Current,
    NextSix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSelection {
    Day(DayView),
    Week(Span),
    Month(Span),
    Year,
    /// Block/period pair with no dedicated filter rule. Everything is visible.
    Unscoped { block: TimeBlock, period: String },
}

/// The flat `(block, period, day)` form stamped onto new tasks and read from config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTags {
    pub block: TimeBlock,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub day: Option<u8>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("day index out of range (0-6): {0}")]
    DayOutOfRange(u8),
    #[error("a weekday can only be selected on the day block, not {0}")]
    DayOnNonDayBlock(TimeBlock),
}

impl DayIndex {
    pub fn new(index: u8) -> Result<Self, SelectionError> {
        if usize::from(index) < DAY_NAMES.len() {
            Ok(DayIndex(index))
        } else {
            Err(SelectionError::DayOutOfRange(index))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        DAY_NAMES[usize::from(self.0)]
    }
}

impl Default for ViewSelection {
    fn default() -> Self {
        ViewSelection::Day(DayView::Today)
    }
}

impl ViewSelection {
    pub fn weekday(index: u8) -> Result<Self, SelectionError> {
        Ok(ViewSelection::Day(DayView::Weekday(DayIndex::new(index)?)))
    }

    /// Builds a selection from loose tags. A missing period means `today` on
    /// the day block and `current` elsewhere.
    ///
    /// Week and month treat any period other than `current` as the
    /// six-period look-ahead. A day block without a weekday and with a
    /// period other than `today` has no rule and becomes [`ViewSelection::Unscoped`].
    pub fn from_tags(
        block: TimeBlock,
        period: Option<&str>,
        day: Option<u8>,
    ) -> Result<Self, SelectionError> {
        let default_period = if block == TimeBlock::Day {
            PERIOD_TODAY
        } else {
            PERIOD_CURRENT
        };
        let period = period.map(str::trim).unwrap_or(default_period);
        if let Some(day) = day {
            if block != TimeBlock::Day {
                return Err(SelectionError::DayOnNonDayBlock(block));
            }
            return Self::weekday(day);
        }
        let span = if period == PERIOD_CURRENT {
            Span::Current
        } else {
            Span::NextSix
        };
        Ok(match block {
            TimeBlock::Day if period == PERIOD_TODAY => ViewSelection::Day(DayView::Today),
            TimeBlock::Day => ViewSelection::Unscoped {
                block,
                period: period.to_string(),
            },
            TimeBlock::Week => ViewSelection::Week(span),
            TimeBlock::Month => ViewSelection::Month(span),
            TimeBlock::Year => ViewSelection::Year,
        })
    }

    pub fn from_view_tags(tags: &ViewTags) -> Result<Self, SelectionError> {
        Self::from_tags(tags.block, tags.period.as_deref(), tags.day)
    }

    pub fn block(&self) -> TimeBlock {
        match self {
            ViewSelection::Day(_) => TimeBlock::Day,
            ViewSelection::Week(_) => TimeBlock::Week,
            ViewSelection::Month(_) => TimeBlock::Month,
            ViewSelection::Year => TimeBlock::Year,
            ViewSelection::Unscoped { block, .. } => *block,
        }
    }

    pub fn period(&self) -> &str {
        match self {
            ViewSelection::Day(DayView::Today) => PERIOD_TODAY,
            ViewSelection::Day(DayView::Weekday(_)) | ViewSelection::Year => PERIOD_CURRENT,
            ViewSelection::Week(span) | ViewSelection::Month(span) => span.tag(),
            ViewSelection::Unscoped { period, .. } => period.as_str(),
        }
    }

    pub fn day(&self) -> Option<DayIndex> {
        match self {
            ViewSelection::Day(DayView::Weekday(day)) => Some(*day),
            _ => None,
        }
    }

    pub fn tags(&self) -> ViewTags {
        ViewTags {
            block: self.block(),
            period: Some(self.period().to_string()),
            day: self.day().map(DayIndex::get),
        }
    }

    pub fn title(&self) -> String {
        match self {
            ViewSelection::Day(DayView::Weekday(day)) => day.name().to_string(),
            ViewSelection::Day(DayView::Today) => "Today".to_string(),
            ViewSelection::Week(Span::Current) => "This Week".to_string(),
            ViewSelection::Week(Span::NextSix) => "Next 6 Weeks".to_string(),
            ViewSelection::Month(Span::Current) => "This Month".to_string(),
            ViewSelection::Month(Span::NextSix) => "Next 6 Months".to_string(),
            ViewSelection::Year => "This Year".to_string(),
            ViewSelection::Unscoped { block, period } => format!("{} ({})", block.label(), period),
        }
    }
}

impl Span {
    pub fn tag(self) -> &'static str {
        match self {
            Span::Current => PERIOD_CURRENT,
            Span::NextSix => PERIOD_NEXT_SIX,
        }
    }
}

impl Default for ViewTags {
    fn default() -> Self {
        ViewSelection::default().tags()
    }
}

impl fmt::Display for ViewSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}
