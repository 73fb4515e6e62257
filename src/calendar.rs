use crate::selection::DayIndex;
use chrono::{Datelike, Duration, Local, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("cannot move {0} weeks from {1}")]
    OutOfRange(i64, NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCursor {
    anchor: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayColumn {
    pub index: DayIndex,
    pub date: NaiveDate,
    pub is_today: bool,
}

impl WeekCursor {
    pub fn new(anchor: NaiveDate) -> Self {
        WeekCursor { anchor }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Leaves the cursor untouched when the target week has no representable dates.
    pub fn shift(&mut self, weeks: i64) -> Result<(), CalendarError> {
        let out_of_range = || CalendarError::OutOfRange(weeks, self.anchor);
        let anchor = Duration::try_weeks(weeks)
            .and_then(|delta| self.anchor.checked_add_signed(delta))
            .ok_or_else(out_of_range)?;
        let week = Duration::days(6);
        if anchor.checked_sub_signed(week).is_none() || anchor.checked_add_signed(week).is_none() {
            return Err(out_of_range());
        }
        self.anchor = anchor;
        Ok(())
    }

    pub fn start_of_week(&self) -> NaiveDate {
        let back = i64::from(self.anchor.weekday().num_days_from_sunday());
        self.anchor - Duration::days(back)
    }

    /// e.g. `Week of Oct 11, 2026`.
    pub fn label(&self) -> String {
        format!("Week of {}", self.start_of_week().format("%b %-d, %Y"))
    }

    pub fn day_columns(&self, today: NaiveDate) -> Vec<DayColumn> {
        let start = self.start_of_week();
        (0u8..7)
            .filter_map(|i| DayIndex::new(i).ok())
            .map(|index| {
                let date = start + Duration::days(i64::from(index.get()));
                DayColumn {
                    index,
                    date,
                    is_today: date == today,
                }
            })
            .collect()
    }
}

impl DayColumn {
    /// e.g. `Sunday 11`.
    pub fn label(&self) -> String {
        format!("{} {}", self.index.name(), self.date.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2026-10-16 is a Friday.
        let cursor = WeekCursor::new(date(2026, 10, 16));
        assert_eq!(cursor.start_of_week(), date(2026, 10, 11));
        assert_eq!(cursor.label(), "Week of Oct 11, 2026");
        let sunday = WeekCursor::new(date(2026, 10, 11));
        assert_eq!(sunday.start_of_week(), date(2026, 10, 11));
    }

    #[test]
    fn shifting_crosses_month_and_year() {
        let mut cursor = WeekCursor::new(date(2026, 12, 30));
        cursor.shift(1).unwrap();
        assert_eq!(cursor.start_of_week(), date(2027, 1, 3));
        cursor.shift(-2).unwrap();
        assert_eq!(cursor.label(), "Week of Dec 20, 2026");
    }

    #[test]
    fn shifting_past_the_calendar_fails_in_place() {
        let start = date(2026, 10, 16);
        let mut cursor = WeekCursor::new(start);
        assert_eq!(
            cursor.shift(20_000_000),
            Err(CalendarError::OutOfRange(20_000_000, start))
        );
        assert!(cursor.shift(i64::MIN).is_err());
        assert_eq!(cursor.anchor(), start);

        let mut edge = WeekCursor::new(NaiveDate::MAX - Duration::days(10));
        assert!(edge.shift(1).is_err());
        assert_eq!(edge.day_columns(start).len(), 7);
    }

    #[test]
    fn day_columns_mark_today() {
        let cursor = WeekCursor::new(date(2026, 10, 16));
        let columns = cursor.day_columns(date(2026, 10, 14));
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[0].label(), "Sunday 11");
        assert_eq!(columns[6].label(), "Saturday 17");
        let today: Vec<u8> = columns
            .iter()
            .filter(|c| c.is_today)
            .map(|c| c.index.get())
            .collect();
        assert_eq!(today, vec![3]);
    }
}
