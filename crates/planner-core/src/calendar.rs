use chrono::{Datelike, Days, NaiveDate};
use tracing::trace;

use crate::task::Task;

/// One cell of the month grid. Cells outside the focused month come from
/// the trailing days of the previous month or the leading days of the
/// next, so the grid is always fully populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
}

/// A 6x7 month grid, Monday-start, 42 cells.
#[derive(Debug)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayCell>,
}

/// The date the week/month views are focused on. Navigation moves only
/// this anchor; task data is untouched.
#[derive(Debug, Clone, Copy)]
pub struct CalendarView {
    pub anchor: NaiveDate,
}

impl CalendarView {
    pub fn new(anchor: NaiveDate) -> Self {
        Self { anchor }
    }

    pub fn change_week(&mut self, weeks: i64) {
        self.anchor = self.anchor + chrono::Duration::weeks(weeks);
        trace!(anchor = %self.anchor, "week anchor moved");
    }

    pub fn change_month(&mut self, months: i32) {
        self.anchor = shift_months(self.anchor, months);
        trace!(anchor = %self.anchor, "month anchor moved");
    }

    /// The Monday..Sunday week containing the anchor.
    pub fn week(&self) -> [NaiveDate; 7] {
        week_of(self.anchor)
    }

    pub fn month_grid(&self) -> MonthGrid {
        month_grid(self.anchor.year(), self.anchor.month())
    }
}

/// Tasks due on a given calendar day, independent of status.
pub fn tasks_on_date(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.due_date == Some(date))
        .collect()
}

/// The ISO week (Monday first) containing `anchor`. A Sunday due date
/// therefore lands in the seventh column.
pub fn week_of(anchor: NaiveDate) -> [NaiveDate; 7] {
    let monday = anchor - chrono::Duration::days(anchor.weekday().num_days_from_monday() as i64);
    std::array::from_fn(|i| monday + chrono::Duration::days(i as i64))
}

/// The 42-cell grid for `(year, month)`: the month's days padded to full
/// Monday-start weeks with neighbouring-month days on both sides.
pub fn month_grid(year: i32, month: u32) -> MonthGrid {
    let first = first_day_of_month(year, month);
    let lead = first.weekday().num_days_from_monday() as u64;
    let start = first - Days::new(lead);

    let cells = (0..42)
        .map(|i| {
            let date = start + Days::new(i);
            DayCell {
                date,
                in_month: date.year() == year && date.month() == month,
            }
        })
        .collect();

    MonthGrid { year, month, cells }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = first_day_of_month(next_year, next_month);
    (next_first - Days::new(1)).day()
}

fn first_day_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

/// Shift by whole months, clamping the day-of-month to the target month's
/// length (Jan 31 + 1 month = Feb 28/29).
fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month < 1 {
        month += 12;
        year -= 1;
    }
    while month > 12 {
        month -= 12;
        year += 1;
    }
    let month = month as u32;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, TimeZone, Utc, Weekday};

    use super::{CalendarView, days_in_month, month_grid, tasks_on_date, week_of};
    use crate::task::Task;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn week_starts_on_monday_and_ends_on_sunday() {
        // 2026-08-26 is a Wednesday.
        let week = week_of(date(2026, 8, 26));
        assert_eq!(week[0], date(2026, 8, 24));
        assert_eq!(week[0].weekday(), Weekday::Mon);
        assert_eq!(week[6], date(2026, 8, 30));
        assert_eq!(week[6].weekday(), Weekday::Sun);
    }

    #[test]
    fn sunday_due_date_lands_in_last_column() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
        let mut task = Task::new("weekend chore".to_string(), now);
        let sunday = date(2026, 8, 30);
        task.due_date = Some(sunday);
        let tasks = vec![task];

        let week = week_of(sunday);
        let last_column = week[6];
        assert_eq!(tasks_on_date(&tasks, last_column).len(), 1);
        for day in &week[..6] {
            assert!(tasks_on_date(&tasks, *day).is_empty());
        }
    }

    #[test]
    fn month_grid_is_always_42_cells() {
        for (year, month) in [(2026, 2), (2026, 8), (2024, 2), (2025, 12), (2026, 1)] {
            let grid = month_grid(year, month);
            assert_eq!(grid.cells.len(), 42, "{year}-{month}");
            let in_month = grid.cells.iter().filter(|c| c.in_month).count();
            assert_eq!(in_month as u32, days_in_month(year, month), "{year}-{month}");
        }
    }

    #[test]
    fn month_grid_pads_with_neighbouring_months() {
        // June 2026 starts on a Monday: no leading pad, trailing pad only.
        let grid = month_grid(2026, 6);
        assert!(grid.cells[0].in_month);
        assert_eq!(grid.cells[0].date, date(2026, 6, 1));
        assert!(!grid.cells[41].in_month);
        assert_eq!(grid.cells[41].date.month(), 7);

        // February 2026 starts on a Sunday: six leading January days.
        let grid = month_grid(2026, 2);
        assert_eq!(grid.cells[0].date, date(2026, 1, 26));
        assert!(!grid.cells[5].in_month);
        assert!(grid.cells[6].in_month);
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn navigation_moves_only_the_anchor() {
        let mut view = CalendarView::new(date(2026, 8, 31));

        view.change_week(1);
        assert_eq!(view.anchor, date(2026, 9, 7));
        view.change_week(-1);
        assert_eq!(view.anchor, date(2026, 8, 31));

        // Day clamps to the shorter month and stays there.
        view.change_month(1);
        assert_eq!(view.anchor, date(2026, 9, 30));
        view.change_month(-7);
        assert_eq!(view.anchor, date(2026, 2, 28));
    }

    #[test]
    fn bucketing_ignores_status() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
        let day = date(2026, 8, 28);

        let mut done = Task::new("done one".to_string(), now);
        done.status = crate::task::Status::Done;
        done.due_date = Some(day);

        let mut todo = Task::new("todo one".to_string(), now);
        todo.due_date = Some(day);

        let undated = Task::new("no due date".to_string(), now);

        let tasks = vec![done, todo, undated];
        let hits = tasks_on_date(&tasks, day);
        assert_eq!(hits.len(), 2);
        // Store order is preserved.
        assert_eq!(hits[0].title, "done one");
    }
}
