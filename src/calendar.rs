//! Month-grid layout for the calendar view.
//!
//! A grid is the leading blank cells before day 1 (weeks start on Sunday)
//! followed by one cell per day of the month. There is no trailing padding;
//! rendering in rows of seven reproduces the familiar wall-calendar shape.

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// `None` cells are the blanks before day 1.
    pub cells: Vec<Option<NaiveDate>>,
    /// Display label, e.g. "March 2026".
    pub label: String,
}

impl MonthGrid {
    /// Build the grid for the month containing `reference`.
    pub fn for_date(reference: NaiveDate) -> Self {
        let year = reference.year();
        let month = reference.month();
        // Both days exist for any valid (year, month).
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let last = last_day_of_month(year, month).unwrap();

        let leading = first.weekday().num_days_from_sunday() as usize;
        let mut cells: Vec<Option<NaiveDate>> =
            Vec::with_capacity(leading + last.day() as usize);
        cells.resize(leading, None);
        for day in 1..=last.day() {
            cells.push(NaiveDate::from_ymd_opt(year, month, day));
        }

        Self {
            year,
            month,
            cells,
            label: first.format("%B %Y").to_string(),
        }
    }

    pub fn leading_blanks(&self) -> usize {
        self.cells.iter().take_while(|c| c.is_none()).count()
    }

    /// First day of the previous month, for back navigation.
    pub fn prev_month(&self) -> NaiveDate {
        let (y, m) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    /// First day of the following month, for forward navigation.
    pub fn next_month(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }
}

/// Last day of the given month, or `None` for an invalid year/month pair.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt())
}

/// Inclusive date range covering the whole month. The end bound is the true
/// last day, so short months never produce a nonexistent date like Feb 31.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = last_day_of_month(year, month)?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn test_grid_cell_count_is_blanks_plus_days() {
        for (y, m, days) in [(2026, 3, 31), (2026, 4, 30), (2026, 2, 28), (2024, 2, 29)] {
            let grid = MonthGrid::for_date(NaiveDate::from_ymd_opt(y, m, 15).unwrap());
            assert_eq!(
                grid.cells.len(),
                grid.leading_blanks() + days,
                "{}-{} cell count",
                y,
                m
            );
        }
    }

    #[test]
    fn test_first_populated_cell_matches_weekday_of_day_one() {
        let grid = MonthGrid::for_date(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        // March 1, 2026 is a Sunday: no leading blanks.
        assert_eq!(grid.leading_blanks(), 0);
        assert_eq!(grid.cells[0], NaiveDate::from_ymd_opt(2026, 3, 1));

        let grid = MonthGrid::for_date(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        // August 1, 2026 is a Saturday: six blanks, then day 1.
        assert_eq!(grid.leading_blanks(), 6);
        let first = grid.cells[6].unwrap();
        assert_eq!(first.day(), 1);
        assert_eq!(first.weekday(), Weekday::Sat);
        assert_eq!(
            first.weekday().num_days_from_sunday() as usize,
            grid.leading_blanks()
        );
    }

    #[test]
    fn test_no_trailing_padding() {
        let grid = MonthGrid::for_date(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(
            grid.cells.last().copied().flatten(),
            NaiveDate::from_ymd_opt(2026, 2, 28)
        );
    }

    #[test]
    fn test_label_format() {
        let grid = MonthGrid::for_date(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(grid.label, "January 2026");
    }

    #[test]
    fn test_month_navigation_wraps_year() {
        let jan = MonthGrid::for_date(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
        assert_eq!(jan.prev_month(), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());

        let dec = MonthGrid::for_date(NaiveDate::from_ymd_opt(2025, 12, 5).unwrap());
        assert_eq!(dec.next_month(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_month_bounds_clamp_short_months() {
        let (start, end) = month_bounds(2026, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        let (_, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(end.day(), 29);

        let (_, end) = month_bounds(2026, 12).unwrap();
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_month_bounds_rejects_invalid_month() {
        assert!(month_bounds(2026, 0).is_none());
        assert!(month_bounds(2026, 13).is_none());
    }
}
