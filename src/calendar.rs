//! Month-grid construction for the calendar page.
//!
//! Pure transforms over an event slice - the route fetches the events that
//! intersect the month and hands them over, so everything here is testable
//! without a database.

use crate::{error::AlmanacError, state::db_objects::DbEvent};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const WEEK_DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

///A validated (year, month) pair. Construction rejects out-of-range months
///and years chrono cannot represent, so navigation links with mangled
///parameters fail loudly rather than rendering a guessed month.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

impl CalendarQuery {
    pub fn new(year: i32, month: u32) -> Result<Self, AlmanacError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AlmanacError::InvalidCalendarQuery { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated on construction")
    }

    pub fn last_day(self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .expect("month start always has a predecessor")
    }

    pub fn days_in_month(self) -> u32 {
        self.last_day().day()
    }

    #[must_use]
    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

///One slot in the grid. `day_number` is `None` for the leading/trailing
///placeholders that pad the month out to whole weeks.
#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub day_number: Option<u32>,
    pub events: Vec<DbEvent>,
    pub is_today: bool,
}

impl DayCell {
    fn placeholder() -> Self {
        Self {
            day_number: None,
            events: vec![],
            is_today: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub weeks: Vec<Vec<DayCell>>,
}

impl MonthGrid {
    ///Builds the Monday-first week rows for the month. A day lists every
    ///event with `start_date <= day <= end_date`; emission stops before the
    ///first row that would hold no real days.
    pub fn build(query: CalendarQuery, events: &[DbEvent], today: NaiveDate) -> Self {
        let first_day = query.first_day();
        let total_days = query.days_in_month();
        let first_weekday = first_day.weekday().num_days_from_monday();

        let mut weeks = vec![];
        let mut current_day = 1;

        for week in 0..6 {
            let mut days = Vec::with_capacity(7);
            for weekday in 0..7 {
                if (week == 0 && weekday < first_weekday) || current_day > total_days {
                    days.push(DayCell::placeholder());
                } else {
                    let date = NaiveDate::from_ymd_opt(query.year, query.month, current_day)
                        .expect("day is within the month");
                    days.push(DayCell {
                        day_number: Some(current_day),
                        events: events
                            .iter()
                            .filter(|event| event.overlaps_day(date))
                            .cloned()
                            .collect(),
                        is_today: date == today,
                    });
                    current_day += 1;
                }
            }

            if days.iter().any(|day| day.day_number.is_some()) {
                weeks.push(days);
            } else {
                break;
            }
        }

        Self {
            year: query.year,
            month: query.month,
            month_name: first_day.format("%B").to_string(),
            weeks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn event(id: i32, start: NaiveDate, end: NaiveDate) -> DbEvent {
        let stamp = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        DbEvent {
            id,
            name: format!("Event {id}"),
            start_date: start,
            end_date: end,
            responsible_area: "Communications".to_string(),
            expected_participants: 10,
            description: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    fn days_on_which(grid: &MonthGrid, event_id: i32) -> Vec<u32> {
        grid.weeks
            .iter()
            .flatten()
            .filter(|cell| cell.events.iter().any(|event| event.id == event_id))
            .filter_map(|cell| cell.day_number)
            .collect()
    }

    #[test]
    fn all_weeks_are_seven_cells_and_real_cells_match_day_count() {
        for (year, month, expected_days) in [
            (2025, 3, 31),
            (2025, 6, 30),
            (2024, 2, 29),
            (2021, 2, 28),
            (2025, 12, 31),
        ] {
            let query = CalendarQuery::new(year, month).unwrap();
            let grid = MonthGrid::build(query, &[], date(2000, 1, 1));

            for week in &grid.weeks {
                assert_eq!(week.len(), 7, "{year}-{month} has a ragged week");
            }
            let real_cells = grid
                .weeks
                .iter()
                .flatten()
                .filter(|cell| cell.day_number.is_some())
                .count();
            assert_eq!(real_cells, expected_days as usize, "{year}-{month}");
        }
    }

    #[test]
    fn leading_and_trailing_cells_are_empty_placeholders() {
        //March 2025 starts on a Saturday, so five leading placeholders
        let query = CalendarQuery::new(2025, 3).unwrap();
        let spanning = event(1, date(2025, 2, 1), date(2025, 4, 30));
        let grid = MonthGrid::build(query, &[spanning], date(2025, 3, 1));

        for cell in &grid.weeks[0][..5] {
            assert!(cell.day_number.is_none());
            assert!(cell.events.is_empty());
            assert!(!cell.is_today);
        }
        assert_eq!(grid.weeks[0][5].day_number, Some(1));

        let last_week = grid.weeks.last().unwrap();
        assert_eq!(last_week[0].day_number, Some(31));
        for cell in &last_week[1..] {
            assert!(cell.day_number.is_none());
            assert!(cell.events.is_empty());
        }
    }

    #[test]
    fn a_month_fitting_exactly_into_weeks_has_no_placeholders() {
        //February 2021: starts on a Monday, 28 days
        let query = CalendarQuery::new(2021, 2).unwrap();
        let grid = MonthGrid::build(query, &[], date(2021, 2, 10));

        assert_eq!(grid.weeks.len(), 4);
        assert!(grid
            .weeks
            .iter()
            .flatten()
            .all(|cell| cell.day_number.is_some()));
    }

    #[test]
    fn event_appears_on_exactly_its_days() {
        let query = CalendarQuery::new(2025, 3).unwrap();
        let three_days = event(7, date(2025, 3, 5), date(2025, 3, 7));
        let grid = MonthGrid::build(query, &[three_days], date(2025, 1, 1));

        assert_eq!(days_on_which(&grid, 7), vec![5, 6, 7]);
    }

    #[test]
    fn event_spanning_the_whole_month_appears_every_day() {
        let query = CalendarQuery::new(2025, 3).unwrap();
        let spanning = event(3, date(2025, 2, 20), date(2025, 4, 10));
        let grid = MonthGrid::build(query, &[spanning], date(2025, 1, 1));

        assert_eq!(days_on_which(&grid, 3), (1..=31).collect::<Vec<_>>());
    }

    #[test]
    fn event_crossing_the_month_start_is_clipped() {
        let query = CalendarQuery::new(2025, 3).unwrap();
        let crossing = event(4, date(2025, 2, 25), date(2025, 3, 3));
        let grid = MonthGrid::build(query, &[crossing], date(2025, 1, 1));

        assert_eq!(days_on_which(&grid, 4), vec![1, 2, 3]);
    }

    #[test]
    fn today_is_marked_once_and_only_in_its_month() {
        let query = CalendarQuery::new(2025, 3).unwrap();
        let grid = MonthGrid::build(query, &[], date(2025, 3, 15));
        let todays = grid
            .weeks
            .iter()
            .flatten()
            .filter(|cell| cell.is_today)
            .filter_map(|cell| cell.day_number)
            .collect::<Vec<_>>();
        assert_eq!(todays, vec![15]);

        let other_month = MonthGrid::build(CalendarQuery::new(2025, 4).unwrap(), &[], date(2025, 3, 15));
        assert!(other_month.weeks.iter().flatten().all(|cell| !cell.is_today));
    }

    #[test]
    fn navigation_wraps_year_boundaries() {
        assert_eq!(
            CalendarQuery::new(2025, 1).unwrap().prev(),
            CalendarQuery { year: 2024, month: 12 }
        );
        assert_eq!(
            CalendarQuery::new(2025, 12).unwrap().next(),
            CalendarQuery { year: 2026, month: 1 }
        );
        assert_eq!(
            CalendarQuery::new(2025, 6).unwrap().prev(),
            CalendarQuery { year: 2025, month: 5 }
        );
    }

    #[test]
    fn out_of_range_months_are_rejected() {
        for month in [0, 13, 99] {
            assert!(matches!(
                CalendarQuery::new(2025, month),
                Err(AlmanacError::InvalidCalendarQuery { .. })
            ));
        }
    }

    #[test]
    fn month_bounds() {
        let query = CalendarQuery::new(2024, 2).unwrap();
        assert_eq!(query.first_day(), date(2024, 2, 1));
        assert_eq!(query.last_day(), date(2024, 2, 29));
        assert_eq!(query.days_in_month(), 29);
    }

    #[test]
    fn single_day_event_lasts_one_day() {
        let single = event(9, date(2025, 1, 1), date(2025, 1, 1));
        assert_eq!(single.duration_days(), 1);

        let week_long = event(10, date(2025, 3, 5), date(2025, 3, 11));
        assert_eq!(week_long.duration_days(), 7);
    }
}
