//! The month-grid calendar page.

use crate::{
    auth::{backend::Auth, get_auth_object},
    calendar::{CalendarQuery, MonthGrid, WEEK_DAYS},
    error::{AlmanacError, ParseIntSnafu, SqlxAction, SqlxSnafu, WhatToParse},
    liquid_utils::compile_with_newtitle,
    state::{db_objects::DbEvent, AlmanacState},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use snafu::ResultExt;

#[derive(Deserialize, Debug)]
pub struct RawCalendarQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

///Absent parameters fall back to the current month; present-but-malformed
///ones fail loudly so bad navigation links surface early.
fn parse_query(raw: RawCalendarQuery, today: NaiveDate) -> Result<CalendarQuery, AlmanacError> {
    let month = match raw.month {
        Some(month) => month.parse().context(ParseIntSnafu {
            what_to_convert_to: WhatToParse::CalendarMonth,
        })?,
        None => today.month(),
    };
    let year = match raw.year {
        Some(year) => year.parse().context(ParseIntSnafu {
            what_to_convert_to: WhatToParse::CalendarYear,
        })?,
        None => today.year(),
    };

    CalendarQuery::new(year, month)
}

#[axum::debug_handler]
#[instrument(level = "debug", skip(auth, state))]
pub async fn get_calendar(
    auth: Auth,
    State(state): State<AlmanacState>,
    Query(raw): Query<RawCalendarQuery>,
) -> Result<impl IntoResponse, AlmanacError> {
    let today = Local::now().date_naive();
    let query = parse_query(raw, today)?;

    debug!(year = query.year, month = query.month, "Fetching events for month");

    let events: Vec<DbEvent> = sqlx::query_as(
        r#"
SELECT id, name, start_date, end_date, responsible_area, expected_participants, description, created_at, updated_at
FROM events
WHERE start_date <= $2 AND end_date >= $1
ORDER BY start_date
        "#,
    )
    .bind(query.first_day())
    .bind(query.last_day())
    .fetch_all(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingEventsInRange,
    })?;

    let grid = MonthGrid::build(query, &events, today);
    let title = format!("{} {}", grid.month_name, grid.year);

    let aa = get_auth_object(auth).await?;

    compile_with_newtitle(
        "www/calendar.liquid",
        liquid::object!({
            "auth": aa,
            "grid": grid,
            "week_days": WEEK_DAYS,
            "prev": query.prev(),
            "next": query.next(),
        }),
        &state.settings.brand.instance_name,
        Some(title),
    )
    .await
}

pub fn router() -> Router<AlmanacState> {
    Router::new().route("/calendar", get(get_calendar))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn raw(month: Option<&str>, year: Option<&str>) -> RawCalendarQuery {
        RawCalendarQuery {
            month: month.map(str::to_string),
            year: year.map(str::to_string),
        }
    }

    #[test]
    fn absent_parameters_default_to_the_current_month() {
        let query = parse_query(raw(None, None), today()).unwrap();
        assert_eq!((query.year, query.month), (2025, 3));
    }

    #[test]
    fn explicit_parameters_are_used() {
        let query = parse_query(raw(Some("12"), Some("2024")), today()).unwrap();
        assert_eq!((query.year, query.month), (2024, 12));
    }

    #[test]
    fn non_numeric_parameters_are_rejected() {
        assert!(matches!(
            parse_query(raw(Some("march"), None), today()),
            Err(AlmanacError::ParseInt { .. })
        ));
    }

    #[test]
    fn out_of_range_month_is_rejected() {
        assert!(matches!(
            parse_query(raw(Some("13"), Some("2025")), today()),
            Err(AlmanacError::InvalidCalendarQuery { .. })
        ));
    }
}
