pub mod add_event;
pub mod calendar;
pub mod edit_profile;
pub mod index;
pub mod remove_event;
pub mod show_events;
pub mod show_users;
pub mod update_event;

use crate::error::{
    AlmanacError, EventFormIssue, InvalidEventFormSnafu, ParseDateSnafu,
};
use chrono::NaiveDate;
use serde::Deserialize;
use snafu::{ensure, ResultExt};

///Raw form submission for creating or editing an event. Dates arrive as
///`YYYY-MM-DD` strings from `<input type="date">`.
#[derive(Deserialize, Debug)]
pub struct FormEvent {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub responsible_area: String,
    pub expected_participants: i32,
    pub description: Option<String>,
}

pub struct ValidEvent {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub responsible_area: String,
    pub expected_participants: i32,
    pub description: Option<String>,
}

impl FormEvent {
    ///Cross-field validation: parsable dates, end not before start, at
    ///least one participant, start not in the past.
    pub fn validate(self, today: NaiveDate) -> Result<ValidEvent, AlmanacError> {
        let start_date = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
            .with_context(|_| ParseDateSnafu {
                original: self.start_date.clone(),
            })?;
        let end_date = NaiveDate::parse_from_str(&self.end_date, "%Y-%m-%d")
            .with_context(|_| ParseDateSnafu {
                original: self.end_date.clone(),
            })?;

        ensure!(
            end_date >= start_date,
            InvalidEventFormSnafu {
                issue: EventFormIssue::EndBeforeStart,
            }
        );
        ensure!(
            self.expected_participants >= 1,
            InvalidEventFormSnafu {
                issue: EventFormIssue::NoParticipants,
            }
        );
        ensure!(
            start_date >= today,
            InvalidEventFormSnafu {
                issue: EventFormIssue::StartInPast,
            }
        );

        Ok(ValidEvent {
            name: self.name,
            start_date,
            end_date,
            responsible_area: self.responsible_area,
            expected_participants: self.expected_participants,
            description: self.description.filter(|description| !description.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(start: &str, end: &str, participants: i32) -> FormEvent {
        FormEvent {
            name: "Monthly meetup".to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            responsible_area: "Communications".to_string(),
            expected_participants: participants,
            description: Some(String::new()),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn valid_form_passes_and_blanks_empty_description() {
        let valid = form("2025-03-05", "2025-03-07", 10).validate(today()).unwrap();
        assert_eq!(valid.start_date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(valid.end_date, NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        assert!(valid.description.is_none());
    }

    #[test]
    fn end_before_start_is_rejected() {
        assert!(matches!(
            form("2025-03-07", "2025-03-05", 10).validate(today()),
            Err(AlmanacError::InvalidEventForm {
                issue: EventFormIssue::EndBeforeStart,
            })
        ));
    }

    #[test]
    fn single_day_event_is_allowed() {
        assert!(form("2025-03-05", "2025-03-05", 1).validate(today()).is_ok());
    }

    #[test]
    fn zero_participants_is_rejected() {
        assert!(matches!(
            form("2025-03-05", "2025-03-07", 0).validate(today()),
            Err(AlmanacError::InvalidEventForm {
                issue: EventFormIssue::NoParticipants,
            })
        ));
    }

    #[test]
    fn start_in_the_past_is_rejected() {
        assert!(matches!(
            form("2025-02-27", "2025-03-05", 10).validate(today()),
            Err(AlmanacError::InvalidEventForm {
                issue: EventFormIssue::StartInPast,
            })
        ));
    }

    #[test]
    fn unparsable_date_is_rejected() {
        assert!(matches!(
            form("5th of March", "2025-03-07", 10).validate(today()),
            Err(AlmanacError::ParseDate { .. })
        ));
    }
}
