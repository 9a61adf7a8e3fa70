use crate::auth::PermissionsRole;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbUser {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    sqlx::Type, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq,
)]
#[sqlx(type_name = "gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
    #[default]
    NotDeclared,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbProfile {
    pub id: i32,
    pub user_id: i32,
    pub professional_wiki_handle: String,
    pub personal_wiki_handle: String,
    pub gender: Gender,
    pub position_id: Option<i32>,
    pub twitter: String,
    pub facebook: String,
    pub instagram: String,
    pub linkedin: String,
    pub wikidata_item: String,
    pub orcid: String,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbPosition {
    pub id: i32,
    pub label: String,
    pub role: PermissionsRole,
    pub team_area_id: i32,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbTeamArea {
    pub id: i32,
    pub label: String,
    pub code: String,
}

#[derive(Deserialize, Serialize, Clone, FromRow, Debug)]
pub struct DbEvent {
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub responsible_area: String,
    pub expected_participants: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbEvent {
    ///duration in days, inclusive of both the start and end date
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn overlaps_day(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}
