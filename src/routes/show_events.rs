use crate::{
    auth::{backend::Auth, get_auth_object},
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    liquid_utils::{compile, compile_with_newtitle},
    state::{db_objects::DbEvent, AlmanacState},
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

#[derive(Deserialize, Debug)]
pub struct EventFilter {
    pub search: Option<String>,
    pub area: Option<String>,
}

#[axum::debug_handler]
pub async fn get_show_events(
    auth: Auth,
    State(state): State<AlmanacState>,
    Query(EventFilter { search, area }): Query<EventFilter>,
) -> Result<impl IntoResponse, AlmanacError> {
    let search = search.filter(|search| !search.is_empty());
    let area = area.filter(|area| !area.is_empty());

    let events: Vec<DbEvent> = sqlx::query_as(
        r#"
SELECT id, name, start_date, end_date, responsible_area, expected_participants, description, created_at, updated_at
FROM events
WHERE ($1::text IS NULL
        OR name ILIKE '%' || $1 || '%'
        OR responsible_area ILIKE '%' || $1 || '%'
        OR description ILIKE '%' || $1 || '%')
  AND ($2::text IS NULL OR responsible_area = $2)
ORDER BY start_date
        "#,
    )
    .bind(&search)
    .bind(&area)
    .fetch_all(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingAllEvents,
    })?;

    let areas: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT responsible_area FROM events ORDER BY responsible_area")
            .fetch_all(&mut *state.get_connection().await?)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingAllEvents,
            })?;

    #[derive(Serialize)]
    struct HTMLEvent {
        id: i32,
        name: String,
        start_date: String,
        end_date: String,
        responsible_area: String,
        expected_participants: i32,
        duration_days: i64,
    }

    let date_format = &state.settings.niche.date_format;
    let events = events
        .into_iter()
        .map(|event| HTMLEvent {
            id: event.id,
            name: event.name.clone(),
            start_date: event.start_date.format(date_format).to_string(),
            end_date: event.end_date.format(date_format).to_string(),
            responsible_area: event.responsible_area.clone(),
            expected_participants: event.expected_participants,
            duration_days: event.duration_days(),
        })
        .collect::<Vec<_>>();

    let aa = get_auth_object(auth).await?;

    compile(
        "www/event_list.liquid",
        liquid::object!({
            "auth": aa,
            "events": events,
            "areas": areas,
            "search": search.unwrap_or_default(),
            "area": area.unwrap_or_default(),
        }),
        &state.settings.brand.instance_name,
    )
    .await
}

#[axum::debug_handler]
pub async fn get_event_detail(
    auth: Auth,
    Path(event_id): Path<i32>,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let event: DbEvent = sqlx::query_as(
        r#"
SELECT id, name, start_date, end_date, responsible_area, expected_participants, description, created_at, updated_at
FROM events
WHERE id = $1
        "#,
    )
    .bind(event_id)
    .fetch_one(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingEvent(event_id),
    })?;

    let date_format = &state.settings.niche.date_format;
    let aa = get_auth_object(auth).await?;
    let name = event.name.clone();

    compile_with_newtitle(
        "www/event_detail.liquid",
        liquid::object!({
            "auth": aa,
            "event": liquid::object!({
                "id": event.id,
                "name": event.name.clone(),
                "start_date": event.start_date.format(date_format).to_string(),
                "end_date": event.end_date.format(date_format).to_string(),
                "start_date_raw": event.start_date.to_string(),
                "end_date_raw": event.end_date.to_string(),
                "responsible_area": event.responsible_area.clone(),
                "expected_participants": event.expected_participants,
                "description": event.description.clone().unwrap_or_default(),
                "duration_days": event.duration_days(),
                "created_at": event.created_at.format("%c").to_string(),
                "updated_at": event.updated_at.format("%c").to_string(),
            }),
        }),
        &state.settings.brand.instance_name,
        Some(name),
    )
    .await
}

pub fn router() -> Router<AlmanacState> {
    Router::new()
        .route("/events", get(get_show_events))
        .route("/event/:id", get(get_event_detail))
}
