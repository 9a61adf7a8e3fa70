use crate::{
    auth::{backend::Auth, get_auth_object},
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    liquid_utils::compile,
    state::{db_objects::DbEvent, AlmanacState},
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use chrono::Local;
use serde::Serialize;
use snafu::ResultExt;

///The home page: everything that hasn't finished yet, soonest first.
#[axum::debug_handler]
pub async fn get_index(
    auth: Auth,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let today = Local::now().date_naive();

    let events: Vec<DbEvent> = sqlx::query_as(
        r#"
SELECT id, name, start_date, end_date, responsible_area, expected_participants, description, created_at, updated_at
FROM events
WHERE end_date >= $1
ORDER BY start_date
        "#,
    )
    .bind(today)
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
        "www/index.liquid",
        liquid::object!({ "events": events, "auth": aa }),
        &state.settings.brand.instance_name,
    )
    .await
}

pub fn router() -> Router<AlmanacState> {
    Router::new().route("/", get(get_index))
}
