use crate::{
    auth::{
        backend::{AlmanacAuthBackend, Auth},
        get_auth_object, PermissionsTarget,
    },
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    liquid_utils::compile_with_newtitle,
    routes::FormEvent,
    state::{db_objects::DbEvent, AlmanacState},
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use axum_login::permission_required;
use chrono::Local;
use snafu::ResultExt;

#[axum::debug_handler]
#[instrument(level = "debug", skip(auth, state))]
async fn get_update_event(
    auth: Auth,
    Path(event_id): Path<i32>,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    debug!("Getting event");

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

    let aa = get_auth_object(auth).await?;
    let name = event.name.clone();

    compile_with_newtitle(
        "www/update_event.liquid",
        liquid::object!({
            "auth": aa,
            "event": liquid::object!({
                "id": event.id,
                "name": event.name.clone(),
                "start_date": event.start_date.to_string(),
                "end_date": event.end_date.to_string(),
                "responsible_area": event.responsible_area.clone(),
                "expected_participants": event.expected_participants,
                "description": event.description.clone().unwrap_or_default(),
            }),
        }),
        &state.settings.brand.instance_name,
        Some(name),
    )
    .await
}

#[axum::debug_handler]
async fn post_update_event(
    Path(event_id): Path<i32>,
    State(state): State<AlmanacState>,
    Form(event): Form<FormEvent>,
) -> Result<impl IntoResponse, AlmanacError> {
    let event = event.validate(Local::now().date_naive())?;

    sqlx::query(
        r#"
UPDATE events
SET name = $2, start_date = $3, end_date = $4, responsible_area = $5, expected_participants = $6, description = $7, updated_at = now()
WHERE id = $1
        "#,
    )
    .bind(event_id)
    .bind(&event.name)
    .bind(event.start_date)
    .bind(event.end_date)
    .bind(&event.responsible_area)
    .bind(event.expected_participants)
    .bind(&event.description)
    .execute(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingEvent(event_id),
    })?;

    info!(%event_id, "Updated event");

    Ok(Redirect::to(&format!("/event/{event_id}")))
}

pub fn router() -> Router<AlmanacState> {
    Router::new()
        .route(
            "/update_event/:id",
            get(get_update_event).post(post_update_event),
        )
        .route_layer(permission_required!(
            AlmanacAuthBackend,
            login_url = "/login",
            PermissionsTarget::EditEvents
        ))
}
