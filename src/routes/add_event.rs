//! Page to deal with adding events.
//!
//! It serves a simple form, and handles post requests to add that event to
//! the DB.

use crate::{
    auth::{
        backend::{AlmanacAuthBackend, Auth},
        get_auth_object, PermissionsTarget,
    },
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    liquid_utils::compile_with_newtitle,
    routes::FormEvent,
    state::AlmanacState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use axum_login::permission_required;
use chrono::Local;
use snafu::ResultExt;

///`GET` method for the `add_event` form - just compiles and returns the
///liquid `www/add_event.liquid`
#[axum::debug_handler]
async fn get_add_event_form(
    auth: Auth,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let aa = get_auth_object(auth).await?;

    compile_with_newtitle(
        "www/add_event.liquid",
        liquid::object!({ "auth": aa }),
        &state.settings.brand.instance_name,
        Some("New Event".to_string()),
    )
    .await
}

///`POST` method to add an event from a form to the database. Redirects to
///the new event's detail page.
#[axum::debug_handler]
async fn post_add_event_form(
    State(state): State<AlmanacState>,
    Form(event): Form<FormEvent>,
) -> Result<impl IntoResponse, AlmanacError> {
    let event = event.validate(Local::now().date_naive())?;

    let id: i32 = sqlx::query_scalar(
        r#"
INSERT INTO events (name, start_date, end_date, responsible_area, expected_participants, description)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING id
        "#,
    )
    .bind(&event.name)
    .bind(event.start_date)
    .bind(event.end_date)
    .bind(&event.responsible_area)
    .bind(event.expected_participants)
    .bind(&event.description)
    .fetch_one(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::AddingEvent,
    })?;

    info!(%id, name = %event.name, "Added event");

    Ok(Redirect::to(&format!("/event/{id}")))
}

pub fn router() -> Router<AlmanacState> {
    Router::new()
        .route(
            "/add_event",
            get(get_add_event_form).post(post_add_event_form),
        )
        .route_layer(permission_required!(
            AlmanacAuthBackend,
            login_url = "/login",
            PermissionsTarget::EditEvents
        ))
}
