use crate::{
    auth::{backend::AlmanacAuthBackend, PermissionsTarget},
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    state::AlmanacState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    routing::post,
    Router,
};
use axum_extra::extract::Form;
use axum_login::permission_required;
use serde::Deserialize;
use snafu::ResultExt;

#[derive(Deserialize)]
pub struct Removal {
    pub event_id: i32,
}

#[axum::debug_handler]
async fn post_remove_event(
    State(state): State<AlmanacState>,
    Form(Removal { event_id }): Form<Removal>,
) -> Result<impl IntoResponse, AlmanacError> {
    let name: String = sqlx::query_scalar(
        r#"
DELETE FROM events
WHERE id = $1
RETURNING name
        "#,
    )
    .bind(event_id)
    .fetch_one(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::RemovingEvent(event_id),
    })?;

    info!(%event_id, %name, "Removed event");

    Ok(Redirect::to("/events"))
}

pub fn router() -> Router<AlmanacState> {
    Router::new()
        .route("/remove_event", post(post_remove_event))
        .route_layer(permission_required!(
            AlmanacAuthBackend,
            login_url = "/login",
            PermissionsTarget::EditEvents
        ))
}
