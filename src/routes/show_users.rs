use crate::{
    auth::{backend::{AlmanacAuthBackend, Auth}, get_auth_object},
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    liquid_utils::compile,
    state::AlmanacState,
};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use axum_login::login_required;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::FromRow;
use std::collections::HashMap;

#[derive(Deserialize, Serialize, FromRow, Debug, Clone)]
struct DirectoryRow {
    username: String,
    professional_wiki_handle: String,
    position: Option<String>,
    team_area: Option<String>,
    team_code: Option<String>,
}

#[derive(Serialize, Clone)]
struct TeamGroup {
    team_area: String,
    team_code: String,
    people: Vec<DirectoryRow>,
}

#[axum::debug_handler]
async fn get_show_users(
    auth: Auth,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let rows: Vec<DirectoryRow> = sqlx::query_as(
        r#"
SELECT u.username, pr.professional_wiki_handle, po.label AS position, ta.label AS team_area, ta.code AS team_code
FROM users u
INNER JOIN profiles pr ON pr.user_id = u.id
LEFT JOIN positions po ON pr.position_id = po.id
LEFT JOIN team_areas ta ON po.team_area_id = ta.id
ORDER BY u.username
        "#,
    )
    .fetch_all(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingUsers,
    })?;

    let mut groups = HashMap::new();
    for row in rows {
        let team_area = row.team_area.clone().unwrap_or_else(|| "Unassigned".to_string());
        groups
            .entry(team_area.clone())
            .or_insert(TeamGroup {
                team_area,
                team_code: row.team_code.clone().unwrap_or_default(),
                people: vec![],
            })
            .people
            .push(row);
    }
    let mut groups = groups
        .into_values()
        .map(|mut group| {
            group.people.sort_by_key(|row| row.username.clone());
            group
        })
        .collect::<Vec<_>>();
    groups.sort_by_key(|group| group.team_area.clone());

    let aa = get_auth_object(auth).await?;

    compile(
        "www/user_list.liquid",
        liquid::object!({ "auth": aa, "groups": groups }),
        &state.settings.brand.instance_name,
    )
    .await
}

pub fn router() -> Router<AlmanacState> {
    Router::new()
        .route("/directory", get(get_show_users))
        .route_layer(login_required!(AlmanacAuthBackend, login_url = "/login"))
}
