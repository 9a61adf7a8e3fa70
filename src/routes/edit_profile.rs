//! Profile pages: viewing a member's profile and editing your own.

use crate::{
    auth::{backend::{AlmanacAuthBackend, Auth}, get_auth_object},
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    liquid_utils::compile_with_newtitle,
    state::{
        db_objects::{DbPosition, DbProfile, DbTeamArea, Gender},
        AlmanacState,
    },
};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use axum_login::login_required;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use sqlx::FromRow;
use std::collections::HashMap;

#[derive(Deserialize, Serialize, FromRow, Debug)]
struct ProfileView {
    username: String,
    professional_wiki_handle: String,
    personal_wiki_handle: String,
    gender: Gender,
    position: Option<String>,
    team_area: Option<String>,
    twitter: String,
    facebook: String,
    instagram: String,
    linkedin: String,
    wikidata_item: String,
    orcid: String,
}

async fn fetch_profile(
    state: &AlmanacState,
    username: &str,
) -> Result<ProfileView, AlmanacError> {
    sqlx::query_as(
        r#"
SELECT u.username, pr.professional_wiki_handle, pr.personal_wiki_handle, pr.gender,
       po.label AS position, ta.label AS team_area,
       pr.twitter, pr.facebook, pr.instagram, pr.linkedin, pr.wikidata_item, pr.orcid
FROM users u
INNER JOIN profiles pr ON pr.user_id = u.id
LEFT JOIN positions po ON pr.position_id = po.id
LEFT JOIN team_areas ta ON po.team_area_id = ta.id
WHERE u.username = $1
        "#,
    )
    .bind(username)
    .fetch_one(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingProfile(username.into()),
    })
}

#[axum::debug_handler]
async fn get_own_profile(
    auth: Auth,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let Some(user) = auth.user.clone() else {
        return Ok(Redirect::to("/login").into_response());
    };

    let profile = fetch_profile(&state, &user.username).await?;
    let aa = get_auth_object(auth).await?;

    Ok(compile_with_newtitle(
        "www/profile.liquid",
        liquid::object!({ "auth": aa, "profile": profile, "is_own": true }),
        &state.settings.brand.instance_name,
        Some(user.username),
    )
    .await?
    .into_response())
}

#[axum::debug_handler]
async fn get_profile(
    auth: Auth,
    Path(username): Path<String>,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let is_own = auth
        .user
        .as_ref()
        .map_or(false, |user| user.username == username);
    let profile = fetch_profile(&state, &username).await?;
    let aa = get_auth_object(auth).await?;

    compile_with_newtitle(
        "www/profile.liquid",
        liquid::object!({ "auth": aa, "profile": profile, "is_own": is_own }),
        &state.settings.brand.instance_name,
        Some(username),
    )
    .await
}

#[derive(Serialize, Debug)]
struct PositionChoice {
    id: i32,
    label: String,
    team_area: String,
}

#[axum::debug_handler]
async fn get_edit_profile(
    auth: Auth,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let Some(user) = auth.user.clone() else {
        return Ok(Redirect::to("/login").into_response());
    };

    let profile: DbProfile = sqlx::query_as(
        r#"
SELECT id, user_id, professional_wiki_handle, personal_wiki_handle, gender, position_id,
       twitter, facebook, instagram, linkedin, wikidata_item, orcid
FROM profiles
WHERE user_id = $1
        "#,
    )
    .bind(user.id)
    .fetch_one(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::FindingProfile(user.id.into()),
    })?;

    let positions: Vec<DbPosition> =
        sqlx::query_as("SELECT id, label, role, team_area_id FROM positions ORDER BY label")
            .fetch_all(&mut *state.get_connection().await?)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingPositions,
            })?;

    let team_areas: Vec<DbTeamArea> =
        sqlx::query_as("SELECT id, label, code FROM team_areas ORDER BY label")
            .fetch_all(&mut *state.get_connection().await?)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::FindingTeamAreas,
            })?;

    let area_labels: HashMap<i32, String> = team_areas
        .into_iter()
        .map(|area| (area.id, area.label))
        .collect();
    let mut positions = positions
        .into_iter()
        .map(|position| PositionChoice {
            id: position.id,
            label: position.label,
            team_area: area_labels
                .get(&position.team_area_id)
                .cloned()
                .unwrap_or_default(),
        })
        .collect::<Vec<_>>();
    positions.sort_by(|a, b| (&a.team_area, &a.label).cmp(&(&b.team_area, &b.label)));

    let aa = get_auth_object(auth).await?;

    Ok(compile_with_newtitle(
        "www/edit_profile.liquid",
        liquid::object!({
            "auth": aa,
            "profile": profile,
            "positions": positions,
        }),
        &state.settings.brand.instance_name,
        Some("Edit Profile".to_string()),
    )
    .await?
    .into_response())
}

///`position_id` 0 means no position - the select always submits a number.
#[derive(Deserialize, Debug)]
pub struct FormProfile {
    pub professional_wiki_handle: String,
    pub personal_wiki_handle: String,
    pub gender: Gender,
    pub position_id: i32,
    pub twitter: String,
    pub facebook: String,
    pub instagram: String,
    pub linkedin: String,
    pub wikidata_item: String,
    pub orcid: String,
}

#[axum::debug_handler]
#[instrument(level = "debug", skip(auth, state, form))]
async fn post_edit_profile(
    auth: Auth,
    State(state): State<AlmanacState>,
    Form(form): Form<FormProfile>,
) -> Result<impl IntoResponse, AlmanacError> {
    let Some(user) = auth.user else {
        return Ok(Redirect::to("/login"));
    };

    let position_id = (form.position_id != 0).then_some(form.position_id);

    sqlx::query(
        r#"
UPDATE profiles
SET professional_wiki_handle = $2, personal_wiki_handle = $3, gender = $4, position_id = $5,
    twitter = $6, facebook = $7, instagram = $8, linkedin = $9, wikidata_item = $10, orcid = $11
WHERE user_id = $1
        "#,
    )
    .bind(user.id)
    .bind(&form.professional_wiki_handle)
    .bind(&form.personal_wiki_handle)
    .bind(form.gender)
    .bind(position_id)
    .bind(&form.twitter)
    .bind(&form.facebook)
    .bind(&form.instagram)
    .bind(&form.linkedin)
    .bind(&form.wikidata_item)
    .bind(&form.orcid)
    .execute(&mut *state.get_connection().await?)
    .await
    .context(SqlxSnafu {
        action: SqlxAction::UpdatingProfile(user.id.into()),
    })?;

    info!(username = %user.username, "Updated profile");

    Ok(Redirect::to("/profile"))
}

pub fn router() -> Router<AlmanacState> {
    Router::new()
        .route("/profile", get(get_own_profile))
        .route("/profile/:username", get(get_profile))
        .route(
            "/edit_profile",
            get(get_edit_profile).post(post_edit_profile),
        )
        .route_layer(login_required!(AlmanacAuthBackend, login_url = "/login"))
}
