use crate::{
    auth::{
        backend::{AlmanacAuthBackend, Auth, OAuthCreds},
        get_auth_object, oauth_client,
    },
    error::{AlmanacError, LoginFailureReason},
    liquid_utils::compile,
    state::AlmanacState,
};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use axum_login::login_required;
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use tower_sessions::Session;

const CSRF_STATE_KEY: &str = "oauth.state";

#[axum::debug_handler]
pub async fn get_login(
    auth: Auth,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    if auth.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let aa = get_auth_object(auth).await?;
    Ok(compile(
        "www/login.liquid",
        liquid::object!({ "auth": aa }),
        &state.settings.brand.instance_name,
    )
    .await?
    .into_response())
}

///Stashes a CSRF state token in the session and bounces to the provider.
#[axum::debug_handler]
pub async fn get_oauth_begin(
    session: Session,
    State(state): State<AlmanacState>,
) -> Result<impl IntoResponse, AlmanacError> {
    let csrf_state: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    session.insert(CSRF_STATE_KEY, csrf_state.clone()).await?;

    info!("Redirecting to identity provider");

    Ok(Redirect::to(&oauth_client::authorize_url(
        &state.settings.oauth,
        &csrf_state,
    )))
}

#[derive(Deserialize)]
pub struct OAuthCallback {
    pub code: String,
    pub state: String,
}

#[axum::debug_handler]
pub async fn get_oauth_callback(
    mut auth: Auth,
    session: Session,
    Query(OAuthCallback { code, state }): Query<OAuthCallback>,
) -> Result<impl IntoResponse, AlmanacError> {
    let Some(expected) = session.remove::<String>(CSRF_STATE_KEY).await? else {
        return Err(AlmanacError::LoginFailure {
            reason: LoginFailureReason::MissingStoredState,
        });
    };
    if expected != state {
        error!("OAuth state mismatch on callback");
        return Err(AlmanacError::LoginFailure {
            reason: LoginFailureReason::StateMismatch,
        });
    }

    let creds = OAuthCreds {
        code,
        current_user: auth.user.clone(),
    };
    let Some(user) = auth.authenticate(creds).await? else {
        return Ok(Redirect::to("/login"));
    };
    auth.login(&user).await?;

    Ok(Redirect::to("/"))
}

#[axum::debug_handler]
pub async fn get_logout(mut auth: Auth) -> Result<impl IntoResponse, AlmanacError> {
    let username = auth.user.as_ref().map(|user| user.username.clone());
    auth.logout().await?;
    info!(?username, "User logged out");
    Ok(Redirect::to("/"))
}

pub fn router() -> Router<AlmanacState> {
    Router::new()
        .route("/logout", get(get_logout))
        .route_layer(login_required!(AlmanacAuthBackend, login_url = "/login"))
        .route("/login", get(get_login))
        .route("/oauth/begin", get(get_oauth_begin))
        .route("/oauth/callback", get(get_oauth_callback))
}
