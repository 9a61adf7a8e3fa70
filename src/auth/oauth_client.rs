//! Thin client for the external identity provider.
//!
//! The provider owns the OAuth handshake; this module only builds the
//! authorize redirect, swaps the callback code for a bearer token, and asks
//! who the token belongs to.

use crate::{
    cfg::OAuthSettings,
    error::{
        AlmanacError, ReqwestAction, ReqwestSnafu, SerdeJsonAction, SerdeJsonSnafu,
    },
};
use reqwest::Client;
use serde::Deserialize;
use snafu::ResultExt;

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

///The details map the provider resolves a token to. Only the username is
///contractual; everything else the provider sends is ignored.
#[derive(Deserialize, Debug)]
pub struct ResolvedIdentity {
    pub username: Option<String>,
}

pub fn authorize_url(settings: &OAuthSettings, csrf_state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&state={}",
        settings.authorize_url, settings.client_id, settings.redirect_url, csrf_state
    )
}

pub async fn exchange_code(
    client: &Client,
    settings: &OAuthSettings,
    code: &str,
) -> Result<String, AlmanacError> {
    let response = client
        .post(&settings.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", settings.client_id.as_str()),
            ("client_secret", settings.client_secret.as_str()),
            ("redirect_uri", settings.redirect_url.as_str()),
        ])
        .send()
        .await
        .context(ReqwestSnafu {
            action: ReqwestAction::ExchangingAuthCode,
        })?;

    let body = response
        .error_for_status()
        .map_err(|source| {
            let status = source.status();
            AlmanacError::Reqwest {
                source,
                action: ReqwestAction::ErrorForStatus(status),
            }
        })?
        .text()
        .await
        .context(ReqwestSnafu {
            action: ReqwestAction::ExchangingAuthCode,
        })?;

    let token: TokenResponse = serde_json::from_str(&body).context(SerdeJsonSnafu {
        action: SerdeJsonAction::TokenResponse,
    })?;

    Ok(token.access_token)
}

pub async fn fetch_identity(
    client: &Client,
    settings: &OAuthSettings,
    access_token: &str,
) -> Result<ResolvedIdentity, AlmanacError> {
    let body = client
        .get(&settings.profile_url)
        .bearer_auth(access_token)
        .send()
        .await
        .context(ReqwestSnafu {
            action: ReqwestAction::FetchingIdentity,
        })?
        .error_for_status()
        .map_err(|source| {
            let status = source.status();
            AlmanacError::Reqwest {
                source,
                action: ReqwestAction::ErrorForStatus(status),
            }
        })?
        .text()
        .await
        .context(ReqwestSnafu {
            action: ReqwestAction::FetchingIdentity,
        })?;

    serde_json::from_str(&body).context(SerdeJsonSnafu {
        action: SerdeJsonAction::IdentityResponse,
    })
}
