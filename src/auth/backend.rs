use crate::{
    auth::{oauth_client, pipeline, PermissionsTarget},
    error::{AlmanacError, LoginFailureReason, SqlxAction, SqlxSnafu},
    state::{db_objects::DbUser, AlmanacState},
};
use axum_login::{AuthSession, AuthUser, AuthnBackend, AuthzBackend, UserId};
use snafu::ResultExt;
use std::collections::HashSet;

pub type Auth = AuthSession<AlmanacAuthBackend>;

impl AuthUser for DbUser {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        self.access_token
            .as_deref()
            .map_or(self.username.as_bytes(), str::as_bytes)
    }
}

#[derive(Clone)]
pub struct AlmanacAuthBackend {
    pub(crate) state: AlmanacState,
}

impl AlmanacAuthBackend {
    pub fn new(state: AlmanacState) -> Self {
        Self { state }
    }
}

///The callback code from the provider, plus whoever is already logged in so
///the pipeline can short-circuit.
#[derive(Clone, Debug)]
pub struct OAuthCreds {
    pub code: String,
    pub current_user: Option<DbUser>,
}

#[async_trait::async_trait]
impl AuthnBackend for AlmanacAuthBackend {
    type User = DbUser;
    type Credentials = OAuthCreds;
    type Error = AlmanacError;

    async fn authenticate(
        &self,
        OAuthCreds { code, current_user }: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let oauth = &self.state.settings.oauth;
        let access_token =
            oauth_client::exchange_code(&self.state.http_client, oauth, &code).await?;
        let identity =
            oauth_client::fetch_identity(&self.state.http_client, oauth, &access_token).await?;

        let Some(external_username) = identity.username.filter(|username| !username.is_empty())
        else {
            warn!("No username provided in authentication details");
            return Err(AlmanacError::LoginFailure {
                reason: LoginFailureReason::MissingUsername,
            });
        };

        let user = match pipeline::associate_by_identity(
            current_user.as_ref(),
            &external_username,
            &self.state,
        )
        .await?
        {
            Some(user) => user,
            None => {
                let username =
                    pipeline::resolve_username(None, &external_username, &self.state).await?;
                self.state.create_user_with_profile(&username).await?
            }
        };

        let user = self.state.store_access_token(user.id, &access_token).await?;
        info!(username = %user.username, "Successful authentication");

        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        sqlx::query_as(
            r#"
SELECT id, username, access_token, created_at
FROM users
WHERE id = $1
        "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.state.get_connection().await?)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingUser((*user_id).into()),
        })
    }
}

#[async_trait::async_trait]
impl AuthzBackend for AlmanacAuthBackend {
    type Permission = PermissionsTarget;

    async fn get_user_permissions(
        &self,
        _user: &Self::User,
    ) -> Result<HashSet<Self::Permission>, Self::Error> {
        Ok(HashSet::new())
    }

    async fn get_group_permissions(
        &self,
        user: &Self::User,
    ) -> Result<HashSet<Self::Permission>, Self::Error> {
        Ok(self.state.role_for(user.id).await?.can())
    }
}
