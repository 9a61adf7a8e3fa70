use crate::{
    auth::{pipeline::UserDirectory, PermissionsRole},
    cfg::Settings,
    error::{AlmanacError, SqlxAction, SqlxSnafu},
    state::db_objects::DbUser,
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::{pool::PoolConnection, Pool, Postgres};

pub mod db_objects;

#[derive(Clone)]
pub struct AlmanacState {
    postgres: Pool<Postgres>,
    pub settings: Settings,
    pub http_client: reqwest::Client,
}

impl AlmanacState {
    pub fn new(postgres: Pool<Postgres>, settings: Settings) -> Self {
        Self {
            postgres,
            settings,
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn get_connection(&self) -> Result<PoolConnection<Postgres>, AlmanacError> {
        self.postgres.acquire().await.context(SqlxSnafu {
            action: SqlxAction::AcquiringConnection,
        })
    }

    ///Creates the user and their blank profile in one transaction, so there
    ///is no observable window where a user exists without a profile.
    pub async fn create_user_with_profile(&self, username: &str) -> Result<DbUser, AlmanacError> {
        let mut tx = self.postgres.begin().await.context(SqlxSnafu {
            action: SqlxAction::AddingUser,
        })?;

        let user: DbUser = sqlx::query_as(
            r#"
INSERT INTO users (username)
VALUES ($1)
RETURNING id, username, access_token, created_at
        "#,
        )
        .bind(username)
        .fetch_one(&mut *tx)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::AddingUser,
        })?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::AddingUser,
            })?;

        tx.commit().await.context(SqlxSnafu {
            action: SqlxAction::AddingUser,
        })?;

        info!(%username, id = %user.id, "Provisioned new user with profile");

        Ok(user)
    }

    pub async fn store_access_token(
        &self,
        user_id: i32,
        access_token: &str,
    ) -> Result<DbUser, AlmanacError> {
        sqlx::query_as(
            r#"
UPDATE users
SET access_token = $1
WHERE id = $2
RETURNING id, username, access_token, created_at
        "#,
        )
        .bind(access_token)
        .bind(user_id)
        .fetch_one(&mut *self.get_connection().await?)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::StoringAccessToken(user_id),
        })
    }

    ///Permissions come from the user's position. No position means the
    ///lowest role.
    pub async fn role_for(&self, user_id: i32) -> Result<PermissionsRole, AlmanacError> {
        let role: Option<PermissionsRole> = sqlx::query_scalar(
            r#"
SELECT po.role
FROM profiles pr
INNER JOIN positions po ON pr.position_id = po.id
WHERE pr.user_id = $1
        "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.get_connection().await?)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingRole(user_id),
        })?;

        Ok(role.unwrap_or(PermissionsRole::Member))
    }
}

#[async_trait]
impl UserDirectory for AlmanacState {
    async fn find_user_by_wiki_handle(
        &self,
        handle: &str,
    ) -> Result<Option<DbUser>, AlmanacError> {
        sqlx::query_as(
            r#"
SELECT u.id, u.username, u.access_token, u.created_at
FROM users u
INNER JOIN profiles pr ON pr.user_id = u.id
WHERE LOWER(pr.professional_wiki_handle) = LOWER($1)
        "#,
        )
        .bind(handle)
        .fetch_optional(&mut *self.get_connection().await?)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingProfile(handle.into()),
        })
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DbUser>, AlmanacError> {
        sqlx::query_as(
            r#"
SELECT id, username, access_token, created_at
FROM users
WHERE username = $1
        "#,
        )
        .bind(username)
        .fetch_optional(&mut *self.get_connection().await?)
        .await
        .context(SqlxSnafu {
            action: SqlxAction::FindingUser(username.into()),
        })
    }

    async fn username_taken(&self, username: &str) -> Result<bool, AlmanacError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&mut *self.get_connection().await?)
            .await
            .context(SqlxSnafu {
                action: SqlxAction::CheckingForUsername(username.to_string()),
            })
    }
}
