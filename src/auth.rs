pub mod backend;
pub mod login;
pub mod oauth_client;
pub mod pipeline;

use self::backend::Auth;
use crate::error::AlmanacError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::{EnumIter, IntoEnumIterator};

///The permission group a [`crate::state::db_objects::DbPosition`] belongs
///to. Ordered so that a higher role can do everything a lower one can.
#[derive(
    sqlx::Type, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize, Debug,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionsRole {
    Member,
    Organiser,
    Admin,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, EnumIter)]
pub enum PermissionsTarget {
    EditEvents,
    ViewDirectory,
    EditOwnProfile,
}

impl PermissionsTarget {
    pub const fn minimum_role(self) -> PermissionsRole {
        match self {
            Self::EditEvents => PermissionsRole::Organiser,
            Self::ViewDirectory | Self::EditOwnProfile => PermissionsRole::Member,
        }
    }
}

impl PermissionsRole {
    pub fn can(self) -> HashSet<PermissionsTarget> {
        PermissionsTarget::iter()
            .filter(|target| target.minimum_role() <= self)
            .collect()
    }
}

///Everything the templates need to render the navbar and gate buttons.
pub async fn get_auth_object(auth: Auth) -> Result<liquid::Object, AlmanacError> {
    if let Some(user) = &auth.user {
        let role = auth.backend.state.role_for(user.id).await?;
        let perms = liquid::object!({
            "edit_events": role >= PermissionsRole::Organiser,
            "view_directory": true,
            "edit_own_profile": true,
        });

        Ok(liquid::object!({
            "is_logged_in": true,
            "role": role,
            "permissions": perms,
            "user": liquid::object!({ "id": user.id, "username": user.username.clone() }),
        }))
    } else {
        let perms = liquid::object!({
            "edit_events": false,
            "view_directory": false,
            "edit_own_profile": false,
        });

        Ok(liquid::object!({
            "is_logged_in": false,
            "role": "visitor",
            "permissions": perms,
        }))
    }
}
