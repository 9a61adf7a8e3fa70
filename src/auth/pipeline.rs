//! Matches an incoming external identity to a local account.
//!
//! Supports accounts that predate external-identity login: an existing user
//! is re-associated by their professional wiki handle (or, failing that,
//! their username) instead of getting a duplicate account.

use crate::{error::AlmanacError, state::db_objects::DbUser};
use async_trait::async_trait;

///The storage lookups the pipeline needs, injected so the two stages can be
///exercised against an in-memory directory.
#[async_trait]
pub trait UserDirectory {
    ///Case-insensitive match on the professional wiki handle.
    async fn find_user_by_wiki_handle(&self, handle: &str)
        -> Result<Option<DbUser>, AlmanacError>;
    ///Exact match on the local username.
    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<DbUser>, AlmanacError>;
    async fn username_taken(&self, username: &str) -> Result<bool, AlmanacError>;
}

///Stage A: find the local account for an external username, if any.
///
///Returns the already-authenticated user untouched, then tries the
///professional wiki handle (case-insensitively), then the username. `None`
///means the caller should provision a new account.
pub async fn associate_by_identity<D: UserDirectory + Sync>(
    current_user: Option<&DbUser>,
    external_username: &str,
    directory: &D,
) -> Result<Option<DbUser>, AlmanacError> {
    if let Some(user) = current_user {
        info!(username = %user.username, "User already authenticated");
        return Ok(Some(user.clone()));
    }

    if let Some(user) = directory.find_user_by_wiki_handle(external_username).await? {
        info!(%external_username, username = %user.username, "User matched by wiki handle");
        return Ok(Some(user));
    }

    if let Some(user) = directory.find_user_by_username(external_username).await? {
        info!(%external_username, "User matched by username");
        return Ok(Some(user));
    }

    info!(%external_username, "No local match, new user will be created");

    Ok(None)
}

///Stage B: pick the username a new login will end up with.
///
///An authenticated user keeps their existing username - this is
///authentication, not renaming. Otherwise the proposed name is probed and
///suffixed with `_1`, `_2`, ... until free, so the outcome is deterministic
///for a fixed set of existing usernames.
pub async fn resolve_username<D: UserDirectory + Sync>(
    current_user: Option<&DbUser>,
    proposed_username: &str,
    directory: &D,
) -> Result<String, AlmanacError> {
    if let Some(user) = current_user {
        return Ok(user.username.clone());
    }

    let mut candidate = proposed_username.to_string();
    let mut counter = 1;

    while directory.username_taken(&candidate).await? {
        candidate = format!("{proposed_username}_{counter}");
        counter += 1;
    }

    if candidate != proposed_username {
        warn!(%proposed_username, %candidate, "Username conflict resolved");
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct InMemoryDirectory {
        users: Vec<DbUser>,
        //(professional wiki handle, username)
        handles: Vec<(String, String)>,
    }

    impl InMemoryDirectory {
        fn new(users: &[&str], handles: &[(&str, &str)]) -> Self {
            Self {
                users: users
                    .iter()
                    .enumerate()
                    .map(|(id, username)| user(i32::try_from(id).unwrap() + 1, username))
                    .collect(),
                handles: handles
                    .iter()
                    .map(|(handle, username)| (handle.to_string(), username.to_string()))
                    .collect(),
            }
        }
    }

    fn user(id: i32, username: &str) -> DbUser {
        DbUser {
            id,
            username: username.to_string(),
            access_token: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[async_trait]
    impl UserDirectory for InMemoryDirectory {
        async fn find_user_by_wiki_handle(
            &self,
            handle: &str,
        ) -> Result<Option<DbUser>, AlmanacError> {
            Ok(self
                .handles
                .iter()
                .find(|(stored, _)| stored.eq_ignore_ascii_case(handle))
                .and_then(|(_, username)| {
                    self.users.iter().find(|user| &user.username == username)
                })
                .cloned())
        }

        async fn find_user_by_username(
            &self,
            username: &str,
        ) -> Result<Option<DbUser>, AlmanacError> {
            Ok(self
                .users
                .iter()
                .find(|user| user.username == username)
                .cloned())
        }

        async fn username_taken(&self, username: &str) -> Result<bool, AlmanacError> {
            Ok(self.users.iter().any(|user| user.username == username))
        }
    }

    #[tokio::test]
    async fn authenticated_user_is_returned_unchanged() {
        let directory = InMemoryDirectory::new(&["alex"], &[("AlexW", "alex")]);
        let current = user(99, "someone_else");

        let found = associate_by_identity(Some(&current), "alexw", &directory)
            .await
            .unwrap();

        assert_eq!(found.unwrap().username, "someone_else");
    }

    #[tokio::test]
    async fn handle_match_is_case_insensitive() {
        let directory = InMemoryDirectory::new(&["alex"], &[("AlexW", "alex")]);

        let found = associate_by_identity(None, "alexw", &directory)
            .await
            .unwrap();

        assert_eq!(found.unwrap().username, "alex");
    }

    #[tokio::test]
    async fn falls_back_to_exact_username_match() {
        let directory = InMemoryDirectory::new(&["alex"], &[]);

        let found = associate_by_identity(None, "alex", &directory).await.unwrap();

        assert_eq!(found.unwrap().username, "alex");
    }

    #[tokio::test]
    async fn no_match_signals_provisioning() {
        let directory = InMemoryDirectory::new(&["alex"], &[("AlexW", "alex")]);

        let found = associate_by_identity(None, "nobody_here", &directory)
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn handle_match_wins_over_username_match() {
        //"taken" is both someone's handle and someone else's username
        let directory = InMemoryDirectory::new(&["taken", "other"], &[("taken", "other")]);

        let found = associate_by_identity(None, "taken", &directory).await.unwrap();

        assert_eq!(found.unwrap().username, "other");
    }

    #[tokio::test]
    async fn authenticated_user_keeps_their_username() {
        let directory = InMemoryDirectory::new(&["sam"], &[]);
        let current = user(1, "sam");

        let username = resolve_username(Some(&current), "completely_different", &directory)
            .await
            .unwrap();

        assert_eq!(username, "sam");
    }

    #[tokio::test]
    async fn free_username_is_used_as_is() {
        let directory = InMemoryDirectory::new(&["sam"], &[]);

        let username = resolve_username(None, "alex", &directory).await.unwrap();

        assert_eq!(username, "alex");
    }

    #[tokio::test]
    async fn conflicts_get_the_smallest_free_suffix() {
        let directory = InMemoryDirectory::new(&["sam", "sam_1", "sam_2"], &[]);

        let username = resolve_username(None, "sam", &directory).await.unwrap();

        assert_eq!(username, "sam_3");
    }

    #[tokio::test]
    async fn suffix_probing_skips_holes_deterministically() {
        //sam_2 is free even though sam_1 is taken
        let directory = InMemoryDirectory::new(&["sam", "sam_1", "sam_3"], &[]);

        let username = resolve_username(None, "sam", &directory).await.unwrap();

        assert_eq!(username, "sam_2");
    }
}
