//! In-memory `UserRepository` for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use subtle::ConstantTimeEq;

use super::repository::UserRepository;
use crate::auth::{AuthError, AuthResult, NewUser, User, UserId};

/// In-memory user store backed by a mutex-guarded map.
///
/// Mirrors the semantics of the Postgres implementation closely enough
/// for lifecycle tests, including the conditional refresh-token swap.
pub struct MemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
    next_id: Mutex<UserId>,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }

    /// Preload a user record, for tests
    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().insert(user.id, user);
        self
    }

    /// Read the currently stored refresh token for a user, for tests
    pub fn stored_refresh_token(&self, user_id: UserId) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .and_then(|u| u.refresh_token.clone())
    }
}

fn token_matches(stored: Option<&String>, presented: &str) -> bool {
    match stored {
        Some(stored) => bool::from(stored.as_bytes().ct_eq(presented.as_bytes())),
        None => false,
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, new_user: NewUser) -> AuthResult<User> {
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;

        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            password_hash: new_user.password_hash,
            avatar_url: new_user.avatar_url,
            cover_image_url: new_user.cover_image_url,
            refresh_token: None,
            created_at: chrono::Utc::now(),
        };

        self.users.lock().unwrap().insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> AuthResult<bool> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .any(|u| u.username == username || u.email == email))
    }

    async fn set_refresh_token(&self, user_id: UserId, token: &str) -> AuthResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.refresh_token = Some(token.to_string());
        Ok(())
    }

    async fn clear_refresh_token(&self, user_id: UserId) -> AuthResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.refresh_token = None;
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        user_id: UserId,
        presented: &str,
        next: &str,
    ) -> AuthResult<bool> {
        // Single critical section: the compare and the overwrite happen
        // under one lock, matching the Postgres conditional UPDATE.
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;

        if token_matches(user.refresh_token.as_ref(), presented) {
            user.refresh_token = Some(next.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn update_password_hash(&self, user_id: UserId, password_hash: &str) -> AuthResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn update_account_details(
        &self,
        user_id: UserId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> AuthResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        if let Some(full_name) = full_name {
            user.full_name = full_name.to_string();
        }
        if let Some(email) = email {
            user.email = email.to_string();
        }
        Ok(user.clone())
    }

    async fn update_avatar(&self, user_id: UserId, url: &str) -> AuthResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.avatar_url = url.to_string();
        Ok(user.clone())
    }

    async fn update_cover_image(&self, user_id: UserId, url: &str) -> AuthResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.cover_image_url = Some(url.to_string());
        Ok(user.clone())
    }

    async fn health_check(&self) -> AuthResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: "memory://assets/a".to_string(),
            cover_image_url: None,
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = MemoryUserRepository::new();

        let user = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();
        assert_eq!(user.id, 1);

        assert!(repo.find_by_id(user.id).await.unwrap().is_some());
        assert!(repo.find_by_username("alice").await.unwrap().is_some());
        assert!(repo.find_by_email("a@x.com").await.unwrap().is_some());
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uniqueness_check_covers_both_fields() {
        let repo = MemoryUserRepository::new();
        repo.create_user(new_user("alice", "a@x.com")).await.unwrap();

        assert!(repo.username_or_email_taken("alice", "other@x.com").await.unwrap());
        assert!(repo.username_or_email_taken("other", "a@x.com").await.unwrap());
        assert!(!repo.username_or_email_taken("bob", "b@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn swap_requires_matching_token() {
        let repo = MemoryUserRepository::new();
        let user = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();

        // Nothing stored yet: swap must fail.
        assert!(!repo.swap_refresh_token(user.id, "old", "new").await.unwrap());

        repo.set_refresh_token(user.id, "old").await.unwrap();
        assert!(repo.swap_refresh_token(user.id, "old", "new").await.unwrap());
        assert_eq!(repo.stored_refresh_token(user.id).as_deref(), Some("new"));

        // The old value is spent.
        assert!(!repo.swap_refresh_token(user.id, "old", "newer").await.unwrap());
        assert_eq!(repo.stored_refresh_token(user.id).as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn clear_unsets_token() {
        let repo = MemoryUserRepository::new();
        let user = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();

        repo.set_refresh_token(user.id, "tok").await.unwrap();
        repo.clear_refresh_token(user.id).await.unwrap();
        assert_eq!(repo.stored_refresh_token(user.id), None);
        assert!(!repo.swap_refresh_token(user.id, "tok", "new").await.unwrap());
    }
}
