use std::path::PathBuf;
use std::time::Duration;

use moka::future::Cache;
use tokio::fs;
use tracing::{error, info};

use crate::models::{User, UserFile};

#[derive(Debug)]
pub enum UserLookupError {
    NotFound(String),
    Unavailable(String),
}

impl std::fmt::Display for UserLookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserLookupError::NotFound(email) => write!(f, "User '{}' not found", email),
            UserLookupError::Unavailable(e) => write!(f, "User directory unavailable: {}", e),
        }
    }
}

impl std::error::Error for UserLookupError {}

/// Login collaborator: resolves an email to a known user from the users file.
///
/// Found users are cached; unknown emails always go back to the file so newly
/// added users can log in without a restart.
pub struct UserDirectory {
    path: PathBuf,
    cache: Cache<String, User>,
}

impl UserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    pub async fn lookup_user(&self, email: &str) -> Result<User, UserLookupError> {
        let key = email.trim().to_lowercase();
        if let Some(user) = self.cache.get(&key).await {
            return Ok(user);
        }

        info!("User cache miss for '{}'. Reading {}", key, self.path.display());
        let user = self
            .read_users()
            .await?
            .into_iter()
            .find(|u| u.email.trim().eq_ignore_ascii_case(&key))
            .ok_or_else(|| UserLookupError::NotFound(key.clone()))?;

        self.cache.insert(key, user.clone()).await;
        Ok(user)
    }

    pub fn cached_users(&self) -> u64 {
        self.cache.entry_count()
    }

    async fn read_users(&self) -> Result<Vec<User>, UserLookupError> {
        let raw = fs::read_to_string(&self.path).await.map_err(|e| {
            error!("Failed to read users file {}: {}", self.path.display(), e);
            UserLookupError::Unavailable(e.to_string())
        })?;
        let file: UserFile = serde_json::from_str(&raw).map_err(|e| {
            error!("Failed to parse users file {}: {}", self.path.display(), e);
            UserLookupError::Unavailable(e.to_string())
        })?;
        Ok(file.users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS: &str = r#"{
        "usuarios": [
            { "id": "1", "nombre": "Ana", "email": "ana@example.com" },
            { "id": "2", "nombre": "Ben", "email": "ben@example.com" }
        ]
    }"#;

    #[tokio::test]
    async fn finds_user_by_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, USERS).unwrap();
        let users = UserDirectory::new(&path);

        let user = users.lookup_user(" Ana@Example.com ").await.unwrap();
        assert_eq!(user, User { id: "1".into(), name: "Ana".into(), email: "ana@example.com".into() });
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, USERS).unwrap();
        let users = UserDirectory::new(&path);

        assert!(matches!(users.lookup_user("zoe@example.com").await, Err(UserLookupError::NotFound(_))));
    }

    #[tokio::test]
    async fn cached_user_survives_file_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, USERS).unwrap();
        let users = UserDirectory::new(&path);

        users.lookup_user("ben@example.com").await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(users.lookup_user("ben@example.com").await.unwrap().name, "Ben");
        assert!(matches!(users.lookup_user("ana@example.com").await, Err(UserLookupError::Unavailable(_))));
    }

    #[tokio::test]
    async fn accepts_english_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{"users":[{"id":"9","name":"Cy","email":"cy@example.com"}]}"#).unwrap();
        let users = UserDirectory::new(&path);

        assert_eq!(users.lookup_user("cy@example.com").await.unwrap().id, "9");
    }
}
