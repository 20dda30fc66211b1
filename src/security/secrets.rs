//! Secret resolution.
//!
//! # Responsibilities
//! - Resolve named secrets stored under a path
//! - Resolve database credentials for store-and-forward
//!
//! Secret values are never logged.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::schema::{DatabaseInfo, InsecureSecretsInfo};

pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("no secrets found at path '{0}'")]
    PathNotFound(String),

    #[error("secret '{key}' not found at path '{path}'")]
    KeyNotFound { path: String, key: String },

    #[error("secret provider error: {0}")]
    Provider(String),
}

/// Database login resolved from the secret provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of secrets for bootstrap and pipeline functions.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Resolve `keys` under `path`. Every requested key must be present.
    async fn get_secrets(
        &self,
        path: &str,
        keys: &[&str],
    ) -> Result<HashMap<String, String>, SecretError>;

    /// Resolve the login for `database`, stored at the database type's path.
    async fn get_database_credentials(
        &self,
        database: &DatabaseInfo,
    ) -> Result<Credentials, SecretError> {
        let mut secrets = self
            .get_secrets(&database.db_type, &[USERNAME_KEY, PASSWORD_KEY])
            .await?;
        Ok(Credentials {
            username: secrets.remove(USERNAME_KEY).unwrap_or_default(),
            password: secrets.remove(PASSWORD_KEY).unwrap_or_default(),
        })
    }
}

/// Serves secrets straight from the `writable.insecure_secrets` table.
#[derive(Debug, Clone, Default)]
pub struct InsecureSecretProvider {
    by_path: HashMap<String, HashMap<String, String>>,
}

impl InsecureSecretProvider {
    pub fn new(table: &HashMap<String, InsecureSecretsInfo>) -> Self {
        let by_path = table
            .values()
            .map(|entry| (entry.path.clone(), entry.secrets.clone()))
            .collect();
        Self { by_path }
    }
}

#[async_trait]
impl SecretProvider for InsecureSecretProvider {
    async fn get_secrets(
        &self,
        path: &str,
        keys: &[&str],
    ) -> Result<HashMap<String, String>, SecretError> {
        let secrets = self
            .by_path
            .get(path)
            .ok_or_else(|| SecretError::PathNotFound(path.to_string()))?;

        keys.iter()
            .map(|key| {
                secrets
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
                    .ok_or_else(|| SecretError::KeyNotFound {
                        path: path.to_string(),
                        key: key.to_string(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> InsecureSecretProvider {
        let mut table = HashMap::new();
        table.insert(
            "DB".to_string(),
            InsecureSecretsInfo {
                path: "surrealdb".into(),
                secrets: HashMap::from([
                    ("username".to_string(), "root".to_string()),
                    ("password".to_string(), "hunter2".to_string()),
                ]),
            },
        );
        table.insert(
            "http".to_string(),
            InsecureSecretsInfo {
                path: "http-export".into(),
                secrets: HashMap::from([("api-key".to_string(), "abc123".to_string())]),
            },
        );
        InsecureSecretProvider::new(&table)
    }

    #[tokio::test]
    async fn test_get_secrets_by_path() {
        let secrets = provider()
            .get_secrets("http-export", &["api-key"])
            .await
            .unwrap();
        assert_eq!(secrets["api-key"], "abc123");
    }

    #[tokio::test]
    async fn test_missing_path_and_key() {
        let p = provider();
        assert!(matches!(
            p.get_secrets("nope", &["api-key"]).await,
            Err(SecretError::PathNotFound(_))
        ));
        assert!(matches!(
            p.get_secrets("http-export", &["token"]).await,
            Err(SecretError::KeyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_database_credentials() {
        let creds = provider()
            .get_database_credentials(&DatabaseInfo::default())
            .await
            .unwrap();
        assert_eq!(creds.username, "root");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
