//! Out-of-band credential lookup for storage backends.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Secret name holding the S3 secret access key
pub const S3_SECRET: &str = "s3_secret";

/// Secret name holding the FTP password
pub const FTP_PASSWORD: &str = "ftp_password";

/// Source of backend credentials
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Look up a secret by name
    async fn get_secret(&self, name: &str) -> Result<Option<String>>;

    /// Look up a secret that must exist
    async fn require_secret(&self, name: &str) -> Result<String> {
        self.get_secret(name)
            .await?
            .ok_or_else(|| Error::MissingSecret(name.to_string()))
    }
}

/// Reads secrets from environment variables (`PRESSBOX_SECRET_<NAME>`)
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    prefix: String,
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new("PRESSBOX_SECRET_")
    }
}

impl EnvSecretProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name.to_uppercase())
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<Option<String>> {
        Ok(std::env::var(self.var_name(name)).ok())
    }
}

/// Fixed secrets, for embedding hosts and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticSecrets {
    async fn get_secret(&self, name: &str) -> Result<Option<String>> {
        Ok(self.secrets.get(name).cloned())
    }
}
