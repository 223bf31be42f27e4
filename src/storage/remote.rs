//! Remote storage through opendal: S3-compatible object stores and FTP/FTPS.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::layers::TimeoutLayer;
use opendal::{services, ErrorKind, Operator};
use tracing::debug;

use super::{directory_to_delete, join_path, StorageBackend};
use crate::config::{FtpConfig, FtpTlsMode, S3Config};
use crate::error::{Error, Result};

/// Region used when an S3 config names none (MinIO and most gateways accept it)
const DEFAULT_REGION: &str = "us-east-1";

/// A storage backend driving an opendal [`Operator`]
#[derive(Debug, Clone)]
pub struct RemoteStorage {
    name: String,
    operator: Operator,
    base_path: Option<String>,
}

impl RemoteStorage {
    /// Wrap an already configured operator
    pub fn from_operator(
        name: impl Into<String>,
        operator: Operator,
        base_path: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            operator,
            base_path,
        }
    }

    /// Connect to an S3-compatible bucket. External paths are prefixed with the bucket.
    pub fn s3(config: &S3Config, secret_key: &str) -> Result<Self> {
        let builder = services::S3::default()
            .endpoint(&s3_endpoint(config))
            .bucket(&config.bucket)
            .region(config.region.as_deref().unwrap_or(DEFAULT_REGION))
            .access_key_id(&config.client_id)
            .secret_access_key(secret_key);

        let operator = Operator::new(builder)?
            .layer(TimeoutLayer::new().with_timeout(Duration::from_secs(config.timeout_seconds)))
            .finish();

        debug!(endpoint = %config.server_address, bucket = %config.bucket, "Configured S3 storage");

        Ok(Self::from_operator("s3", operator, Some(config.bucket.clone())))
    }

    /// Connect to an FTP server. All paths are rooted at the configured base path.
    pub fn ftp(config: &FtpConfig, password: &str) -> Result<Self> {
        let endpoint = ftp_endpoint(config)?;

        let mut builder = services::Ftp::default()
            .endpoint(&endpoint)
            .user(&config.username)
            .password(password);

        if let Some(base) = config.base_path.as_deref().filter(|b| !b.trim().is_empty()) {
            builder = builder.root(&format!("/{}", join_path(&[base])));
        }

        let operator = Operator::new(builder)?
            .layer(TimeoutLayer::new().with_timeout(Duration::from_secs(config.timeout_seconds)))
            .finish();

        debug!(%endpoint, "Configured FTP storage");

        Ok(Self::from_operator("ftp", operator, config.base_path.clone()))
    }
}

fn s3_endpoint(config: &S3Config) -> String {
    let address = config.server_address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        return address.to_string();
    }

    let scheme = if config.use_ssl { "https" } else { "http" };
    format!("{}://{}", scheme, address)
}

fn ftp_endpoint(config: &FtpConfig) -> Result<String> {
    let host = config
        .url
        .trim()
        .trim_start_matches("ftps://")
        .trim_start_matches("ftp://")
        .trim_end_matches('/');

    if host.is_empty() {
        return Err(Error::Config(format!("invalid FTP url '{}'", config.url)));
    }

    match config.tls {
        FtpTlsMode::None => Ok(format!("ftp://{}", host)),
        FtpTlsMode::Explicit => Ok(format!("ftps://{}", host)),
        // The FTP client only negotiates TLS through AUTH TLS
        FtpTlsMode::Implicit => Err(Error::Config(
            "implicit FTPS is not supported, use tls: explicit".to_string(),
        )),
    }
}

fn update_failed(path: &str, err: opendal::Error) -> Error {
    Error::StorageUpdateFailed {
        path: path.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl StorageBackend for RemoteStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_file(&self, path: &str) -> Result<Option<Bytes>> {
        match self.operator.read(path).await {
            Ok(buffer) => {
                debug!(backend = %self.name, path, bytes = buffer.len(), "Read file");
                Ok(Some(buffer.to_bytes()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(backend = %self.name, path, "File not found");
                Ok(None)
            }
            Err(e) => Err(Error::Backend(e)),
        }
    }

    async fn write_file(&self, path: &str, data: Bytes, content_type: &str) -> Result<()> {
        let len = data.len();
        let supports_content_type = self
            .operator
            .info()
            .full_capability()
            .write_with_content_type;

        let result = if supports_content_type {
            self.operator
                .write_with(path, data)
                .content_type(content_type)
                .await
        } else {
            self.operator.write(path, data).await
        };

        result.map_err(|e| update_failed(path, e))?;
        debug!(backend = %self.name, path, bytes = len, content_type, "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.operator
            .delete(path)
            .await
            .map_err(|e| update_failed(path, e))?;
        debug!(backend = %self.name, path, "Deleted file");
        Ok(())
    }

    async fn delete_directory(&self, path: &str) -> Result<()> {
        let dir = format!("{}/", directory_to_delete(path)?);
        self.operator
            .remove_all(&dir)
            .await
            .map_err(|e| update_failed(&dir, e))?;
        debug!(backend = %self.name, path = %dir, "Deleted directory");
        Ok(())
    }

    fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }
}
