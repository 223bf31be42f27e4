//! Process-wide wiring of the storage facade and catalog managers.

use std::sync::Arc;

use crate::catalog::{ChannelManager, ContentManager, PostManager};
use crate::config::ResolvedConfig;
use crate::error::Result;
use crate::storage::{BackendRegistry, SecretProvider, StorageFacade};

/// The managers, built once at startup and shared by reference
#[derive(Debug, Clone)]
pub struct Services {
    pub storage: StorageFacade,
    pub channels: Arc<ChannelManager>,
    pub content: Arc<ContentManager>,
    pub posts: Arc<PostManager>,
}

impl Services {
    /// Select the storage backend from configuration and build the managers on it
    pub async fn build(
        config: &ResolvedConfig,
        secrets: &dyn SecretProvider,
        registry: &BackendRegistry,
    ) -> Result<Self> {
        let storage = StorageFacade::from_config(&config.storage, secrets, registry).await?;
        Ok(Self::with_storage(config, storage))
    }

    /// Build the managers on an already constructed facade
    pub fn with_storage(config: &ResolvedConfig, storage: StorageFacade) -> Self {
        let channels = Arc::new(ChannelManager::new(storage.clone(), &config.channel_index));
        let content = Arc::new(ContentManager::new(
            storage.clone(),
            &config.content_index,
            config.max_content_length,
        ));
        let posts = Arc::new(PostManager::new(storage.clone(), content.clone()));

        Self {
            storage,
            channels,
            content,
            posts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StaticSecrets, StorageBackend};
    use crate::config::StorageConfig;

    #[tokio::test]
    async fn test_build_with_registered_backend() {
        let registry = BackendRegistry::new()
            .with_backend("scratch", Arc::new(MemoryStorage::new()) as Arc<dyn StorageBackend>);
        let config = ResolvedConfig::default().with_storage(StorageConfig {
            custom_backend: Some("scratch".into()),
            ..Default::default()
        });

        let services = Services::build(&config, &StaticSecrets::new(), &registry)
            .await
            .unwrap();

        assert_eq!(services.storage.backend_name(), "memory");
        assert_eq!(services.channels.index_file(), "channels.json");
        assert_eq!(services.content.max_content_length(), config.max_content_length);
    }
}
