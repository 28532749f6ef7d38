//! One composite per service: its config section, an authenticated client
//! pointed at the resolved endpoint, and behaviors over that client.

use std::sync::{Arc, Weak};

use cloudcafe_behaviors::{
    BareMetalBehaviors, ComputeBehaviors, ImagesBehaviors, NetworkingBehaviors,
    ObjectStorageBehaviors, VolumesBehaviors,
};
use cloudcafe_clients::{
    BareMetalClient, ComputeClient, ImagesClient, NetworkingClient, ObjectStorageClient,
    RestClient, VolumesClient,
};
use cloudcafe_config::{
    BareMetalConfig, BlockStorageConfig, CafeConfig, ComputeConfig, ImagesConfig,
    NetworkingConfig, ObjectStorageConfig, Service,
};

use crate::cloud::{CloudComposite, CloudInner};
use crate::{AuthComposite, CompositeError};

async fn rest_client(
    config: &CafeConfig,
    auth: &AuthComposite,
    service: Service,
) -> Result<RestClient, CompositeError> {
    let endpoint = config.endpoint(service)?;
    let rest = auth.rest_client(&endpoint).await?;
    tracing::debug!(
        service = service.section(),
        url = %rest.base_url(),
        "Resolved service endpoint"
    );
    Ok(rest)
}

/// Compute plus handles on the block storage and images composites of the
/// same cloud, for tests that boot from volumes or snapshot servers.
#[derive(Debug, Clone)]
pub struct ComputeComposite {
    config: ComputeConfig,
    client: ComputeClient,
    behaviors: ComputeBehaviors,
    root: Weak<CloudInner>,
}

impl ComputeComposite {
    pub async fn new(config: &CafeConfig, auth: &AuthComposite) -> Result<Self, CompositeError> {
        let section: ComputeConfig = config.get()?;
        let client = ComputeClient::new(rest_client(config, auth, Service::Compute).await?);
        Ok(Self {
            behaviors: ComputeBehaviors::new(client.clone(), section.clone()),
            config: section,
            client,
            root: Weak::new(),
        })
    }

    pub(crate) fn attach(mut self, root: Weak<CloudInner>) -> Self {
        self.root = root;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &ComputeClient {
        &self.client
    }

    #[must_use]
    pub fn behaviors(&self) -> &ComputeBehaviors {
        &self.behaviors
    }

    /// Sibling block storage composite. Only available when this composite
    /// was built through a [`CloudComposite`] that is still alive.
    pub async fn block_storage(&self) -> Result<Arc<BlockStorageComposite>, CompositeError> {
        self.root()?.block_storage().await
    }

    /// Sibling images composite; see [`Self::block_storage`].
    pub async fn images(&self) -> Result<Arc<ImagesComposite>, CompositeError> {
        self.root()?.images().await
    }

    fn root(&self) -> Result<CloudComposite, CompositeError> {
        self.root
            .upgrade()
            .map(CloudComposite::from_inner)
            .ok_or(CompositeError::Detached)
    }
}

#[derive(Debug, Clone)]
pub struct BlockStorageComposite {
    config: BlockStorageConfig,
    client: VolumesClient,
    behaviors: VolumesBehaviors,
}

impl BlockStorageComposite {
    pub async fn new(config: &CafeConfig, auth: &AuthComposite) -> Result<Self, CompositeError> {
        let section: BlockStorageConfig = config.get()?;
        let client = VolumesClient::new(rest_client(config, auth, Service::BlockStorage).await?);
        Ok(Self {
            behaviors: VolumesBehaviors::new(client.clone(), section.clone()),
            config: section,
            client,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BlockStorageConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &VolumesClient {
        &self.client
    }

    #[must_use]
    pub fn behaviors(&self) -> &VolumesBehaviors {
        &self.behaviors
    }
}

#[derive(Debug, Clone)]
pub struct NetworkingComposite {
    config: NetworkingConfig,
    client: NetworkingClient,
    behaviors: NetworkingBehaviors,
}

impl NetworkingComposite {
    pub async fn new(config: &CafeConfig, auth: &AuthComposite) -> Result<Self, CompositeError> {
        let section: NetworkingConfig = config.get()?;
        let client = NetworkingClient::new(rest_client(config, auth, Service::Networking).await?);
        Ok(Self {
            behaviors: NetworkingBehaviors::new(client.clone(), section.clone()),
            config: section,
            client,
        })
    }

    #[must_use]
    pub fn config(&self) -> &NetworkingConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &NetworkingClient {
        &self.client
    }

    #[must_use]
    pub fn behaviors(&self) -> &NetworkingBehaviors {
        &self.behaviors
    }
}

#[derive(Debug, Clone)]
pub struct ImagesComposite {
    config: ImagesConfig,
    client: ImagesClient,
    behaviors: ImagesBehaviors,
}

impl ImagesComposite {
    pub async fn new(config: &CafeConfig, auth: &AuthComposite) -> Result<Self, CompositeError> {
        let section: ImagesConfig = config.get()?;
        let client = ImagesClient::new(rest_client(config, auth, Service::Images).await?);
        Ok(Self {
            behaviors: ImagesBehaviors::new(client.clone(), section.clone()),
            config: section,
            client,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ImagesConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &ImagesClient {
        &self.client
    }

    #[must_use]
    pub fn behaviors(&self) -> &ImagesBehaviors {
        &self.behaviors
    }
}

#[derive(Debug, Clone)]
pub struct BareMetalComposite {
    config: BareMetalConfig,
    client: BareMetalClient,
    behaviors: BareMetalBehaviors,
}

impl BareMetalComposite {
    pub async fn new(config: &CafeConfig, auth: &AuthComposite) -> Result<Self, CompositeError> {
        let section: BareMetalConfig = config.get()?;
        let rest = rest_client(config, auth, Service::BareMetal).await?;
        let client = BareMetalClient::new(rest, section.api_version.as_deref())?;
        Ok(Self {
            behaviors: BareMetalBehaviors::new(client.clone(), section.clone()),
            config: section,
            client,
        })
    }

    #[must_use]
    pub fn config(&self) -> &BareMetalConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &BareMetalClient {
        &self.client
    }

    #[must_use]
    pub fn behaviors(&self) -> &BareMetalBehaviors {
        &self.behaviors
    }
}

#[derive(Debug, Clone)]
pub struct ObjectStorageComposite {
    config: ObjectStorageConfig,
    client: ObjectStorageClient,
    behaviors: ObjectStorageBehaviors,
}

impl ObjectStorageComposite {
    pub async fn new(config: &CafeConfig, auth: &AuthComposite) -> Result<Self, CompositeError> {
        let section: ObjectStorageConfig = config.get()?;
        let rest = rest_client(config, auth, Service::ObjectStorage).await?;
        let client = ObjectStorageClient::new(rest);
        Ok(Self {
            behaviors: ObjectStorageBehaviors::new(client.clone(), section.clone()),
            config: section,
            client,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ObjectStorageConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &ObjectStorageClient {
        &self.client
    }

    #[must_use]
    pub fn behaviors(&self) -> &ObjectStorageBehaviors {
        &self.behaviors
    }
}
