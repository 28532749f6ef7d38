use std::sync::Arc;

use cloudcafe_config::CafeConfig;
use tokio::sync::OnceCell;

use crate::services::{
    BareMetalComposite, BlockStorageComposite, ComputeComposite, ImagesComposite,
    NetworkingComposite, ObjectStorageComposite,
};
use crate::{AuthComposite, CompositeError};

/// Root of the composite graph for one test run.
///
/// Cloning is cheap and every clone shares the same authentication and the
/// same lazily built service composites.
#[derive(Debug, Clone)]
pub struct CloudComposite {
    inner: Arc<CloudInner>,
}

#[derive(Debug)]
pub(crate) struct CloudInner {
    config: CafeConfig,
    auth: AuthComposite,
    compute: OnceCell<Arc<ComputeComposite>>,
    block_storage: OnceCell<Arc<BlockStorageComposite>>,
    networking: OnceCell<Arc<NetworkingComposite>>,
    images: OnceCell<Arc<ImagesComposite>>,
    bare_metal: OnceCell<Arc<BareMetalComposite>>,
    object_storage: OnceCell<Arc<ObjectStorageComposite>>,
}

impl CloudComposite {
    /// Build from a loaded config; authentication waits until first use.
    pub fn new(config: CafeConfig) -> Result<Self, CompositeError> {
        let auth = AuthComposite::from_config(&config)?;
        Ok(Self::with_auth(config, auth))
    }

    /// Load the config from its default location and build.
    pub fn load() -> Result<Self, CompositeError> {
        Self::new(CafeConfig::load()?)
    }

    #[must_use]
    pub fn with_auth(config: CafeConfig, auth: AuthComposite) -> Self {
        Self {
            inner: Arc::new(CloudInner {
                config,
                auth,
                compute: OnceCell::new(),
                block_storage: OnceCell::new(),
                networking: OnceCell::new(),
                images: OnceCell::new(),
                bare_metal: OnceCell::new(),
                object_storage: OnceCell::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<CloudInner>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn config(&self) -> &CafeConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn auth(&self) -> &AuthComposite {
        &self.inner.auth
    }

    pub async fn compute(&self) -> Result<Arc<ComputeComposite>, CompositeError> {
        self.inner
            .compute
            .get_or_try_init(|| async {
                let composite = ComputeComposite::new(self.config(), self.auth())
                    .await?
                    .attach(Arc::downgrade(&self.inner));
                Ok::<_, CompositeError>(Arc::new(composite))
            })
            .await
            .cloned()
    }

    pub async fn block_storage(&self) -> Result<Arc<BlockStorageComposite>, CompositeError> {
        self.inner
            .block_storage
            .get_or_try_init(|| async {
                BlockStorageComposite::new(self.config(), self.auth())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    pub async fn networking(&self) -> Result<Arc<NetworkingComposite>, CompositeError> {
        self.inner
            .networking
            .get_or_try_init(|| async {
                NetworkingComposite::new(self.config(), self.auth())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    pub async fn images(&self) -> Result<Arc<ImagesComposite>, CompositeError> {
        self.inner
            .images
            .get_or_try_init(|| async {
                ImagesComposite::new(self.config(), self.auth())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    pub async fn bare_metal(&self) -> Result<Arc<BareMetalComposite>, CompositeError> {
        self.inner
            .bare_metal
            .get_or_try_init(|| async {
                BareMetalComposite::new(self.config(), self.auth())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    pub async fn object_storage(&self) -> Result<Arc<ObjectStorageComposite>, CompositeError> {
        self.inner
            .object_storage
            .get_or_try_init(|| async {
                ObjectStorageComposite::new(self.config(), self.auth())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }
}
