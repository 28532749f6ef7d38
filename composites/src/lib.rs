//! Composites wire one service's config section, an authenticated client
//! and its behaviors together.
//!
//! [`AuthComposite`] performs the identity exchange once and resolves
//! service URLs. [`CloudComposite`] is the entry point for a test run: it
//! owns the config and the auth composite and builds each service
//! composite on first use.

mod auth;
mod cloud;
mod services;

use cloudcafe_clients::ClientError;
use cloudcafe_config::ConfigError;
use cloudcafe_types::identity::CatalogError;
use thiserror::Error;

pub use auth::{AuthComposite, AuthSession};
pub use cloud::CloudComposite;
pub use services::{
    BareMetalComposite, BlockStorageComposite, ComputeComposite, ImagesComposite,
    NetworkingComposite, ObjectStorageComposite,
};

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{strategy} authentication needs `{key}` in the [user] config section")]
    MissingCredential {
        strategy: &'static str,
        key: &'static str,
    },
    #[error("{strategy} authentication does not return a service catalog")]
    NoCatalog { strategy: &'static str },
    #[error("the cloud composite this service belongs to has been dropped")]
    Detached,
}
