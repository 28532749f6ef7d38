//! Multi-call workflows over the service clients.
//!
//! A behavior owns a client and its service's config section and combines
//! several calls into one test-level step: create and wait, delete and
//! confirm, act and await the settled state. All waiting goes through
//! [`poll`].

pub mod bare_metal;
pub mod block_storage;
pub mod compute;
pub mod images;
pub mod networking;
pub mod object_storage;
pub mod poll;
#[cfg(test)]
mod test_support;

use cloudcafe_clients::ClientError;
use thiserror::Error;

pub use bare_metal::BareMetalBehaviors;
pub use block_storage::VolumesBehaviors;
pub use compute::ComputeBehaviors;
pub use images::ImagesBehaviors;
pub use networking::{NetworkingBehaviors, ResourceResult};
pub use object_storage::ObjectStorageBehaviors;
pub use poll::{Check, PollConfig, StatusExpectation, WaitError};

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("waiting for {what}: {source}")]
    Wait {
        what: String,
        #[source]
        source: WaitError,
    },
    #[error("`{key}` is not set in the [{section}] config section")]
    MissingConfig {
        section: &'static str,
        key: &'static str,
    },
    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{0}")]
    Unexpected(String),
}

impl BehaviorError {
    pub(crate) fn wait(what: impl Into<String>, source: WaitError) -> Self {
        Self::Wait {
            what: what.into(),
            source,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Wait { source, .. } if source.is_timeout())
    }
}
