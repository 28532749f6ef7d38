use std::time::Duration;

use cloudcafe_clients::{ApiResponse, VolumesClient};
use cloudcafe_config::BlockStorageConfig;
use cloudcafe_types::block_storage::{
    SnapshotCreate, Volume, VolumeCreate, VolumeSnapshot, VolumeType,
};
use cloudcafe_types::{SnapshotStatus, VolumeStatus, WireStatus};

use crate::BehaviorError;
use crate::poll::{self, Check, PollConfig, StatusExpectation};

#[derive(Debug, Clone)]
pub struct VolumesBehaviors {
    client: VolumesClient,
    config: BlockStorageConfig,
}

/// Options for [`VolumesBehaviors::create_available_volume`].
#[derive(Debug, Clone, Default)]
pub struct VolumeRequest {
    pub size: Option<u64>,
    pub name: Option<String>,
    pub volume_type: Option<String>,
    pub image_ref: Option<String>,
    pub snapshot_id: Option<String>,
}

impl VolumesBehaviors {
    #[must_use]
    pub fn new(client: VolumesClient, config: BlockStorageConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn client(&self) -> &VolumesClient {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &BlockStorageConfig {
        &self.config
    }

    fn poll_config(&self, timeout: Duration) -> PollConfig {
        PollConfig::new(
            timeout,
            Duration::from_secs(self.config.volume_status_poll_frequency),
        )
    }

    /// `size * wait_per_gigabyte`, clamped to the configured create bounds.
    #[must_use]
    pub fn calculate_volume_create_timeout(&self, size: u64) -> Duration {
        clamp_timeout(
            size,
            self.config.volume_create_wait_per_gigabyte,
            self.config.volume_create_min_timeout,
            self.config.volume_create_max_timeout,
        )
    }

    #[must_use]
    pub fn calculate_volume_delete_timeout(&self, size: u64) -> Duration {
        clamp_timeout(
            size,
            self.config.volume_delete_wait_per_gigabyte,
            self.config.volume_delete_min_timeout,
            self.config.volume_delete_max_timeout,
        )
    }

    pub async fn wait_for_volume_status(
        &self,
        volume_id: &str,
        expected: VolumeStatus,
        timeout: Duration,
    ) -> Result<Volume, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move {
                client
                    .get_volume(volume_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |volume: &Volume| volume.status.clone(),
            &expectation,
            self.poll_config(timeout),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("volume {volume_id} to become {}", expectation.target),
                source,
            )
        })
    }

    /// Create a volume and wait for `available`.
    ///
    /// When `cleanup_on_failure` is set, a volume that never becomes
    /// available is deleted before the error is returned.
    pub async fn create_available_volume(
        &self,
        request: VolumeRequest,
    ) -> Result<Volume, BehaviorError> {
        let size = request.size.unwrap_or(self.config.min_volume_size);
        let mut create = VolumeCreate::new(size);
        create.name = request.name;
        create.volume_type = request
            .volume_type
            .or_else(|| self.config.default_volume_type.clone());
        create.image_ref = request.image_ref;
        create.snapshot_id = request.snapshot_id;

        let volume = self.client.create_volume(&create).await?.into_entity();
        tracing::info!(volume_id = %volume.id, size, "Created volume");

        let timeout = self.calculate_volume_create_timeout(size);
        match self
            .wait_for_volume_status(&volume.id, VolumeStatus::Available, timeout)
            .await
        {
            Ok(volume) => Ok(volume),
            Err(err) => {
                if self.config.cleanup_on_failure {
                    self.cleanup_volume(&volume.id).await;
                }
                Err(err)
            }
        }
    }

    async fn cleanup_volume(&self, volume_id: &str) {
        if let Err(err) = self.client.delete_volume(volume_id).await {
            tracing::warn!(volume_id, error = %err, "Failed to clean up volume");
        }
    }

    /// Delete a volume and wait until it returns 404.
    ///
    /// The wait budget comes from the volume's size; `error_deleting` fails
    /// the wait immediately.
    pub async fn delete_volume_confirmed(&self, volume_id: &str) -> Result<(), BehaviorError> {
        let size = match self.client.get_volume(volume_id).await {
            Ok(response) => response.entity.size,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        match self.client.delete_volume(volume_id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        }

        let client = &self.client;
        poll::wait_for_deletion_checked(
            move || async move {
                client
                    .get_volume(volume_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |volume: &Volume| failed_if_error(&volume.status),
            self.poll_config(self.calculate_volume_delete_timeout(size)),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(format!("volume {volume_id} to be deleted"), source)
        })
    }

    pub async fn wait_for_snapshot_status(
        &self,
        snapshot_id: &str,
        expected: SnapshotStatus,
        timeout: Duration,
    ) -> Result<VolumeSnapshot, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move {
                client
                    .get_snapshot(snapshot_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |snapshot: &VolumeSnapshot| snapshot.status.clone(),
            &expectation,
            self.poll_config(timeout),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("snapshot {snapshot_id} to become {}", expectation.target),
                source,
            )
        })
    }

    /// Snapshot a volume and wait for `available`.
    pub async fn create_available_snapshot(
        &self,
        volume_id: &str,
        name: Option<&str>,
        force: bool,
    ) -> Result<VolumeSnapshot, BehaviorError> {
        let mut create = SnapshotCreate::new(volume_id);
        if let Some(name) = name {
            create = create.with_name(name);
        }
        if force {
            create = create.forced();
        }
        let snapshot = self.client.create_snapshot(&create).await?.into_entity();
        tracing::info!(snapshot_id = %snapshot.id, volume_id, "Created snapshot");

        let timeout = Duration::from_secs(self.config.snapshot_create_timeout);
        match self
            .wait_for_snapshot_status(&snapshot.id, SnapshotStatus::Available, timeout)
            .await
        {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                if self.config.cleanup_on_failure
                    && let Err(cleanup) = self.client.delete_snapshot(&snapshot.id).await
                {
                    tracing::warn!(
                        snapshot_id = %snapshot.id,
                        error = %cleanup,
                        "Failed to clean up snapshot"
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn delete_snapshot_confirmed(&self, snapshot_id: &str) -> Result<(), BehaviorError> {
        match self.client.delete_snapshot(snapshot_id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let client = &self.client;
        poll::wait_for_deletion_checked(
            move || async move {
                client
                    .get_snapshot(snapshot_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |snapshot: &VolumeSnapshot| failed_if_error(&snapshot.status),
            self.poll_config(Duration::from_secs(self.config.snapshot_delete_timeout)),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(format!("snapshot {snapshot_id} to be deleted"), source)
        })
    }

    pub async fn get_volume_type_by_name(&self, name: &str) -> Result<VolumeType, BehaviorError> {
        self.client
            .list_volume_types()
            .await?
            .into_entity()
            .into_iter()
            .find(|volume_type| volume_type.name == name)
            .ok_or_else(|| BehaviorError::NotFound {
                kind: "volume type",
                name: name.to_string(),
            })
    }
}

fn clamp_timeout(size: u64, per_gigabyte: u64, min: u64, max: u64) -> Duration {
    let raw = size.saturating_mul(per_gigabyte);
    Duration::from_secs(raw.max(min).min(max.max(min)))
}

fn failed_if_error<S: WireStatus>(status: &S) -> Check {
    if status.is_error() {
        Check::Failed(format!("resource entered `{status}` while being deleted"))
    } else {
        Check::Pending
    }
}
