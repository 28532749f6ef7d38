//! Block storage (v2) API client.

use std::collections::HashMap;

use cloudcafe_types::block_storage::{
    SnapshotCreate, Volume, VolumeAction, VolumeCreate, VolumeSnapshot, VolumeType,
    VolumeTypeCreate, VolumeUpdate,
};

use crate::{ApiResponse, ClientError, RestClient};

#[derive(Debug, Clone)]
pub struct VolumesClient {
    rest: RestClient,
}

impl VolumesClient {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub async fn create_volume(
        &self,
        request: &VolumeCreate,
    ) -> Result<ApiResponse<Volume>, ClientError> {
        self.rest.create(&["volumes"], request).await
    }

    pub async fn get_volume(&self, volume_id: &str) -> Result<ApiResponse<Volume>, ClientError> {
        self.rest.get(&["volumes", volume_id], &[]).await
    }

    pub async fn list_volumes_with_detail(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Volume>>, ClientError> {
        self.rest.list(&["volumes", "detail"], query).await
    }

    pub async fn update_volume(
        &self,
        volume_id: &str,
        update: &VolumeUpdate,
    ) -> Result<ApiResponse<Volume>, ClientError> {
        self.rest.update(&["volumes", volume_id], update).await
    }

    pub async fn delete_volume(&self, volume_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&["volumes", volume_id]).await
    }

    pub async fn volume_action(
        &self,
        volume_id: &str,
        action: &VolumeAction,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.rest
            .action(&["volumes", volume_id, "action"], &action.to_body())
            .await
    }

    pub async fn extend_volume(
        &self,
        volume_id: &str,
        new_size: u64,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.volume_action(volume_id, &VolumeAction::Extend { new_size })
            .await
    }

    pub async fn create_snapshot(
        &self,
        request: &SnapshotCreate,
    ) -> Result<ApiResponse<VolumeSnapshot>, ClientError> {
        self.rest.create(&["snapshots"], request).await
    }

    pub async fn get_snapshot(
        &self,
        snapshot_id: &str,
    ) -> Result<ApiResponse<VolumeSnapshot>, ClientError> {
        self.rest.get(&["snapshots", snapshot_id], &[]).await
    }

    pub async fn list_snapshots_with_detail(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<VolumeSnapshot>>, ClientError> {
        self.rest.list(&["snapshots", "detail"], query).await
    }

    pub async fn delete_snapshot(&self, snapshot_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&["snapshots", snapshot_id]).await
    }

    pub async fn create_volume_type(
        &self,
        name: &str,
        extra_specs: Option<HashMap<String, String>>,
    ) -> Result<ApiResponse<VolumeType>, ClientError> {
        let request = VolumeTypeCreate {
            name: name.to_string(),
            extra_specs,
        };
        self.rest.create(&["types"], &request).await
    }

    pub async fn get_volume_type(
        &self,
        volume_type_id: &str,
    ) -> Result<ApiResponse<VolumeType>, ClientError> {
        self.rest.get(&["types", volume_type_id], &[]).await
    }

    pub async fn list_volume_types(&self) -> Result<ApiResponse<Vec<VolumeType>>, ClientError> {
        self.rest.list(&["types"], &[]).await
    }

    pub async fn delete_volume_type(
        &self,
        volume_type_id: &str,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&["types", volume_type_id]).await
    }
}
