//! Image service (v2) API client.
//!
//! The v2 API only speaks JSON, so the client forces JSON in both
//! directions regardless of the configured formats.

use cloudcafe_types::Format;
use cloudcafe_types::images::{
    Image, ImageCreate, ImageMember, ImagePatch, JSON_PATCH_CONTENT_TYPE, MemberCreate, Task,
    TaskCreate,
};

use crate::{ApiResponse, ClientError, Payload, RestClient};

const VERSION: &str = "v2";
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct ImagesClient {
    rest: RestClient,
}

impl ImagesClient {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        Self {
            rest: rest.with_formats(Format::Json, Format::Json),
        }
    }

    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Register an image record. The image stays `queued` until data is
    /// uploaded.
    pub async fn create_image(
        &self,
        request: &ImageCreate,
    ) -> Result<ApiResponse<Image>, ClientError> {
        self.rest.create(&[VERSION, "images"], request).await
    }

    pub async fn get_image(&self, image_id: &str) -> Result<ApiResponse<Image>, ClientError> {
        self.rest.get(&[VERSION, "images", image_id], &[]).await
    }

    /// List images; `query` carries filters such as `status`, `visibility`,
    /// `disk_format` or `limit`.
    pub async fn list_images(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Image>>, ClientError> {
        self.rest.list(&[VERSION, "images"], query).await
    }

    pub async fn update_image(
        &self,
        image_id: &str,
        patch: &ImagePatch,
    ) -> Result<ApiResponse<Image>, ClientError> {
        self.rest
            .patch(&[VERSION, "images", image_id], patch, JSON_PATCH_CONTENT_TYPE)
            .await
    }

    pub async fn delete_image(&self, image_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[VERSION, "images", image_id]).await
    }

    pub async fn upload_file(
        &self,
        image_id: &str,
        data: impl Into<Vec<u8>>,
    ) -> Result<ApiResponse<()>, ClientError> {
        let payload = Payload::new(data, OCTET_STREAM);
        self.rest
            .put_bytes(&[VERSION, "images", image_id, "file"], payload, &[])
            .await
    }

    pub async fn download_file(&self, image_id: &str) -> Result<ApiResponse<Vec<u8>>, ClientError> {
        self.rest
            .get_bytes(&[VERSION, "images", image_id, "file"], &[])
            .await
    }

    pub async fn create_task(
        &self,
        request: &TaskCreate,
    ) -> Result<ApiResponse<Task>, ClientError> {
        self.rest.create(&[VERSION, "tasks"], request).await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<ApiResponse<Task>, ClientError> {
        self.rest.get(&[VERSION, "tasks", task_id], &[]).await
    }

    pub async fn list_members(
        &self,
        image_id: &str,
    ) -> Result<ApiResponse<Vec<ImageMember>>, ClientError> {
        self.rest
            .list(&[VERSION, "images", image_id, "members"], &[])
            .await
    }

    pub async fn add_member(
        &self,
        image_id: &str,
        member_id: &str,
    ) -> Result<ApiResponse<ImageMember>, ClientError> {
        let request = MemberCreate {
            member: member_id.to_string(),
        };
        self.rest
            .create(&[VERSION, "images", image_id, "members"], &request)
            .await
    }
}
