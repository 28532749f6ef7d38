//! Compute (v2) API client.

use std::collections::HashMap;

use cloudcafe_types::Secret;
use cloudcafe_types::compute::{
    ComputeImage, CreatedServer, Flavor, KeyPair, KeyPairCreate, KeyPairEntry, RebootType, Server,
    ServerAction, ServerCreate, ServerSummary, ServerUpdate,
};

use crate::{ApiResponse, ClientError, RestClient};

const LOCATION: &str = "location";

/// One method per compute endpoint. Paths are relative to the tenant-scoped
/// compute URL from the catalog (`.../v2/{tenant_id}`).
#[derive(Debug, Clone)]
pub struct ComputeClient {
    rest: RestClient,
}

impl ComputeClient {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub async fn create_server(
        &self,
        request: &ServerCreate,
    ) -> Result<ApiResponse<CreatedServer>, ClientError> {
        self.rest.create(&["servers"], request).await
    }

    pub async fn get_server(&self, server_id: &str) -> Result<ApiResponse<Server>, ClientError> {
        self.rest.get(&["servers", server_id], &[]).await
    }

    pub async fn list_servers(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<ServerSummary>>, ClientError> {
        self.rest.list(&["servers"], query).await
    }

    pub async fn list_servers_with_detail(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Server>>, ClientError> {
        self.rest.list(&["servers", "detail"], query).await
    }

    pub async fn update_server(
        &self,
        server_id: &str,
        update: &ServerUpdate,
    ) -> Result<ApiResponse<Server>, ClientError> {
        self.rest.update(&["servers", server_id], update).await
    }

    pub async fn delete_server(&self, server_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&["servers", server_id]).await
    }

    /// `POST /servers/{id}/action` with any action body.
    pub async fn server_action(
        &self,
        server_id: &str,
        action: &ServerAction,
    ) -> Result<ApiResponse<()>, ClientError> {
        tracing::debug!(server_id, action = action.name(), "Server action");
        self.rest
            .action(&["servers", server_id, "action"], &action.to_body())
            .await
    }

    pub async fn reboot(
        &self,
        server_id: &str,
        kind: RebootType,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.server_action(server_id, &ServerAction::Reboot(kind))
            .await
    }

    pub async fn resize(
        &self,
        server_id: &str,
        flavor_ref: &str,
    ) -> Result<ApiResponse<()>, ClientError> {
        let action = ServerAction::Resize {
            flavor_ref: flavor_ref.to_string(),
        };
        self.server_action(server_id, &action).await
    }

    pub async fn confirm_resize(&self, server_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.server_action(server_id, &ServerAction::ConfirmResize)
            .await
    }

    pub async fn revert_resize(&self, server_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.server_action(server_id, &ServerAction::RevertResize)
            .await
    }

    pub async fn rebuild(
        &self,
        server_id: &str,
        image_ref: &str,
        name: Option<&str>,
        admin_pass: Option<Secret>,
    ) -> Result<ApiResponse<()>, ClientError> {
        let action = ServerAction::Rebuild {
            image_ref: image_ref.to_string(),
            name: name.map(str::to_string),
            admin_pass,
        };
        self.server_action(server_id, &action).await
    }

    pub async fn change_password(
        &self,
        server_id: &str,
        password: Secret,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.server_action(server_id, &ServerAction::ChangePassword(password))
            .await
    }

    /// Snapshot a server. The new image id is the last path segment of the
    /// `Location` header.
    pub async fn create_image(
        &self,
        server_id: &str,
        name: &str,
        metadata: HashMap<String, String>,
    ) -> Result<ApiResponse<String>, ClientError> {
        let action = ServerAction::CreateImage {
            name: name.to_string(),
            metadata,
        };
        let response = self.server_action(server_id, &action).await?;
        let image_id = response
            .header(LOCATION)
            .and_then(image_id_from_location)
            .ok_or(ClientError::MissingHeader("Location"))?
            .to_string();
        Ok(response.map(|()| image_id))
    }

    pub async fn list_flavors_with_detail(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Flavor>>, ClientError> {
        self.rest.list(&["flavors", "detail"], query).await
    }

    pub async fn get_flavor(&self, flavor_id: &str) -> Result<ApiResponse<Flavor>, ClientError> {
        self.rest.get(&["flavors", flavor_id], &[]).await
    }

    pub async fn list_images_with_detail(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<ComputeImage>>, ClientError> {
        self.rest.list(&["images", "detail"], query).await
    }

    pub async fn get_image(
        &self,
        image_id: &str,
    ) -> Result<ApiResponse<ComputeImage>, ClientError> {
        self.rest.get(&["images", image_id], &[]).await
    }

    pub async fn delete_image(&self, image_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&["images", image_id]).await
    }

    pub async fn create_keypair(
        &self,
        name: &str,
        public_key: Option<&str>,
    ) -> Result<ApiResponse<KeyPair>, ClientError> {
        let request = KeyPairCreate {
            name: name.to_string(),
            public_key: public_key.map(str::to_string),
        };
        self.rest.create(&["os-keypairs"], &request).await
    }

    pub async fn list_keypairs(&self) -> Result<ApiResponse<Vec<KeyPair>>, ClientError> {
        let response: ApiResponse<Vec<KeyPairEntry>> =
            self.rest.list(&["os-keypairs"], &[]).await?;
        Ok(response.map(|entries| entries.into_iter().map(|entry| entry.keypair).collect()))
    }

    pub async fn get_keypair(&self, name: &str) -> Result<ApiResponse<KeyPair>, ClientError> {
        self.rest.get(&["os-keypairs", name], &[]).await
    }

    pub async fn delete_keypair(&self, name: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&["os-keypairs", name]).await
    }
}

fn image_id_from_location(location: &str) -> Option<&str> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}
