use cloudcafe_clients::{ApiResponse, ComputeClient};
use cloudcafe_config::ComputeConfig;
use cloudcafe_types::ServerStatus;
use cloudcafe_types::compute::{RebootType, Server, ServerCreate};
use cloudcafe_types::datagen::rand_name;

use crate::BehaviorError;
use crate::poll::{self, Check, PollConfig, StatusExpectation};

const SECTION: &str = "compute";

#[derive(Debug, Clone)]
pub struct ComputeBehaviors {
    client: ComputeClient,
    config: ComputeConfig,
}

/// Options for [`ComputeBehaviors::create_active_server`]. Unset fields fall
/// back to the `[compute]` section.
#[derive(Debug, Clone, Default)]
pub struct ServerRequest {
    pub name: Option<String>,
    pub image_ref: Option<String>,
    pub flavor_ref: Option<String>,
    pub key_name: Option<String>,
    pub network_id: Option<String>,
}

impl ComputeBehaviors {
    #[must_use]
    pub fn new(client: ComputeClient, config: ComputeConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn client(&self) -> &ComputeClient {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    fn poll_config(&self, timeout: u64) -> PollConfig {
        PollConfig::from_secs(timeout, self.config.server_status_interval)
    }

    pub async fn wait_for_server_status(
        &self,
        server_id: &str,
        expected: ServerStatus,
    ) -> Result<Server, BehaviorError> {
        self.wait_for_expectation(server_id, &StatusExpectation::new(expected))
            .await
    }

    /// Wait with a caller-built expectation, e.g. one that only allows a
    /// fixed progression of intermediate statuses.
    pub async fn wait_for_expectation(
        &self,
        server_id: &str,
        expectation: &StatusExpectation<ServerStatus>,
    ) -> Result<Server, BehaviorError> {
        let client = &self.client;
        poll::wait_for_status(
            move || async move {
                client
                    .get_server(server_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |server: &Server| server.status.clone(),
            expectation,
            self.poll_config(self.config.server_build_timeout),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("server {server_id} to become {}", expectation.target),
                source,
            )
        })
    }

    /// Boot a server and wait for `ACTIVE`.
    pub async fn create_active_server(
        &self,
        request: ServerRequest,
    ) -> Result<Server, BehaviorError> {
        let image_ref = request
            .image_ref
            .or_else(|| self.config.image_ref.clone())
            .ok_or(BehaviorError::MissingConfig {
                section: SECTION,
                key: "image_ref",
            })?;
        let flavor_ref = request
            .flavor_ref
            .or_else(|| self.config.flavor_ref.clone())
            .ok_or(BehaviorError::MissingConfig {
                section: SECTION,
                key: "flavor_ref",
            })?;
        let name = request.name.unwrap_or_else(|| rand_name("server"));

        let mut create = ServerCreate::new(name, image_ref, flavor_ref);
        if let Some(key_name) = request.key_name {
            create = create.with_key_name(key_name);
        }
        if let Some(network_id) = request.network_id.or_else(|| self.config.network_id.clone()) {
            create = create.with_network(network_id);
        }

        let created = self.client.create_server(&create).await?.into_entity();
        tracing::info!(server_id = %created.id, "Created server");

        match self
            .wait_for_server_status(&created.id, ServerStatus::Active)
            .await
        {
            Ok(server) => Ok(server),
            Err(err) => {
                if self.config.cleanup_on_failure
                    && let Err(cleanup) = self.client.delete_server(&created.id).await
                {
                    tracing::warn!(
                        server_id = %created.id,
                        error = %cleanup,
                        "Failed to clean up server"
                    );
                }
                Err(err)
            }
        }
    }

    /// Delete a server and wait until it returns 404.
    pub async fn delete_server_confirmed(&self, server_id: &str) -> Result<(), BehaviorError> {
        match self.client.delete_server(server_id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let client = &self.client;
        poll::wait_for_deletion_checked(
            move || async move {
                client
                    .get_server(server_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |server: &Server| {
                if server.status.is_error() {
                    Check::Failed(format!(
                        "server entered `{}` while deleting",
                        server.status
                    ))
                } else {
                    Check::Pending
                }
            },
            self.poll_config(self.config.server_delete_timeout),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(format!("server {server_id} to be deleted"), source)
        })
    }

    pub async fn reboot_and_await(
        &self,
        server_id: &str,
        kind: RebootType,
    ) -> Result<Server, BehaviorError> {
        self.client.reboot(server_id, kind).await?;
        let transient = match kind {
            RebootType::Soft => ServerStatus::Reboot,
            RebootType::Hard => ServerStatus::HardReboot,
        };
        let expectation = StatusExpectation::new(ServerStatus::Active).allowing([transient]);
        self.wait_for_expectation(server_id, &expectation).await
    }

    /// Resize, wait for `VERIFY_RESIZE`, confirm and wait for `ACTIVE`.
    pub async fn resize_and_confirm(
        &self,
        server_id: &str,
        flavor_ref: &str,
    ) -> Result<Server, BehaviorError> {
        self.client.resize(server_id, flavor_ref).await?;
        self.wait_for_server_status(server_id, ServerStatus::VerifyResize)
            .await?;
        self.client.confirm_resize(server_id).await?;
        let server = self
            .wait_for_server_status(server_id, ServerStatus::Active)
            .await?;
        let flavor_id = server.flavor.as_ref().map(|flavor| flavor.id.as_str());
        if flavor_id.is_some_and(|id| id != flavor_ref) {
            return Err(BehaviorError::Unexpected(format!(
                "server {server_id} reports flavor `{}` after resizing to `{flavor_ref}`",
                flavor_id.unwrap_or_default()
            )));
        }
        Ok(server)
    }
}
