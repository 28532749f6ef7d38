use std::future::Future;

use cloudcafe_clients::{ApiResponse, ClientError, NetworkingClient};
use cloudcafe_config::NetworkingConfig;
use cloudcafe_types::NeutronStatus;
use cloudcafe_types::datagen::rand_name;
use cloudcafe_types::networking::{Network, NetworkCreate, Port, PortCreate, Subnet, SubnetCreate};

use crate::BehaviorError;
use crate::poll::{self, PollConfig, StatusExpectation};

/// Outcome of a create retried up to `resource_build_attempts` times.
///
/// `response` holds the created entity when any attempt succeeded;
/// `failures` has one message per failed attempt.
#[derive(Debug, Clone)]
pub struct ResourceResult<T> {
    pub response: Option<T>,
    pub failures: Vec<String>,
}

impl<T> ResourceResult<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response.is_some()
    }

    /// The entity, or an error listing every failed attempt.
    pub fn into_result(self) -> Result<T, BehaviorError> {
        self.response.ok_or_else(|| {
            BehaviorError::Unexpected(format!(
                "resource creation failed after {} attempts: {}",
                self.failures.len(),
                self.failures.join("; ")
            ))
        })
    }
}

#[derive(Debug, Clone)]
pub struct NetworkingBehaviors {
    client: NetworkingClient,
    config: NetworkingConfig,
}

impl NetworkingBehaviors {
    #[must_use]
    pub fn new(client: NetworkingClient, config: NetworkingConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn client(&self) -> &NetworkingClient {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &NetworkingConfig {
        &self.config
    }

    fn status_poll(&self) -> PollConfig {
        PollConfig::from_secs(self.config.status_timeout, self.config.status_poll_interval)
    }

    async fn with_attempts<T, F, Fut>(&self, kind: &str, mut create: F) -> ResourceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, ClientError>>,
    {
        let attempts = self.config.resource_build_attempts.max(1);
        let mut failures = Vec::new();
        for attempt in 1..=attempts {
            match create().await {
                Ok(response) => {
                    return ResourceResult {
                        response: Some(response.into_entity()),
                        failures,
                    };
                }
                Err(err) => {
                    tracing::warn!(kind, attempt, attempts, error = %err, "Create attempt failed");
                    failures.push(format!("attempt {attempt}: {err}"));
                }
            }
        }
        ResourceResult {
            response: None,
            failures,
        }
    }

    /// Create a network, retrying up to `resource_build_attempts` times.
    pub async fn create_network(&self, name: Option<&str>) -> ResourceResult<Network> {
        let name = name.map_or_else(|| rand_name("network"), str::to_string);
        let request = NetworkCreate::named(name);
        let client = &self.client;
        let request = &request;
        self.with_attempts("network", move || client.create_network(request))
            .await
    }

    pub async fn create_subnet(&self, network_id: &str, cidr: &str) -> ResourceResult<Subnet> {
        let request = SubnetCreate::new(network_id, cidr);
        let client = &self.client;
        let request = &request;
        self.with_attempts("subnet", move || client.create_subnet(request))
            .await
    }

    pub async fn create_port(&self, network_id: &str, name: Option<&str>) -> ResourceResult<Port> {
        let mut request = PortCreate::new(network_id);
        if let Some(name) = name {
            request = request.with_name(name);
        }
        let client = &self.client;
        let request = &request;
        self.with_attempts("port", move || client.create_port(request))
            .await
    }

    pub async fn wait_for_network_status(
        &self,
        network_id: &str,
        expected: NeutronStatus,
    ) -> Result<Network, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move {
                client
                    .get_network(network_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |network: &Network| network.status.clone(),
            &expectation,
            self.status_poll(),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("network {network_id} to become {}", expectation.target),
                source,
            )
        })
    }

    pub async fn wait_for_port_status(
        &self,
        port_id: &str,
        expected: NeutronStatus,
    ) -> Result<Port, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move { client.get_port(port_id).await.map(ApiResponse::into_entity) },
            |port: &Port| port.status.clone(),
            &expectation,
            self.status_poll(),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("port {port_id} to become {}", expectation.target),
                source,
            )
        })
    }

    pub async fn delete_port_confirmed(&self, port_id: &str) -> Result<(), BehaviorError> {
        match self.client.delete_port(port_id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let client = &self.client;
        poll::wait_for_deletion(
            move || async move { client.get_port(port_id).await },
            PollConfig::from_secs(self.config.delete_timeout, self.config.status_poll_interval),
        )
        .await
        .map_err(|source| BehaviorError::wait(format!("port {port_id} to be deleted"), source))
    }

    pub async fn delete_network_confirmed(&self, network_id: &str) -> Result<(), BehaviorError> {
        match self.client.delete_network(network_id).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let client = &self.client;
        poll::wait_for_deletion(
            move || async move { client.get_network(network_id).await },
            PollConfig::from_secs(self.config.delete_timeout, self.config.status_poll_interval),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(format!("network {network_id} to be deleted"), source)
        })
    }
}
