use cloudcafe_clients::{ApiResponse, BareMetalClient};
use cloudcafe_config::BareMetalConfig;
use cloudcafe_types::bare_metal::{
    Chassis, ChassisCreate, Node, NodeCreate, PowerTarget, ProvisionTarget,
};
use cloudcafe_types::{PowerState, ProvisionState};

use crate::BehaviorError;
use crate::poll::{self, PollConfig, StatusExpectation};

/// Stands in for a `null` state so it can be matched like any other.
const NO_STATE: &str = "none";

#[derive(Debug, Clone)]
pub struct BareMetalBehaviors {
    client: BareMetalClient,
    config: BareMetalConfig,
}

fn provision_state_of(node: &Node) -> ProvisionState {
    node.provision_state
        .clone()
        .unwrap_or_else(|| ProvisionState::Other(NO_STATE.to_string()))
}

fn power_state_of(node: &Node) -> PowerState {
    node.power_state
        .clone()
        .unwrap_or_else(|| PowerState::Other(NO_STATE.to_string()))
}

impl BareMetalBehaviors {
    #[must_use]
    pub fn new(client: BareMetalClient, config: BareMetalConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn client(&self) -> &BareMetalClient {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &BareMetalConfig {
        &self.config
    }

    pub async fn wait_for_provision_state(
        &self,
        node_ident: &str,
        expected: ProvisionState,
    ) -> Result<Node, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move {
                client
                    .get_node(node_ident)
                    .await
                    .map(ApiResponse::into_entity)
            },
            provision_state_of,
            &expectation,
            PollConfig::from_secs(
                self.config.provision_timeout,
                self.config.status_poll_interval,
            ),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("node {node_ident} to reach provision state {}", expectation.target),
                source,
            )
        })
    }

    pub async fn wait_for_power_state(
        &self,
        node_ident: &str,
        expected: PowerState,
    ) -> Result<Node, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move {
                client
                    .get_node(node_ident)
                    .await
                    .map(ApiResponse::into_entity)
            },
            power_state_of,
            &expectation,
            PollConfig::from_secs(self.config.power_timeout, self.config.status_poll_interval),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("node {node_ident} to reach power state {}", expectation.target),
                source,
            )
        })
    }

    /// Request `target` and wait for the state it settles in.
    pub async fn set_provision_state_and_await(
        &self,
        node_ident: &str,
        target: ProvisionTarget,
    ) -> Result<Node, BehaviorError> {
        self.client.set_provision_state(node_ident, target).await?;
        tracing::info!(node = node_ident, target = target.as_str(), "Requested provision state");
        self.wait_for_provision_state(node_ident, target.settled_state())
            .await
    }

    /// Deploy a node and wait for `active`. A `deploy failed` state ends the
    /// wait early and carries the node's `last_error`.
    pub async fn deploy_node(&self, node_ident: &str) -> Result<Node, BehaviorError> {
        match self
            .set_provision_state_and_await(node_ident, ProvisionTarget::Active)
            .await
        {
            Ok(node) => Ok(node),
            Err(err @ BehaviorError::Wait { .. }) if !err.is_timeout() => {
                let last_error = self
                    .client
                    .get_node(node_ident)
                    .await
                    .ok()
                    .and_then(|response| response.into_entity().last_error);
                match last_error {
                    Some(last_error) => Err(BehaviorError::Unexpected(format!(
                        "deploying node {node_ident} failed: {last_error}"
                    ))),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    pub async fn set_power_state_and_await(
        &self,
        node_ident: &str,
        target: PowerTarget,
    ) -> Result<Node, BehaviorError> {
        self.client.set_power_state(node_ident, target).await?;
        tracing::info!(node = node_ident, target = target.as_str(), "Requested power state");
        self.wait_for_power_state(node_ident, target.settled_state())
            .await
    }

    /// Create a chassis and a node inside it using the configured driver.
    pub async fn create_chassis_and_node(
        &self,
        description: &str,
        node_name: Option<&str>,
    ) -> Result<(Chassis, Node), BehaviorError> {
        let chassis = self
            .client
            .create_chassis(&ChassisCreate::described(description))
            .await?
            .into_entity();
        let mut request = NodeCreate::new(&self.config.default_driver).in_chassis(&chassis.uuid);
        if let Some(name) = node_name {
            request = request.with_name(name);
        }
        let node = match self.client.create_node(&request).await {
            Ok(response) => response.into_entity(),
            Err(err) => {
                if let Err(cleanup) = self.client.delete_chassis(&chassis.uuid).await {
                    tracing::warn!(
                        chassis = %chassis.uuid,
                        error = %cleanup,
                        "Failed to clean up chassis"
                    );
                }
                return Err(err.into());
            }
        };
        tracing::info!(chassis = %chassis.uuid, node = %node.uuid, "Created chassis and node");
        Ok((chassis, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{rest_client, sequence};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn behaviors(server: &MockServer) -> BareMetalBehaviors {
        let config = BareMetalConfig {
            provision_timeout: 30,
            power_timeout: 30,
            status_poll_interval: 0,
            ..BareMetalConfig::default()
        };
        let client = BareMetalClient::new(rest_client(server, ""), Some("1.31")).unwrap();
        BareMetalBehaviors::new(client, config)
    }

    fn node(provision: serde_json::Value, power: serde_json::Value) -> serde_json::Value {
        json!({"uuid": "n-1", "provision_state": provision, "power_state": power})
    }

    #[test]
    fn missing_states_read_as_none() {
        let node: Node = serde_json::from_value(node(json!(null), json!(null))).unwrap();
        assert_eq!(provision_state_of(&node).to_string(), "none");
        assert_eq!(power_state_of(&node).to_string(), "none");
    }

    #[tokio::test]
    async fn deploy_waits_for_active() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/nodes/n-1/states/provision"))
            .and(body_json(json!({"target": "active"})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/nodes/n-1"))
            .respond_with(sequence(vec![
                node(json!("deploying"), json!("power off")),
                node(json!("wait call-back"), json!("power on")),
                node(json!("active"), json!("power on")),
            ]))
            .mount(&server)
            .await;

        let deployed = behaviors(&server).deploy_node("n-1").await.unwrap();
        assert_eq!(deployed.provision_state, Some(ProvisionState::Active));
    }

    #[tokio::test]
    async fn failed_deploy_reports_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/nodes/n-1/states/provision"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;
        let mut failed = node(json!("deploy failed"), json!("power off"));
        failed["last_error"] = json!("PXE timeout");
        Mock::given(method("GET"))
            .and(path("/v1/nodes/n-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(failed))
            .mount(&server)
            .await;

        let err = behaviors(&server).deploy_node("n-1").await.unwrap_err();
        assert!(err.to_string().contains("PXE timeout"));
    }

    #[tokio::test]
    async fn power_off_waits_for_settled_state() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/nodes/n-1/states/power"))
            .and(body_json(json!({"target": "power off"})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/nodes/n-1"))
            .respond_with(sequence(vec![
                node(json!("active"), json!("power on")),
                node(json!("active"), json!("power off")),
            ]))
            .mount(&server)
            .await;

        let node = behaviors(&server)
            .set_power_state_and_await("n-1", PowerTarget::Off)
            .await
            .unwrap();
        assert_eq!(node.power_state, Some(PowerState::PowerOff));
    }

    #[tokio::test]
    async fn chassis_and_node_use_default_driver() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chassis"))
            .and(body_json(json!({"description": "rack 4"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"uuid": "c-1", "description": "rack 4"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/nodes"))
            .and(body_json(json!({
                "driver": "fake-hardware",
                "name": "bm-1",
                "chassis_uuid": "c-1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "uuid": "n-1", "name": "bm-1", "chassis_uuid": "c-1",
                "provision_state": "enroll"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (chassis, node) = behaviors(&server)
            .create_chassis_and_node("rack 4", Some("bm-1"))
            .await
            .unwrap();
        assert_eq!(chassis.uuid, "c-1");
        assert_eq!(node.chassis_uuid.as_deref(), Some("c-1"));
    }

    #[tokio::test]
    async fn node_create_failure_removes_chassis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chassis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"uuid": "c-1"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/nodes"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unknown driver"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/chassis/c-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let err = behaviors(&server)
            .create_chassis_and_node("rack 4", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BehaviorError::Client(_)));
    }
}
