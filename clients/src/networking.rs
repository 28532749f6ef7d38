//! Networking (v2.0) API client.
//!
//! The catalog publishes the unversioned endpoint, so every path starts
//! with `v2.0`.

use cloudcafe_types::networking::{
    Network, NetworkCreate, NetworkUpdate, Port, PortCreate, PortUpdate, Subnet, SubnetCreate,
};

use crate::{ApiResponse, ClientError, RestClient};

const VERSION: &str = "v2.0";

#[derive(Debug, Clone)]
pub struct NetworkingClient {
    rest: RestClient,
}

impl NetworkingClient {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub async fn create_network(
        &self,
        request: &NetworkCreate,
    ) -> Result<ApiResponse<Network>, ClientError> {
        self.rest.create(&[VERSION, "networks"], request).await
    }

    pub async fn get_network(&self, network_id: &str) -> Result<ApiResponse<Network>, ClientError> {
        self.rest.get(&[VERSION, "networks", network_id], &[]).await
    }

    pub async fn list_networks(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Network>>, ClientError> {
        self.rest.list(&[VERSION, "networks"], query).await
    }

    pub async fn update_network(
        &self,
        network_id: &str,
        update: &NetworkUpdate,
    ) -> Result<ApiResponse<Network>, ClientError> {
        self.rest
            .update(&[VERSION, "networks", network_id], update)
            .await
    }

    pub async fn delete_network(&self, network_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[VERSION, "networks", network_id]).await
    }

    pub async fn create_subnet(
        &self,
        request: &SubnetCreate,
    ) -> Result<ApiResponse<Subnet>, ClientError> {
        self.rest.create(&[VERSION, "subnets"], request).await
    }

    pub async fn get_subnet(&self, subnet_id: &str) -> Result<ApiResponse<Subnet>, ClientError> {
        self.rest.get(&[VERSION, "subnets", subnet_id], &[]).await
    }

    pub async fn list_subnets(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Subnet>>, ClientError> {
        self.rest.list(&[VERSION, "subnets"], query).await
    }

    pub async fn delete_subnet(&self, subnet_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[VERSION, "subnets", subnet_id]).await
    }

    pub async fn create_port(
        &self,
        request: &PortCreate,
    ) -> Result<ApiResponse<Port>, ClientError> {
        self.rest.create(&[VERSION, "ports"], request).await
    }

    pub async fn get_port(&self, port_id: &str) -> Result<ApiResponse<Port>, ClientError> {
        self.rest.get(&[VERSION, "ports", port_id], &[]).await
    }

    pub async fn list_ports(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Port>>, ClientError> {
        self.rest.list(&[VERSION, "ports"], query).await
    }

    pub async fn update_port(
        &self,
        port_id: &str,
        update: &PortUpdate,
    ) -> Result<ApiResponse<Port>, ClientError> {
        self.rest.update(&[VERSION, "ports", port_id], update).await
    }

    pub async fn delete_port(&self, port_id: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[VERSION, "ports", port_id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use cloudcafe_types::{NeutronStatus, Secret};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> NetworkingClient {
        let rest = RestClient::new(reqwest::Client::new(), &server.uri())
            .unwrap()
            .with_token(Secret::new("tok"))
            .with_retry(RetryConfig::none());
        NetworkingClient::new(rest)
    }

    #[tokio::test]
    async fn paths_carry_version_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2.0/networks"))
            .and(body_json(json!({"network": {"name": "net-a"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "network": {"id": "n-1", "name": "net-a", "status": "ACTIVE"}
            })))
            .mount(&server)
            .await;

        let network = client(&server)
            .create_network(&NetworkCreate::named("net-a"))
            .await
            .unwrap()
            .into_entity();
        assert_eq!(network.id, "n-1");
        assert_eq!(network.status, NeutronStatus::Active);
        assert!(network.admin_state_up);
    }

    #[tokio::test]
    async fn list_ports_filters_by_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2.0/ports"))
            .and(query_param("network_id", "n-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ports": [{"id": "p-1", "network_id": "n-1", "status": "DOWN"}]
            })))
            .mount(&server)
            .await;

        let ports = client(&server)
            .list_ports(&[("network_id", "n-1")])
            .await
            .unwrap()
            .into_entity();
        assert_eq!(ports[0].status, NeutronStatus::Down);
    }

    #[tokio::test]
    async fn delete_subnet() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2.0/subnets/s-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).delete_subnet("s-1").await.unwrap();
        assert_eq!(response.status.as_u16(), 204);
    }
}
