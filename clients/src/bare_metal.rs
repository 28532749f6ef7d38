//! Bare metal (v1) API client.

use cloudcafe_types::Format;
use cloudcafe_types::bare_metal::{
    API_VERSION_HEADER, BareMetalPort, BareMetalPortCreate, Chassis, ChassisCreate, Driver, Node,
    NodeCreate, PowerTarget, ProvisionTarget,
};
use reqwest::Method;

use crate::{ApiResponse, ClientError, RestClient};

const VERSION: &str = "v1";

#[derive(Debug, Clone)]
pub struct BareMetalClient {
    rest: RestClient,
}

impl BareMetalClient {
    /// JSON only. `api_version` is sent as the microversion header on every
    /// request when set.
    pub fn new(rest: RestClient, api_version: Option<&str>) -> Result<Self, ClientError> {
        let mut rest = rest.with_formats(Format::Json, Format::Json);
        if let Some(version) = api_version {
            rest = rest.with_header(API_VERSION_HEADER, version)?;
        }
        Ok(Self { rest })
    }

    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub async fn create_chassis(
        &self,
        request: &ChassisCreate,
    ) -> Result<ApiResponse<Chassis>, ClientError> {
        self.rest.create(&[VERSION, "chassis"], request).await
    }

    pub async fn get_chassis(
        &self,
        chassis_uuid: &str,
    ) -> Result<ApiResponse<Chassis>, ClientError> {
        self.rest.get(&[VERSION, "chassis", chassis_uuid], &[]).await
    }

    pub async fn list_chassis(&self) -> Result<ApiResponse<Vec<Chassis>>, ClientError> {
        self.rest.list(&[VERSION, "chassis"], &[]).await
    }

    pub async fn delete_chassis(&self, chassis_uuid: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[VERSION, "chassis", chassis_uuid]).await
    }

    pub async fn create_node(
        &self,
        request: &NodeCreate,
    ) -> Result<ApiResponse<Node>, ClientError> {
        self.rest.create(&[VERSION, "nodes"], request).await
    }

    pub async fn get_node(&self, node_ident: &str) -> Result<ApiResponse<Node>, ClientError> {
        self.rest.get(&[VERSION, "nodes", node_ident], &[]).await
    }

    pub async fn list_nodes(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<Node>>, ClientError> {
        self.rest.list(&[VERSION, "nodes"], query).await
    }

    pub async fn delete_node(&self, node_ident: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[VERSION, "nodes", node_ident]).await
    }

    /// Request a provision-state transition. The service answers 202 and
    /// moves the node asynchronously.
    pub async fn set_provision_state(
        &self,
        node_ident: &str,
        target: ProvisionTarget,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.rest
            .send_json(
                Method::PUT,
                &[VERSION, "nodes", node_ident, "states", "provision"],
                &target.to_body(),
            )
            .await
    }

    pub async fn set_power_state(
        &self,
        node_ident: &str,
        target: PowerTarget,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.rest
            .send_json(
                Method::PUT,
                &[VERSION, "nodes", node_ident, "states", "power"],
                &target.to_body(),
            )
            .await
    }

    pub async fn list_drivers(&self) -> Result<ApiResponse<Vec<Driver>>, ClientError> {
        self.rest.list(&[VERSION, "drivers"], &[]).await
    }

    pub async fn create_port(
        &self,
        request: &BareMetalPortCreate,
    ) -> Result<ApiResponse<BareMetalPort>, ClientError> {
        self.rest.create(&[VERSION, "ports"], request).await
    }

    pub async fn list_ports(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<BareMetalPort>>, ClientError> {
        self.rest.list(&[VERSION, "ports"], query).await
    }

    pub async fn delete_port(&self, port_uuid: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[VERSION, "ports", port_uuid]).await
    }
}
