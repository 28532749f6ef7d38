//! Identity (v2.0) token and service catalog models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::marshal::{Collection, Envelope};
use crate::secret::Secret;

#[derive(Debug, Clone, Serialize)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: Secret,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyCredentials {
    pub username: String,
    #[serde(rename = "apiKey")]
    pub api_key: Secret,
}

/// Body of `POST /v2.0/tokens`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthRequest {
    #[serde(rename = "passwordCredentials", skip_serializing_if = "Option::is_none")]
    pub password_credentials: Option<PasswordCredentials>,
    #[serde(
        rename = "RAX-KSKEY:apiKeyCredentials",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key_credentials: Option<ApiKeyCredentials>,
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(rename = "tenantName", skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
}

impl Envelope for AuthRequest {
    const ROOT: &'static str = "auth";
}

impl AuthRequest {
    pub fn password(username: impl Into<String>, password: Secret) -> Self {
        Self {
            password_credentials: Some(PasswordCredentials {
                username: username.into(),
                password,
            }),
            ..Self::default()
        }
    }

    pub fn api_key(username: impl Into<String>, api_key: Secret) -> Self {
        Self {
            api_key_credentials: Some(ApiKeyCredentials {
                username: username.into(),
                api_key,
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: Option<String>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    #[must_use]
    pub fn with_tenant_name(mut self, tenant_name: Option<String>) -> Self {
        self.tenant_name = tenant_name;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl Envelope for Tenant {
    const ROOT: &'static str = "tenant";
}

impl Collection for Tenant {
    const COLLECTION: &'static str = "tenants";
}

#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub id: Secret,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub tenant: Option<Tenant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Which URL of a catalog endpoint to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointInterface {
    #[default]
    Public,
    Internal,
    Admin,
}

impl EndpointInterface {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEndpoint {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(rename = "tenantId", default)]
    pub tenant_id: Option<String>,
    #[serde(rename = "publicURL", default)]
    pub public_url: Option<String>,
    #[serde(rename = "internalURL", default)]
    pub internal_url: Option<String>,
    #[serde(rename = "adminURL", default)]
    pub admin_url: Option<String>,
}

impl CatalogEndpoint {
    #[must_use]
    pub fn url(&self, interface: EndpointInterface) -> Option<&str> {
        match interface {
            EndpointInterface::Public => self.public_url.as_deref(),
            EndpointInterface::Internal => self.internal_url.as_deref(),
            EndpointInterface::Admin => self.admin_url.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogService {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("service `{0}` not found in the service catalog")]
    ServiceNotFound(String),
    #[error("service `{service}` has no endpoint in region `{region}`")]
    RegionNotFound { service: String, region: String },
    #[error("service `{service}` has no endpoints")]
    NoEndpoints { service: String },
    #[error("service `{service}` endpoint has no {interface} URL")]
    InterfaceMissing {
        service: String,
        interface: &'static str,
    },
}

/// Response of a successful token request.
#[derive(Debug, Clone, Deserialize)]
pub struct Access {
    pub token: Token,
    #[serde(rename = "serviceCatalog", default)]
    pub service_catalog: Vec<CatalogService>,
    #[serde(default)]
    pub user: Option<AccessUser>,
}

impl Envelope for Access {
    const ROOT: &'static str = "access";
}

impl Access {
    /// Look a service up by catalog name, falling back to service type.
    #[must_use]
    pub fn service(&self, name_or_type: &str) -> Option<&CatalogService> {
        self.service_catalog
            .iter()
            .find(|service| service.name == name_or_type)
            .or_else(|| {
                self.service_catalog
                    .iter()
                    .find(|service| service.service_type == name_or_type)
            })
    }

    /// Resolve an endpoint URL.
    ///
    /// With a region, only endpoints carrying exactly that region match.
    /// Without one, the first endpoint of the service is used.
    pub fn endpoint(
        &self,
        service: &str,
        region: Option<&str>,
        interface: EndpointInterface,
    ) -> Result<&str, CatalogError> {
        let entry = self
            .service(service)
            .ok_or_else(|| CatalogError::ServiceNotFound(service.to_string()))?;

        let endpoint = match region {
            Some(region) => entry
                .endpoints
                .iter()
                .find(|endpoint| endpoint.region.as_deref() == Some(region))
                .ok_or_else(|| CatalogError::RegionNotFound {
                    service: service.to_string(),
                    region: region.to_string(),
                })?,
            None => entry
                .endpoints
                .first()
                .ok_or_else(|| CatalogError::NoEndpoints {
                    service: service.to_string(),
                })?,
        };

        endpoint
            .url(interface)
            .ok_or_else(|| CatalogError::InterfaceMissing {
                service: service.to_string(),
                interface: interface.as_str(),
            })
    }

    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.token.tenant.as_ref().map(|tenant| tenant.id.as_str())
    }
}

/// Result of a Swift TempAuth (`/auth/v1.0`) exchange.
#[derive(Debug, Clone)]
pub struct TempAuth {
    pub token: Secret,
    pub storage_url: String,
}
