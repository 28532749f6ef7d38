use cloudcafe_clients::retry::RetryConfig;
use cloudcafe_clients::{IdentityClient, RestClient, http_client};
use cloudcafe_config::{
    AuthStrategy, CafeConfig, EndpointConfig, HttpConfig, UserAuthConfig, UserConfig,
};
use cloudcafe_types::Secret;
use cloudcafe_types::identity::{Access, AuthRequest, TempAuth};
use tokio::sync::OnceCell;

use crate::CompositeError;

/// Outcome of the identity exchange.
#[derive(Debug, Clone)]
pub enum AuthSession {
    /// Keystone-style token plus service catalog.
    Catalog(Access),
    /// TempAuth token plus the storage URL it was issued for.
    TempAuth(TempAuth),
}

impl AuthSession {
    #[must_use]
    pub fn token(&self) -> &Secret {
        match self {
            Self::Catalog(access) => &access.token.id,
            Self::TempAuth(tempauth) => &tempauth.token,
        }
    }

    #[must_use]
    pub fn access(&self) -> Option<&Access> {
        match self {
            Self::Catalog(access) => Some(access),
            Self::TempAuth(_) => None,
        }
    }
}

/// Authenticates once per run and hands out tokens and service URLs.
#[derive(Debug)]
pub struct AuthComposite {
    auth_config: UserAuthConfig,
    user: UserConfig,
    http: reqwest::Client,
    retry: RetryConfig,
    session: OnceCell<AuthSession>,
}

impl AuthComposite {
    #[must_use]
    pub fn new(
        auth_config: UserAuthConfig,
        user: UserConfig,
        http: reqwest::Client,
        retry: RetryConfig,
    ) -> Self {
        Self {
            auth_config,
            user,
            http,
            retry,
            session: OnceCell::new(),
        }
    }

    /// Build from the `[user_auth_config]`, `[user]` and `[http]` sections.
    pub fn from_config(config: &CafeConfig) -> Result<Self, CompositeError> {
        let http_config: HttpConfig = config.get()?;
        let http = http_client(&http_config)?;
        Ok(Self::new(
            config.user_auth()?,
            config.get()?,
            http,
            RetryConfig::from_http(&http_config),
        ))
    }

    #[must_use]
    pub fn auth_config(&self) -> &UserAuthConfig {
        &self.auth_config
    }

    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The identity exchange result, authenticating on first call.
    pub async fn session(&self) -> Result<&AuthSession, CompositeError> {
        self.session.get_or_try_init(|| self.authenticate()).await
    }

    /// Keystone access. Fails for strategies without a service catalog.
    pub async fn access(&self) -> Result<&Access, CompositeError> {
        self.session()
            .await?
            .access()
            .ok_or(CompositeError::NoCatalog {
                strategy: self.auth_config.strategy.as_str(),
            })
    }

    pub async fn token(&self) -> Result<Secret, CompositeError> {
        Ok(self.session().await?.token().clone())
    }

    /// Base URL for a service: the override when configured, otherwise the
    /// catalog entry or, for TempAuth, the storage URL.
    pub async fn service_url(&self, endpoint: &EndpointConfig) -> Result<String, CompositeError> {
        if let Some(url) = endpoint.endpoint_override.as_deref()
            && !url.trim().is_empty()
        {
            return Ok(url.to_string());
        }
        match self.session().await? {
            AuthSession::Catalog(access) => Ok(access
                .endpoint(
                    &endpoint.service_name,
                    endpoint.region.as_deref(),
                    endpoint.interface,
                )?
                .to_string()),
            AuthSession::TempAuth(tempauth) => Ok(tempauth.storage_url.clone()),
        }
    }

    /// An authenticated client for `endpoint` sharing this composite's HTTP
    /// pool, formats and retry policy.
    pub async fn rest_client(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<RestClient, CompositeError> {
        let url = self.service_url(endpoint).await?;
        let token = self.token().await?;
        Ok(RestClient::new(self.http.clone(), &url)?
            .with_token(token)
            .with_formats(
                self.auth_config.serialize_format,
                self.auth_config.deserialize_format,
            )
            .with_retry(self.retry.clone()))
    }

    fn identity_client(&self) -> Result<IdentityClient, CompositeError> {
        let rest = RestClient::new(self.http.clone(), &self.auth_config.endpoint)?
            .with_formats(
                self.auth_config.serialize_format,
                self.auth_config.deserialize_format,
            )
            .with_retry(self.retry.clone());
        Ok(IdentityClient::new(rest))
    }

    fn username(&self, strategy: AuthStrategy) -> Result<&str, CompositeError> {
        self.user
            .username
            .as_deref()
            .ok_or(CompositeError::MissingCredential {
                strategy: strategy.as_str(),
                key: "username",
            })
    }

    async fn authenticate(&self) -> Result<AuthSession, CompositeError> {
        let strategy = self.auth_config.strategy;
        let client = self.identity_client()?;
        let username = self.username(strategy)?;
        tracing::info!(
            strategy = strategy.as_str(),
            endpoint = %self.auth_config.endpoint,
            username,
            "Authenticating"
        );

        let session = match strategy {
            AuthStrategy::Keystone => {
                let password = self.user.password.clone().ok_or(
                    CompositeError::MissingCredential {
                        strategy: strategy.as_str(),
                        key: "password",
                    },
                )?;
                let request = AuthRequest::password(username, password)
                    .with_tenant_id(self.user.tenant_id.clone())
                    .with_tenant_name(self.user.tenant_name.clone());
                AuthSession::Catalog(client.authenticate(&request).await?.into_entity())
            }
            AuthStrategy::RaxAuth => {
                let api_key = self.user.api_key.clone().ok_or(
                    CompositeError::MissingCredential {
                        strategy: strategy.as_str(),
                        key: "api_key",
                    },
                )?;
                let request = AuthRequest::api_key(username, api_key)
                    .with_tenant_id(self.user.tenant_id.clone())
                    .with_tenant_name(self.user.tenant_name.clone());
                AuthSession::Catalog(client.authenticate(&request).await?.into_entity())
            }
            AuthStrategy::SaioTempauth => {
                let key = self
                    .user
                    .api_key
                    .as_ref()
                    .or(self.user.password.as_ref())
                    .ok_or(CompositeError::MissingCredential {
                        strategy: strategy.as_str(),
                        key: "api_key",
                    })?;
                AuthSession::TempAuth(client.tempauth(username, key).await?.into_entity())
            }
        };

        if let Some(access) = session.access() {
            tracing::info!(
                services = access.service_catalog.len(),
                tenant = access.tenant_id().unwrap_or_default(),
                "Authenticated"
            );
        } else {
            tracing::info!("Authenticated");
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudcafe_types::identity::EndpointInterface;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(server: &MockServer, strategy: AuthStrategy, user: UserConfig) -> AuthComposite {
        let auth_config = UserAuthConfig {
            endpoint: server.uri(),
            strategy,
            serialize_format: cloudcafe_types::Format::Json,
            deserialize_format: cloudcafe_types::Format::Json,
        };
        AuthComposite::new(auth_config, user, reqwest::Client::new(), RetryConfig::none())
    }

    fn user() -> UserConfig {
        UserConfig {
            username: Some("demo".to_string()),
            password: Some(Secret::new("secret")),
            api_key: Some(Secret::new("key")),
            tenant_name: Some("demo".to_string()),
            ..UserConfig::default()
        }
    }

    fn access_body(uri: &str) -> serde_json::Value {
        json!({"access": {
            "token": {"id": "tok-1", "tenant": {"id": "t-1", "name": "demo"}},
            "serviceCatalog": [{
                "name": "nova", "type": "compute",
                "endpoints": [
                    {"region": "RegionOne", "publicURL": format!("{uri}/one/v2/t-1")},
                    {"region": "RegionTwo", "publicURL": format!("{uri}/two/v2/t-1")}
                ]
            }]
        }})
    }

    fn nova(region: Option<&str>) -> EndpointConfig {
        EndpointConfig {
            service_name: "nova".to_string(),
            region: region.map(str::to_string),
            interface: EndpointInterface::Public,
            endpoint_override: None,
        }
    }

    #[tokio::test]
    async fn keystone_authenticates_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2.0/tokens"))
            .and(body_partial_json(json!({"auth": {
                "passwordCredentials": {"username": "demo", "password": "secret"},
                "tenantName": "demo"
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(access_body(&server.uri())))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth(&server, AuthStrategy::Keystone, user());
        assert_eq!(auth.token().await.unwrap().expose_secret(), "tok-1");
        let url = auth.service_url(&nova(Some("RegionTwo"))).await.unwrap();
        assert_eq!(url, format!("{}/two/v2/t-1", server.uri()));
        assert_eq!(auth.access().await.unwrap().tenant_id(), Some("t-1"));
    }

    #[tokio::test]
    async fn rax_auth_sends_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2.0/tokens"))
            .and(body_partial_json(json!({"auth": {
                "RAX-KSKEY:apiKeyCredentials": {"username": "demo", "apiKey": "key"}
            }})))
            .respond_with(ResponseTemplate::new(200).set_body_json(access_body(&server.uri())))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth(&server, AuthStrategy::RaxAuth, user());
        let url = auth.service_url(&nova(None)).await.unwrap();
        assert_eq!(url, format!("{}/one/v2/t-1", server.uri()));
    }

    #[tokio::test]
    async fn tempauth_uses_storage_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1.0"))
            .and(header("X-Auth-User", "demo"))
            .and(header("X-Auth-Key", "key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Auth-Token", "AUTH_tk1")
                    .insert_header("X-Storage-Url", "http://saio:8080/v1/AUTH_demo"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth(&server, AuthStrategy::SaioTempauth, user());
        let endpoint = EndpointConfig {
            service_name: "swift".to_string(),
            ..EndpointConfig::default()
        };
        assert_eq!(
            auth.service_url(&endpoint).await.unwrap(),
            "http://saio:8080/v1/AUTH_demo"
        );
        assert_eq!(auth.token().await.unwrap().expose_secret(), "AUTH_tk1");
        assert!(matches!(
            auth.access().await,
            Err(CompositeError::NoCatalog { .. })
        ));
    }

    #[tokio::test]
    async fn override_skips_authentication() {
        let server = MockServer::start().await;
        let auth = auth(&server, AuthStrategy::Keystone, user());
        let endpoint = EndpointConfig {
            endpoint_override: Some("http://direct:9292".to_string()),
            ..nova(None)
        };
        assert_eq!(
            auth.service_url(&endpoint).await.unwrap(),
            "http://direct:9292"
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_password_is_reported() {
        let server = MockServer::start().await;
        let user = UserConfig {
            username: Some("demo".to_string()),
            ..UserConfig::default()
        };
        let err = auth(&server, AuthStrategy::Keystone, user)
            .token()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompositeError::MissingCredential {
                key: "password",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_service_is_a_catalog_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2.0/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(access_body(&server.uri())))
            .mount(&server)
            .await;

        let auth = auth(&server, AuthStrategy::Keystone, user());
        let endpoint = EndpointConfig {
            service_name: "glance".to_string(),
            ..EndpointConfig::default()
        };
        assert!(matches!(
            auth.service_url(&endpoint).await,
            Err(CompositeError::Catalog(_))
        ));
    }
}
