//! IBM Quantum account as a [`Provider`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use qrun_hal::{
    Backend, BackendDescriptor, HalError, HalResult, Provider, ProviderConfig, ProviderRegistry,
};

use crate::backend::{IbmBackend, descriptor_from};
use crate::client::{Credentials, DEFAULT_ENDPOINT, IbmClient};
use crate::error::{IbmError, IbmResult};

/// Name under which [`register`] installs the provider.
pub const PROVIDER_NAME: &str = "ibm";

/// IBM Quantum provider.
///
/// Credentials are resolved at construction; the session itself is opened
/// by the first `load_account` (or any call that needs it) and reused.
pub struct IbmProvider {
    credentials: IbmResult<Credentials>,
    endpoint: String,
    client: OnceCell<Arc<IbmClient>>,
}

impl IbmProvider {
    /// Create a provider with explicit credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_credentials(Ok(credentials))
    }

    /// Create a provider from `IBM_API_KEY` + `IBM_SERVICE_CRN` or `IBM_QUANTUM_TOKEN`.
    ///
    /// Missing credentials are reported by `load_account`, not here.
    pub fn from_env() -> Self {
        Self::with_credentials(Credentials::from_env())
    }

    /// Build from registry configuration.
    ///
    /// `token` selects bearer mode; extras `api_key` + `service_crn` select the
    /// IAM flow. Without either, the environment is used.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let credentials = if let Some(token) = &config.token {
            Ok(Credentials::Token {
                token: token.clone(),
                service_crn: config.extra_str("service_crn").map(String::from),
            })
        } else if let Some(api_key) = config.extra_str("api_key") {
            config
                .extra_str("service_crn")
                .map(|crn| Credentials::ApiKey {
                    api_key: api_key.to_string(),
                    service_crn: crn.to_string(),
                })
                .ok_or(IbmError::MissingServiceCrn)
        } else {
            Credentials::from_env()
        };

        let provider = Self::with_credentials(credentials);
        match &config.endpoint {
            Some(endpoint) => provider.with_endpoint(endpoint),
            None => provider,
        }
    }

    fn with_credentials(credentials: IbmResult<Credentials>) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: OnceCell::new(),
        }
    }

    /// Override the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// API endpoint in use.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn client(&self) -> HalResult<Arc<IbmClient>> {
        let credentials = self
            .credentials
            .as_ref()
            .map_err(|e| HalError::AuthenticationFailed(e.to_string()))?;

        let client = self
            .client
            .get_or_try_init(|| async {
                info!("Connecting to IBM Quantum at {}", self.endpoint);
                IbmClient::connect(&self.endpoint, credentials)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(client))
    }
}

#[async_trait]
impl Provider for IbmProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn load_account(&self) -> HalResult<()> {
        self.client().await.map(|_| ())
    }

    async fn list_backends(&self) -> HalResult<Vec<BackendDescriptor>> {
        let client = self.client().await?;
        let backends = client.list_backends().await?;
        debug!("IBM account sees {} backends", backends.len());
        Ok(backends.iter().map(descriptor_from).collect())
    }

    async fn backend(&self, name: &str) -> HalResult<Box<dyn Backend>> {
        let client = self.client().await?;
        let info = client.get_backend(name).await?;
        debug!("Creating IBM backend: {}", info.name);
        Ok(Box::new(IbmBackend::new(client, &info)))
    }
}

/// Install the IBM provider as `"ibm"`.
pub fn register(registry: &mut ProviderRegistry) {
    registry.register(PROVIDER_NAME, |config| {
        Ok(Box::new(IbmProvider::from_config(config)))
    });
}
