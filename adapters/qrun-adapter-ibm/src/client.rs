//! IBM Quantum Platform REST client.
//!
//! Covers the calls a run needs:
//! - authentication, either by IAM key exchange or with a bearer token
//! - listing backends with their configuration and queue status
//! - submitting Sampler V2 jobs, polling them, fetching results, cancelling

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{IbmError, IbmResult};

/// IBM Quantum Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// IBM Cloud IAM token endpoint.
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Value of the `IBM-API-Version` header.
const IBM_API_VERSION: &str = "2026-02-01";

/// Sent on every request; the default reqwest agent is blocked upstream.
const USER_AGENT: &str = concat!("qrun/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the account authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// IBM Cloud API key, exchanged for a bearer token through IAM.
    ApiKey { api_key: String, service_crn: String },
    /// Bearer token used as is, with an optional service instance.
    Token {
        token: String,
        service_crn: Option<String>,
    },
}

impl Credentials {
    /// Read `IBM_API_KEY` + `IBM_SERVICE_CRN`, falling back to `IBM_QUANTUM_TOKEN`.
    pub fn from_env() -> IbmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> IbmResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = get("IBM_API_KEY") {
            let service_crn = get("IBM_SERVICE_CRN").ok_or(IbmError::MissingServiceCrn)?;
            return Ok(Credentials::ApiKey {
                api_key,
                service_crn,
            });
        }
        if let Some(token) = get("IBM_QUANTUM_TOKEN") {
            return Ok(Credentials::Token {
                token,
                service_crn: get("IBM_SERVICE_CRN"),
            });
        }
        Err(IbmError::MissingCredentials)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey { service_crn, .. } => f
                .debug_struct("ApiKey")
                .field("api_key", &"[REDACTED]")
                .field("service_crn", service_crn)
                .finish(),
            Credentials::Token { service_crn, .. } => f
                .debug_struct("Token")
                .field("token", &"[REDACTED]")
                .field("service_crn", service_crn)
                .finish(),
        }
    }
}

/// Authenticated IBM Quantum API client.
pub struct IbmClient {
    http: Client,
    endpoint: String,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// IAM token response from `iam.cloud.ibm.com`.
#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
}

impl IbmClient {
    /// Authenticate and build a client for `endpoint`.
    ///
    /// API keys go through the IAM exchange first; bearer tokens are used
    /// directly and are only checked by the first API call.
    pub async fn connect(endpoint: &str, credentials: &Credentials) -> IbmResult<Self> {
        match credentials {
            Credentials::ApiKey {
                api_key,
                service_crn,
            } => {
                debug!("exchanging IBM Cloud API key for an IAM token");
                let token = exchange_api_key(api_key).await?;
                Self::with_bearer(endpoint, &token, Some(service_crn))
            }
            Credentials::Token { token, service_crn } => {
                Self::with_bearer(endpoint, token, service_crn.as_deref())
            }
        }
    }

    /// Build a client that sends `token` on every request.
    pub fn with_bearer(endpoint: &str, token: &str, service_crn: Option<&str>) -> IbmResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| IbmError::InvalidToken)?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );
        if let Some(crn) = service_crn {
            headers.insert(
                header::HeaderName::from_static("service-crn"),
                header::HeaderValue::from_str(crn).map_err(|_| IbmError::MissingServiceCrn)?,
            );
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// API endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// List every backend visible to the account.
    ///
    /// The device list only carries names, so configuration and status are
    /// fetched per device. Devices whose details cannot be read are skipped.
    pub async fn list_backends(&self) -> IbmResult<Vec<BackendInfo>> {
        let url = format!("{}/v1/backends", self.endpoint);
        let response = check(self.http.get(&url).send().await?).await?;
        let devices: DevicesResponse = response.json().await?;

        let mut backends = Vec::with_capacity(devices.devices.len());
        for device in &devices.devices {
            match self.get_backend(&device.name).await {
                Ok(info) => backends.push(info),
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => warn!("skipping backend {}: {}", device.name, e),
            }
        }
        Ok(backends)
    }

    /// Configuration and status of one backend.
    pub async fn get_backend(&self, name: &str) -> IbmResult<BackendInfo> {
        let config_url = format!("{}/v1/backends/{}/configuration", self.endpoint, name);
        let response = self.http.get(&config_url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::BackendNotFound(name.to_string()));
        }
        let config: BackendConfigResponse = check(response).await?.json().await?;

        let status_url = format!("{}/v1/backends/{}/status", self.endpoint, name);
        let response = self.http.get(&status_url).send().await?;
        let status = check(response).await?.json::<BackendStatusResponse>().await?;

        Ok(BackendInfo::from_parts(config, status))
    }

    /// Submit one circuit to the Sampler V2 primitive.
    pub async fn submit_sampler_job(
        &self,
        backend: &str,
        qasm: &str,
        shots: u32,
    ) -> IbmResult<SubmitResponse> {
        let url = format!("{}/v1/jobs", self.endpoint);
        let body = sampler_request(backend, qasm, shots);
        let response = self.http.post(&url).json(&body).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// Current status of a job.
    pub async fn job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{}", self.endpoint, job_id);
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::JobNotFound(job_id.to_string()));
        }
        Ok(check(response).await?.json().await?)
    }

    /// Results of a completed job.
    pub async fn job_results(&self, job_id: &str) -> IbmResult<JobResultResponse> {
        let url = format!("{}/v1/jobs/{}/results", self.endpoint, job_id);
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IbmError::JobNotFound(job_id.to_string()));
        }
        Ok(check(response).await?.json().await?)
    }

    /// Ask the service to cancel a job.
    pub async fn cancel_job(&self, job_id: &str) -> IbmResult<()> {
        let url = format!("{}/v1/jobs/{}/cancel", self.endpoint, job_id);
        check(self.http.post(&url).send().await?).await?;
        Ok(())
    }
}

async fn exchange_api_key(api_key: &str) -> IbmResult<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;

    let response = client
        .post(IAM_TOKEN_URL)
        .form(&[
            ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
            ("apikey", api_key),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "no body".to_string());
        return Err(IbmError::IamTokenExchange(format!(
            "IAM returned {status}: {body}"
        )));
    }

    let token: IamTokenResponse = response
        .json()
        .await
        .map_err(|e| IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}")))?;
    Ok(token.access_token)
}

/// Turn a non-success response into [`IbmError::Api`].
async fn check(response: Response) -> IbmResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .and_then(|e| e.message())
        .unwrap_or(body);
    Err(IbmError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Sampler V2 request body: one PUB of `(circuit, parameters, shots)`.
fn sampler_request(backend: &str, qasm: &str, shots: u32) -> serde_json::Value {
    serde_json::json!({
        "program_id": "sampler",
        "backend": backend,
        "params": {
            "version": 2,
            "pubs": [[qasm, {}, shots]],
            "options": { "optimization_level": 1 }
        }
    })
}

// ============================================================================
// Response types
// ============================================================================

/// Error body; the service uses either `message` or a list of `errors`.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    message: String,
}

impl ApiErrorResponse {
    fn message(self) -> Option<String> {
        self.message
            .or_else(|| self.errors.into_iter().next().map(|e| e.message))
    }
}

/// `{"devices": [...]}` from `/v1/backends`.
#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
}

/// `/v1/backends/{name}/configuration`.
#[derive(Debug, Deserialize)]
struct BackendConfigResponse {
    backend_name: String,
    n_qubits: u32,
    #[serde(default)]
    basis_gates: Vec<String>,
    #[serde(default)]
    coupling_map: Vec<[u32; 2]>,
    #[serde(default)]
    simulator: Option<bool>,
    #[serde(default)]
    max_shots: Option<u32>,
}

/// `/v1/backends/{name}/status`.
#[derive(Debug, Deserialize)]
struct BackendStatusResponse {
    state: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    length_queue: u64,
}

/// A backend's configuration and queue status, merged.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendInfo {
    pub name: String,
    pub num_qubits: u32,
    pub basis_gates: Vec<String>,
    /// Directed `[control, target]` pairs; empty when the device reports none.
    pub coupling_map: Vec<[u32; 2]>,
    pub simulator: bool,
    pub max_shots: Option<u32>,
    pub operational: bool,
    pub pending_jobs: u32,
    pub status_msg: String,
}

impl BackendInfo {
    fn from_parts(config: BackendConfigResponse, status: BackendStatusResponse) -> Self {
        let status_msg = if status.message.is_empty() {
            status.status
        } else {
            format!("{}: {}", status.status, status.message)
        };
        Self {
            name: config.backend_name,
            num_qubits: config.n_qubits,
            basis_gates: config.basis_gates,
            coupling_map: config.coupling_map,
            simulator: config.simulator.unwrap_or(false),
            max_shots: config.max_shots,
            operational: status.state,
            pending_jobs: u32::try_from(status.length_queue).unwrap_or(u32::MAX),
            status_msg,
        }
    }
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub id: String,
    /// Status string, mixed case on the Cloud API ("Completed").
    pub status: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub ended: Option<String>,
    #[serde(default)]
    pub state: Option<JobState>,
}

/// Job state detail with the failure reason.
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    #[serde(default)]
    pub reason: Option<String>,
}

impl JobStatusResponse {
    /// Failure reason reported by the service, if any.
    pub fn reason(&self) -> Option<&str> {
        self.state.as_ref().and_then(|s| s.reason.as_deref())
    }

    /// Wall-clock milliseconds between creation and end.
    pub fn duration_ms(&self) -> Option<u64> {
        let created = chrono::DateTime::parse_from_rfc3339(self.created.as_deref()?).ok()?;
        let ended = chrono::DateTime::parse_from_rfc3339(self.ended.as_deref()?).ok()?;
        u64::try_from((ended - created).num_milliseconds()).ok()
    }
}

/// Job result response.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    pub results: Vec<SamplerResult>,
}

/// Sampler V2 result for one PUB.
#[derive(Debug, Deserialize)]
pub struct SamplerResult {
    /// Classical register name to per-shot samples.
    #[serde(default)]
    pub data: HashMap<String, ClassicalRegisterData>,
}

/// Per-shot samples of one classical register as hex strings (`"0x3"`).
#[derive(Debug, Deserialize)]
pub struct ClassicalRegisterData {
    pub samples: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_credentials_prefer_api_key() {
        let creds = Credentials::from_lookup(lookup(&[
            ("IBM_API_KEY", "key"),
            ("IBM_SERVICE_CRN", "crn:v1:test"),
            ("IBM_QUANTUM_TOKEN", "token"),
        ]))
        .unwrap();
        assert_eq!(
            creds,
            Credentials::ApiKey {
                api_key: "key".into(),
                service_crn: "crn:v1:test".into()
            }
        );
    }

    #[test]
    fn test_credentials_token_fallback() {
        let creds = Credentials::from_lookup(lookup(&[("IBM_QUANTUM_TOKEN", "token")])).unwrap();
        assert_eq!(
            creds,
            Credentials::Token {
                token: "token".into(),
                service_crn: None
            }
        );
    }

    #[test]
    fn test_credentials_missing() {
        let err = Credentials::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, IbmError::MissingCredentials));

        let err = Credentials::from_lookup(lookup(&[("IBM_QUANTUM_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, IbmError::MissingCredentials));

        let err = Credentials::from_lookup(lookup(&[("IBM_API_KEY", "key")])).unwrap_err();
        assert!(matches!(err, IbmError::MissingServiceCrn));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::Token {
            token: "secret-token".into(),
            service_crn: None,
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_bearer_client() {
        let client = IbmClient::with_bearer("https://example.com/api/", "token", None).unwrap();
        assert_eq!(client.endpoint(), "https://example.com/api");
        assert!(format!("{client:?}").contains("[REDACTED]"));

        let err = IbmClient::with_bearer("https://example.com", "bad\ntoken", None).unwrap_err();
        assert!(matches!(err, IbmError::InvalidToken));
    }

    #[test]
    fn test_sampler_request_shape() {
        let body = sampler_request("ibm_kyiv", "OPENQASM 3.0;", 1024);
        assert_eq!(body["program_id"], "sampler");
        assert_eq!(body["backend"], "ibm_kyiv");
        assert_eq!(body["params"]["version"], 2);
        assert_eq!(body["params"]["pubs"][0][0], "OPENQASM 3.0;");
        assert_eq!(body["params"]["pubs"][0][2], 1024);
    }

    #[test]
    fn test_devices_response_deserialization() {
        let json = r#"{"devices": [
            {"name": "ibm_fez", "status": {"name": "online"}},
            {"name": "ibm_torino", "status": {"name": "online"}}
        ]}"#;
        let resp: DevicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.devices.len(), 2);
        assert_eq!(resp.devices[1].name, "ibm_torino");
    }

    #[test]
    fn test_backend_info_from_parts() {
        let config: BackendConfigResponse = serde_json::from_str(
            r#"{
                "backend_name": "ibm_torino",
                "n_qubits": 133,
                "basis_gates": ["cz", "id", "rz", "sx", "x"],
                "coupling_map": [[0, 1], [1, 0]],
                "max_shots": 100000
            }"#,
        )
        .unwrap();
        let status: BackendStatusResponse = serde_json::from_str(
            r#"{"state": true, "status": "active", "message": "", "length_queue": 17}"#,
        )
        .unwrap();

        let info = BackendInfo::from_parts(config, status);
        assert_eq!(info.name, "ibm_torino");
        assert_eq!(info.num_qubits, 133);
        assert!(!info.simulator);
        assert!(info.operational);
        assert_eq!(info.pending_jobs, 17);
        assert_eq!(info.status_msg, "active");
        assert_eq!(info.max_shots, Some(100_000));
        assert_eq!(info.coupling_map, vec![[0, 1], [1, 0]]);
    }

    #[test]
    fn test_job_status_reason_and_duration() {
        let status: JobStatusResponse = serde_json::from_str(
            r#"{
                "id": "job-1",
                "status": "Failed",
                "created": "2026-01-05T10:00:00Z",
                "ended": "2026-01-05T10:00:02.500Z",
                "state": {"status": "Failed", "reason": "circuit too deep", "reason_code": 1513}
            }"#,
        )
        .unwrap();
        assert_eq!(status.reason(), Some("circuit too deep"));
        assert_eq!(status.duration_ms(), Some(2500));
    }

    #[test]
    fn test_api_error_message() {
        let body: ApiErrorResponse =
            serde_json::from_str(r#"{"errors": [{"message": "Invalid token", "code": 1101}]}"#)
                .unwrap();
        assert_eq!(body.message().as_deref(), Some("Invalid token"));
    }
}
